//! Game tuning. All times are in milliseconds.

use smart_default::SmartDefault;

#[derive(Clone, Debug, SmartDefault)]
pub struct GameConfig {
    /// Seconds on the countdown at the start of a round.
    #[default = 20]
    pub round_secs: i32,
    /// How long `TIME` is shown once the countdown runs out.
    #[default = 1000]
    pub time_ms: u32,
    /// How long `OVER` is shown after `TIME`.
    #[default = 2000]
    pub over_ms: u32,

    /// Load cell readings averaged at power-up to find the unloaded output.
    #[default = 160]
    pub tare_samples: u32,
    /// Expected unloaded output. The hit threshold is the distance of the
    /// measured tare from this.
    #[default = 400_000]
    pub tare_reference: i32,
    /// Largest peak reading counted.
    #[default = 8_000_000]
    pub peak_cap: u32,
    /// A peak reading of this much scores 100.
    #[default = 799_999]
    pub score_divisor: u32,

    /// Interval between steps of the score count-up.
    #[default = 30]
    pub reveal_step_ms: u32,
    /// How long the final score stays up.
    #[default = 2000]
    pub reveal_hold_ms: u32,
    /// Interval between one-pixel marquee steps.
    #[default = 40]
    pub marquee_step_ms: u32,
    /// Minimum running time of the new-high-score marquee. It always finishes
    /// the pass it is on.
    #[default = 6000]
    pub marquee_ms: u32,
    /// How long the `HIGH SCORE` caption is shown.
    #[default = 2000]
    pub high_caption_ms: u32,
    /// How long the standing high score is shown.
    #[default = 3000]
    pub high_number_ms: u32,

    /// Interval between idle animation frames.
    #[default = 80]
    pub idle_frame_ms: u32,
    /// The coin sensor ignores further edges for this long after one.
    #[default = 1000]
    pub coin_holdoff_ms: u32,
    /// The start button must read released for this long before it re-arms.
    #[default = 50]
    pub button_release_ms: u32,
}
