//! The round: countdown, hit, score reveal and high score, and the idle
//! animation in between.
//!
//! Everything here is driven by `Game::poll` from the main loop, with the
//! current time and, while a round is running, a fresh load cell reading. No
//! call blocks.

use core::fmt::Write;

use font_dmd::{NUMERALS_16, SYSTEM_5X7};
use gfx::{Display, Mode};

use dmd::timebase::Every;

use crate::config::GameConfig;
use crate::idle::IdleAnimation;
use crate::score::{numeral_x, HitTracker};

const HIGH_SCORE_BANNER: &[u8] = b"HIGHEST SCORE!   ";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum State {
    Idle,
    /// Round running. `since` is when `remaining` was last decremented.
    Countdown { remaining: i32, since: u32 },
    /// `TIME` is up.
    TimeUp { since: u32 },
    /// `OVER` is up.
    Over { since: u32 },
    /// Counting the score up to `target`.
    Reveal {
        shown: u32,
        target: u32,
        step: u32,
        since: u32,
    },
    /// Final score on screen.
    Hold { score: u32, since: u32 },
    /// New high score banner.
    Banner { since: u32, last_step: u32 },
    /// `HIGH SCORE` caption before the standing high score.
    HighCaption { since: u32 },
    HighNumber { since: u32 },
}

pub struct Game {
    config: GameConfig,
    hits: HitTracker,
    high_score: u32,
    idle: IdleAnimation,
    idle_frames: Every,
    state: State,
}

impl Game {
    /// `threshold` is the reading magnitude that counts as a hit.
    pub fn new(config: GameConfig, threshold: u32) -> Self {
        Game {
            hits: HitTracker::new(threshold, &config),
            idle_frames: Every::new(config.idle_frame_ms),
            config,
            high_score: 0,
            idle: IdleAnimation::default(),
            state: State::Idle,
        }
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Whether a start button press should be handled now. Presses during the
    /// score and game-over screens wait until they finish.
    pub fn accepts_start(&self) -> bool {
        match self.state {
            State::Idle | State::Countdown { .. } => true,
            _ => false,
        }
    }

    /// Whether the next `poll` wants a load cell reading.
    pub fn wants_sample(&self) -> bool {
        match self.state {
            State::Countdown { .. } => true,
            _ => false,
        }
    }

    /// Starts a round, restarting the countdown if one is already running.
    pub fn start(&mut self, display: &mut Display, log: &mut impl Write, now: u32) {
        let remaining = self.config.round_secs;
        self.hits.reset();
        self.state = State::Countdown { remaining, since: now };
        display.select_font(NUMERALS_16);
        show_countdown(display, log, remaining);
    }

    /// Advances the game to `now`. `sample` is a raw load cell reading, taken
    /// if `wants_sample` said so.
    pub fn poll(
        &mut self,
        display: &mut Display,
        log: &mut impl Write,
        now: u32,
        sample: Option<i32>,
    ) {
        let cfg = &self.config;
        self.state = match self.state {
            State::Idle => {
                if self.idle_frames.poll(now) {
                    display.select_font(SYSTEM_5X7);
                    self.idle.frame(display);
                }
                State::Idle
            }

            State::Countdown { remaining, since } => {
                let hit = match sample {
                    Some(raw) => self.hits.feed(raw),
                    None => None,
                };
                if let Some(hit) = hit {
                    let _ = writeln!(log, "Score: {}", hit.score);
                    let _ = writeln!(log, "Raw Score: {}", hit.peak);
                    let _ = writeln!(log, "Hit Value: {}", self.hits.threshold());
                    let step = (hit.score / 40).max(1);
                    let shown = step.min(hit.score);
                    show_number(display, shown);
                    State::Reveal {
                        shown,
                        target: hit.score,
                        step,
                        since: now,
                    }
                } else if now.wrapping_sub(since) >= 1000 {
                    let remaining = remaining - 1;
                    if remaining < 0 {
                        let _ = writeln!(log, "Time up.");
                        display.clear(true);
                        display.select_font(SYSTEM_5X7);
                        display.draw_string(6, 4, b"TIME", Mode::Normal);
                        State::TimeUp { since: now }
                    } else {
                        show_countdown(display, log, remaining);
                        State::Countdown {
                            remaining,
                            since: since.wrapping_add(1000),
                        }
                    }
                } else {
                    State::Countdown { remaining, since }
                }
            }

            State::TimeUp { since } => {
                if now.wrapping_sub(since) >= cfg.time_ms {
                    display.clear(true);
                    display.draw_string(6, 4, b"OVER", Mode::Normal);
                    State::Over { since: now }
                } else {
                    State::TimeUp { since }
                }
            }

            State::Over { since } => {
                if now.wrapping_sub(since) >= cfg.over_ms {
                    self.hits.reset();
                    State::Idle
                } else {
                    State::Over { since }
                }
            }

            State::Reveal {
                shown,
                target,
                step,
                since,
            } => {
                if now.wrapping_sub(since) < cfg.reveal_step_ms {
                    State::Reveal {
                        shown,
                        target,
                        step,
                        since,
                    }
                } else if shown >= target {
                    State::Hold {
                        score: target,
                        since: now,
                    }
                } else {
                    let shown = (shown + step).min(target);
                    show_number(display, shown);
                    State::Reveal {
                        shown,
                        target,
                        step,
                        since: now,
                    }
                }
            }

            State::Hold { score, since } => {
                if now.wrapping_sub(since) < cfg.reveal_hold_ms {
                    State::Hold { score, since }
                } else if score > self.high_score {
                    self.high_score = score;
                    let _ = writeln!(log, ">> NEW HIGH SCORE! <<");
                    display.clear(true);
                    display.select_font(SYSTEM_5X7);
                    let right = display.grid().width_px() as i32;
                    display.draw_marquee(HIGH_SCORE_BANNER, right, 4);
                    State::Banner {
                        since: now,
                        last_step: now,
                    }
                } else {
                    display.clear(true);
                    display.select_font(SYSTEM_5X7);
                    display.draw_string(6, 0, b"HIGH", Mode::Normal);
                    display.draw_string(2, 8, b"SCORE", Mode::Normal);
                    State::HighCaption { since: now }
                }
            }

            State::Banner { since, last_step } => {
                if now.wrapping_sub(last_step) > cfg.marquee_step_ms {
                    let wrapped = display.step_marquee(-1, 0);
                    if wrapped && now.wrapping_sub(since) >= cfg.marquee_ms {
                        State::Idle
                    } else {
                        State::Banner {
                            since,
                            last_step: now,
                        }
                    }
                } else {
                    State::Banner { since, last_step }
                }
            }

            State::HighCaption { since } => {
                if now.wrapping_sub(since) >= cfg.high_caption_ms {
                    display.select_font(NUMERALS_16);
                    show_number(display, self.high_score);
                    State::HighNumber { since: now }
                } else {
                    State::HighCaption { since }
                }
            }

            State::HighNumber { since } => {
                if now.wrapping_sub(since) >= cfg.high_number_ms {
                    State::Idle
                } else {
                    State::HighNumber { since }
                }
            }
        };
    }
}

/// Replaces the screen with `n` in the selected font, centered for its digit
/// count.
fn show_number(display: &mut Display, n: u32) {
    let mut digits = [0u8; 10];
    let text = format_decimal(n, &mut digits);
    display.clear(true);
    display.draw_string(numeral_x(n as i32), 0, text, Mode::Normal);
}

fn show_countdown(display: &mut Display, log: &mut impl Write, remaining: i32) {
    let _ = writeln!(log, "Time: {}", remaining);
    let mut digits = [0u8; 10];
    let text = format_decimal(remaining as u32, &mut digits);
    display.clear(true);
    display.draw_string(if remaining >= 10 { 5 } else { 11 }, 0, text, Mode::Normal);
}

/// Writes the decimal digits of `n` into the end of `buf`, returning them.
fn format_decimal(mut n: u32, buf: &mut [u8; 10]) -> &[u8] {
    let mut start = buf.len();
    loop {
        start -= 1;
        buf[start] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    &buf[start..]
}
