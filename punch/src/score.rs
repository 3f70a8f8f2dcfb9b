//! Turning load cell readings into scores.

use crate::config::GameConfig;

/// Hit threshold from the power-up tare average: readings further from zero
/// than this count as a hit.
pub fn hit_threshold(tare_average: i32, reference: i32) -> u32 {
    (i64::from(tare_average) - i64::from(reference)).abs() as u32
}

/// Score for a peak reading, as a percentage of `divisor`. Strong hits exceed
/// 100; the result is capped at 999 so it always fits three digits.
pub fn percent(peak: u32, divisor: u32) -> u32 {
    (u64::from(peak) * 100 / u64::from(divisor.max(1))).min(999) as u32
}

/// Left edge for drawing `n` in the numeral font so that it sits centered on
/// a single panel.
pub fn numeral_x(n: i32) -> i32 {
    if n < 10 {
        11
    } else if n < 100 {
        5
    } else {
        1
    }
}

/// A completed hit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Hit {
    /// Largest reading seen during the hit, capped.
    pub peak: u32,
    pub score: u32,
}

/// Follows readings through a hit: it starts when a reading's magnitude
/// exceeds the threshold and ends at the first reading that doesn't.
#[derive(Clone, Debug)]
pub struct HitTracker {
    threshold: u32,
    cap: u32,
    divisor: u32,
    peak: Option<u32>,
}

impl HitTracker {
    pub fn new(threshold: u32, config: &GameConfig) -> Self {
        HitTracker {
            threshold,
            cap: config.peak_cap,
            divisor: config.score_divisor,
            peak: None,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Whether a hit is in progress.
    pub fn counting(&self) -> bool {
        self.peak.is_some()
    }

    /// Forgets any hit in progress.
    pub fn reset(&mut self) {
        self.peak = None;
    }

    /// Feeds one raw reading. Returns the hit when this reading ends one.
    pub fn feed(&mut self, raw: i32) -> Option<Hit> {
        let magnitude = (i64::from(raw)).abs() as u32;
        if magnitude > self.threshold {
            let peak = self.peak.get_or_insert(0);
            *peak = (*peak).max(magnitude).min(self.cap);
            None
        } else {
            self.peak.take().map(|peak| Hit {
                peak,
                score: percent(peak, self.divisor),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(threshold: u32) -> HitTracker {
        HitTracker::new(threshold, &GameConfig::default())
    }

    #[test]
    fn threshold_from_tare() {
        assert_eq!(hit_threshold(450_000, 400_000), 50_000);
        assert_eq!(hit_threshold(350_000, 400_000), 50_000);
        assert_eq!(hit_threshold(-8_388_608, 400_000), 8_788_608);
    }

    #[test]
    fn percentages() {
        assert_eq!(percent(0, 799_999), 0);
        assert_eq!(percent(799_999, 799_999), 100);
        assert_eq!(percent(400_000, 799_999), 50);
        // The cap reading would be 1000.
        assert_eq!(percent(8_000_000, 799_999), 999);
    }

    #[test]
    fn numeral_positions() {
        assert_eq!(numeral_x(0), 11);
        assert_eq!(numeral_x(9), 11);
        assert_eq!(numeral_x(10), 5);
        assert_eq!(numeral_x(99), 5);
        assert_eq!(numeral_x(100), 1);
    }

    #[test]
    fn hit_lifecycle() {
        let mut t = tracker(1000);
        assert_eq!(t.feed(500), None);
        assert!(!t.counting());

        assert_eq!(t.feed(-2000), None);
        assert!(t.counting());
        assert_eq!(t.feed(800_000), None);
        assert_eq!(t.feed(5000), None);

        assert_eq!(
            t.feed(-1000),
            Some(Hit {
                peak: 800_000,
                score: 100,
            })
        );
        assert!(!t.counting());
        assert_eq!(t.feed(0), None);
    }

    #[test]
    fn peak_is_capped() {
        let mut t = tracker(10);
        t.feed(8_388_607);
        assert_eq!(t.feed(0).map(|h| h.peak), Some(8_000_000));
    }
}
