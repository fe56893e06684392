//! Exponential backoff between readiness checks.
//!
//! Delays are tracked in fractional milliseconds: 500, 750, 1125, 1687.5,
//! 2531.25, 3796.875, then 5000 forever.

use std::time::Duration;

pub const INITIAL_DELAY_MS: f64 = 500.0;
pub const MULTIPLIER: f64 = 1.5;
pub const MAX_DELAY_MS: f64 = 5000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    next_ms: f64,
    multiplier: f64,
    max_ms: f64,
}

impl Backoff {
    pub fn new(initial: Duration, multiplier: f64, max: Duration) -> Self {
        let max_ms = to_ms(max);
        Self {
            next_ms: to_ms(initial).min(max_ms),
            multiplier,
            max_ms,
        }
    }

    /// Delay to sleep now; advances to the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next_ms;
        self.next_ms = (self.next_ms * self.multiplier).min(self.max_ms);
        from_ms(delay)
    }

    /// Start over from the initial delay.
    pub fn reset(&mut self, initial: Duration) {
        self.next_ms = to_ms(initial).min(self.max_ms);
    }
}

fn to_ms(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000_000.0
}

fn from_ms(ms: f64) -> Duration {
    Duration::from_nanos((ms * 1_000_000.0).round() as u64)
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            next_ms: INITIAL_DELAY_MS,
            multiplier: MULTIPLIER,
            max_ms: MAX_DELAY_MS,
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_delay())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sequence() {
        let delays: Vec<Duration> = Backoff::default().take(9).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_micros(500_000),
                Duration::from_micros(750_000),
                Duration::from_micros(1_125_000),
                Duration::from_micros(1_687_500),
                Duration::from_micros(2_531_250),
                Duration::from_micros(3_796_875),
                Duration::from_millis(5000),
                Duration::from_millis(5000),
                Duration::from_millis(5000),
            ]
        );
    }

    #[test]
    fn test_custom_backoff_caps() {
        let mut backoff = Backoff::new(Duration::from_millis(100), 2.0, Duration::from_millis(300));
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(300));
        assert_eq!(backoff.next_delay(), Duration::from_millis(300));

        backoff.reset(Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_initial_above_cap_is_clamped() {
        let mut backoff = Backoff::new(Duration::from_secs(10), 1.5, Duration::from_secs(5));
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }
}
