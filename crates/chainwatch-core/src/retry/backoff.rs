//! Exponential backoff strategy.

use std::time::Duration;

use super::Strategy;

/// Exponential backoff with a bounded number of attempts.
///
/// The delay before retry `n` is
/// `min(initial_delay * multiplier^(n-1), max_delay)`.
#[derive(Debug, Clone)]
pub struct Backoff {
    /// Maximum number of retry attempts. 0 means no retries.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on the backoff delay.
    pub max_delay: Duration,
    /// Growth factor per retry. Values below 1.0 fall back to 2.0.
    pub multiplier: f64,
}

impl Backoff {
    /// A backoff with conventional defaults: 1s initial delay, 30s cap,
    /// doubling per attempt.
    pub fn exponential(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }

    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    #[must_use]
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }
}

impl Strategy for Backoff {
    fn next(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        let multiplier = if self.multiplier < 1.0 {
            2.0
        } else {
            self.multiplier
        };
        let delay = self.initial_delay.as_secs_f64() * multiplier.powi(attempt as i32 - 1);
        Some(Duration::from_secs_f64(delay).min(self.max_delay))
    }
}
