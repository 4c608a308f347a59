//! Delay between two consecutive checks of the same target.

use std::time::Duration;

use rand::Rng;

/// Exponential growth of the delay while a target keeps failing at the
/// transport level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub multiplier: u32,
    pub max_interval: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self { multiplier: 2, max_interval: Duration::from_secs(300) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Minimum time between two checks of the same target
    pub interval: Duration,
    pub backoff: Option<Backoff>,
    /// Upper bound of a random extra delay added to every restart
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(5))
    }
}

impl RetryPolicy {
    /// Same delay after every check, whatever its outcome
    pub fn fixed(interval: Duration) -> Self {
        Self { interval, backoff: None, jitter: Duration::ZERO }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before the next check given how many checks in a row ended in
    /// `Status::Error`. Never shorter than `interval`.
    pub fn delay(&self, consecutive_errors: u32) -> Duration {
        let base = self.backoff_delay(consecutive_errors);

        if self.jitter.is_zero() {
            return base;
        }

        let extra = rand::thread_rng().gen_range(Duration::ZERO..=self.jitter);
        base.saturating_add(extra)
    }

    fn backoff_delay(&self, consecutive_errors: u32) -> Duration {
        let Some(backoff) = self.backoff else {
            return self.interval;
        };
        if consecutive_errors == 0 {
            return self.interval;
        }

        let factor = backoff.multiplier.max(1).saturating_pow(consecutive_errors);
        let grown = self.interval.saturating_mul(factor);

        grown.min(backoff.max_interval).max(self.interval)
    }
}
