use std::time::Duration;

/// Exponential backoff with a cap and a bounded attempt budget.
///
/// `delay(n) = min(base_delay × 2^n, cap_delay)` for `n < max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub cap_delay: Duration,
    pub max_attempts: u32,
}

impl BackoffPolicy {
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
    pub const DEFAULT_CAP_DELAY: Duration = Duration::from_secs(30);
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    pub fn new(base_delay: Duration, cap_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            cap_delay,
            max_attempts,
        }
    }

    /// Delay before retry number `attempt` (0-based), ignoring the budget.
    pub fn delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.cap_delay, |d| d.min(self.cap_delay))
    }

    /// Delay before retry number `attempt`, or `None` once the budget is
    /// spent.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then(|| self.delay(attempt))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_BASE_DELAY,
            Self::DEFAULT_CAP_DELAY,
            Self::DEFAULT_MAX_ATTEMPTS,
        )
    }
}
