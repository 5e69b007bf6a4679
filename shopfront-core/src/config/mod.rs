//! Runtime configuration for the client core.
//!
//! These are the validated values; file parsing lives in the binary.

pub use crate::utils::backoff::BackoffPolicy;

/// Number of recent notifications kept in memory by default.
pub const DEFAULT_RECENT_CAPACITY: usize = 50;

/// Settings for the live notification channel and its inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationConfig {
    /// Reconnect policy for the push stream.
    pub backoff: BackoffPolicy,
    /// Upper bound on the recent-notification list.
    pub recent_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            recent_capacity: DEFAULT_RECENT_CAPACITY,
        }
    }
}
