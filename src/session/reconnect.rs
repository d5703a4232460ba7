//! Reconnection policy: bounded exponential backoff.

use std::time::Duration;

/// Default retry ceiling for one reconnect episode.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Backoff parameters applied after an unsolicited disconnect.
///
/// An episode waits `base_delay`, tries to reconnect, and doubles the
/// delay after each failed attempt until the ceiling is reached. With the
/// defaults that is three attempts after delays of 2, 4 and 8 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Maximum attempts per episode.
    pub max_attempts: u32,
    /// Delay before the first attempt.
    pub base_delay: Duration,
}

impl ReconnectPolicy {
    /// Creates a policy with the given ceiling and base delay.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Disables automatic reconnection entirely.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            max_attempts: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Returns the delay before the given zero-based attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}
