//! Client configuration and protocol constants.

use std::time::Duration;

/// Protocol version tag sent with every request.
pub const API_VERSION: &str = "2021-06-01";

/// User-Agent string passed to the service as part of communication.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Poll interval used when the service does not provide one.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(2000);

/// Wall-clock budget for one whole submit+poll attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(4000);

/// Transient transport failures tolerated per registration attempt.
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

/// Tunables for one [`crate::machine::PollingStateMachine`] instance.
///
/// Passed in at construction; there is no process-wide mutable state.
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    /// Fallback poll interval when the service omits a hint or sends a
    /// non-positive one.
    pub polling_interval: Duration,
    /// Wall-clock budget for the entire submit+poll sequence.
    pub attempt_timeout: Duration,
    /// How many transient transport failures are retried before the attempt
    /// is surfaced as failed. Cumulative across submit and poll.
    pub retry_limit: u32,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            polling_interval: DEFAULT_POLLING_INTERVAL,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }
}
