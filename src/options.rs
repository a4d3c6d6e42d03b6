use std::time::Duration;

/// Configures per-attempt timeout, retry behavior and body logging.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds. Not cumulative across retries.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base retry delay in milliseconds (linear strategy: base × retry number).
    pub retry_base_delay_ms: u64,
    /// Log request and response bodies at debug level.
    pub log_bodies: bool,
}

impl ClientOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 3,
            retry_base_delay_ms: 1_000,
            log_bodies: false,
        }
    }
}
