//! Timeout configuration for provider requests
//!
//! Timeouts apply to each attempt, not to the logical call. The worst case for a
//! whole call is `request_timeout × max_attempts + Σ backoff`, see
//! [`TimeoutConfig::call_bound`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeout configuration for HTTP requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout - time to establish a connection
    pub connect_timeout: Duration,
    /// Request timeout - total time for one attempt, body included
    pub request_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl TimeoutConfig {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }

    /// Per-attempt timeout in whole seconds; connect timeout is capped to it
    pub fn from_secs(timeout_secs: u64) -> Self {
        let request_timeout = Duration::from_secs(timeout_secs);
        Self {
            connect_timeout: Self::default().connect_timeout.min(request_timeout),
            request_timeout,
        }
    }

    /// Override the request timeout
    pub fn with_request_timeout(&self, timeout: Duration) -> Self {
        let mut config = self.clone();
        config.request_timeout = timeout;
        config.connect_timeout = config.connect_timeout.min(timeout);
        config
    }

    /// Validate timeout configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.connect_timeout.is_zero() {
            return Err("Connect timeout cannot be zero".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }

        if self.request_timeout < self.connect_timeout {
            return Err("Request timeout should be >= connect timeout".to_string());
        }

        Ok(())
    }

    /// Upper bound on the wall-clock time of one logical call
    pub fn call_bound(&self, max_attempts: u32, total_backoff: Duration) -> Duration {
        self.request_timeout
            .saturating_mul(max_attempts.max(1))
            .saturating_add(total_backoff)
    }
}
