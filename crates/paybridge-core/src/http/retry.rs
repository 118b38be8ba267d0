//! Retry logic with exponential backoff for provider requests
//!
//! Only transient transport failures (timeouts, refused or reset connections)
//! are retried. Any HTTP response that arrives, 5xx included, ends the loop and
//! goes to the classifier as is.

use std::future::Future;
use std::time::Duration;

use backoff::{backoff::Backoff, ExponentialBackoff};
use serde::{Deserialize, Serialize};

use crate::http::transport::TransportError;

/// Errors the retry loop knows how to judge
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

impl Retryable for TransportError {
    fn is_transient(&self) -> bool {
        TransportError::is_transient(self)
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included
    pub max_attempts: u32,
    /// Backoff time unit; the wait after attempt `n` is `2^(n+1)` units
    pub backoff_unit: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
    /// Whether to randomize delays to spread out synchronized clients
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom settings
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Set the backoff unit
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Set the maximum delay
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Attempts actually made; a policy of zero still makes one
    pub fn effective_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after failed attempt `attempt` (0-based), ignoring jitter
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt.saturating_add(1)).unwrap_or(u32::MAX);
        self.backoff_unit.saturating_mul(factor).min(self.max_delay)
    }

    /// Sum of all delays of a call that fails every attempt, ignoring jitter
    pub fn total_backoff(&self) -> Duration {
        (0..self.effective_attempts() - 1)
            .map(|attempt| self.delay_for(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Create an exponential backoff instance yielding 2, 4, 8, ... units
    pub fn create_backoff(&self) -> ExponentialBackoff {
        let initial = self.delay_for(0);
        ExponentialBackoff {
            current_interval: initial,
            initial_interval: initial,
            randomization_factor: if self.jitter { 0.5 } else { 0.0 },
            multiplier: 2.0,
            max_interval: self.max_delay,
            max_elapsed_time: None, // attempts are bounded by max_attempts instead
            ..Default::default()
        }
    }
}

/// Decision on whether to retry a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay
    Retry { delay: Duration },
    /// Do not retry the request
    NoRetry,
}

/// Per-call retry state
#[derive(Debug)]
pub struct RetryHandler {
    policy: RetryPolicy,
    attempt: u32,
    backoff: ExponentialBackoff,
}

impl RetryHandler {
    pub fn new(policy: RetryPolicy) -> Self {
        let backoff = policy.create_backoff();
        Self {
            policy,
            attempt: 0,
            backoff,
        }
    }

    /// Decide what to do after the current attempt failed with `error`
    pub fn should_retry<E: Retryable>(&mut self, error: &E) -> RetryDecision {
        if !error.is_transient() {
            return RetryDecision::NoRetry;
        }

        if self.attempt + 1 >= self.policy.effective_attempts() {
            return RetryDecision::NoRetry;
        }

        self.attempt += 1;
        let delay = self
            .backoff
            .next_backoff()
            .unwrap_or(self.policy.max_delay);

        RetryDecision::Retry { delay }
    }

    /// Zero-based index of the current attempt
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Number of attempts made so far, the current one included
    pub fn attempts(&self) -> u32 {
        self.attempt + 1
    }
}

/// Result of a retried operation together with the number of attempts made
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

/// Execute an operation with retry logic
///
/// `op` receives the zero-based attempt index. Backoff sleeps on the tokio
/// timer, so dropping the returned future cancels both an in-flight attempt
/// and a pending wait.
pub async fn run_with_retry<F, Fut, T, E>(mut op: F, policy: &RetryPolicy) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let mut handler = RetryHandler::new(policy.clone());

    loop {
        match op(handler.attempt()).await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: handler.attempts(),
                }
            }
            Err(error) => match handler.should_retry(&error) {
                RetryDecision::Retry { delay } => {
                    log::warn!(
                        "Request failed (attempt {}), retrying after {:?}: {}",
                        handler.attempt(),
                        delay,
                        error
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::NoRetry => {
                    if error.is_transient() {
                        log::error!(
                            "Request failed after {} attempts, giving up: {}",
                            handler.attempts(),
                            error
                        );
                    }
                    return RetryOutcome {
                        result: Err(error),
                        attempts: handler.attempts(),
                    };
                }
            },
        }
    }
}

/// Execute an operation with retry logic, discarding the attempt count
pub async fn execute_with_retry<F, Fut, T, E>(op: F, policy: &RetryPolicy) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    run_with_retry(op, policy).await.result
}
