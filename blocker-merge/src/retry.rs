//! Retry with exponential backoff for outbound API calls.
//!
//! Every request to GitHub or JIRA goes through [`retry`]. The caller decides
//! per failure whether retrying can change the outcome ([`Failure::Transient`])
//! or not ([`Failure::Terminal`]).

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default number of attempts for each outbound call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Attempt count and backoff settings shared by all clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

impl RetryPolicy {
    /// Creates a policy. At least one attempt is always made.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the zero-based `attempt` failed: `base_delay * 2^attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// How a single failed attempt should be treated.
#[derive(Debug)]
pub enum Failure<E> {
    /// Retrying cannot change the outcome.
    Terminal(E),
    /// The call may succeed if repeated.
    Transient(E),
}

/// Final error of a retried call.
#[derive(Debug, Error)]
pub enum RetryError<E: Display> {
    /// An attempt failed in a way retrying cannot fix.
    #[error("{0}")]
    Terminal(E),

    /// Every attempt failed transiently.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error of the final attempt.
        last: E,
    },
}

impl<E: Display> RetryError<E> {
    /// Returns the underlying error of the last attempt.
    pub fn into_inner(self) -> E {
        match self {
            Self::Terminal(e) | Self::Exhausted { last: e, .. } => e,
        }
    }
}

/// Runs `call` until it succeeds, fails terminally or runs out of attempts.
///
/// Sleeps [`RetryPolicy::delay_for`] between attempts; there is no sleep after
/// the final attempt.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Failure<E>>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(Failure::Terminal(e)) => return Err(RetryError::Terminal(e)),
            Err(Failure::Transient(e)) => {
                warn!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "Call failed"
                );
                if attempt + 1 >= policy.max_attempts {
                    return Err(RetryError::Exhausted {
                        attempts: policy.max_attempts,
                        last: e,
                    });
                }
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
        }
    }
}
