//! Bounded retry with a fixed pacing delay.
//!
//! The delay is charged after every attempt, successful or not, so a caller
//! holding a concurrency permit keeps it for the whole pacing window.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Attempt budget and pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before giving up; values below 1 behave as 1
    pub max_attempts: u32,
    /// Sleep after each attempt
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    fn budget(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Why a retried operation produced no value.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last: Option<E> },
    /// An attempt failed with an error that must not be retried
    Aborted { attempt: u32, error: E },
}

impl<E> RetryError<E> {
    /// Attempts made before stopping.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Aborted { attempt, .. } => *attempt,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted {
                attempts,
                last: Some(e),
            } => write!(f, "gave up after {} attempts: {}", attempts, e),
            RetryError::Exhausted { attempts, last: None } => {
                write!(f, "gave up after {} attempts", attempts)
            }
            RetryError::Aborted { attempt, error } => {
                write!(f, "aborted on attempt {}: {}", attempt, error)
            }
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// budget is spent. `op` receives the 1-based attempt number.
///
/// Returns the value together with the number of attempts made.
pub async fn retry_with_policy<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    is_retryable: R,
    mut op: F,
) -> Result<(T, u32), RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: fmt::Display,
{
    let budget = policy.budget();
    let mut last = None;

    for attempt in 1..=budget {
        let result = op(attempt).await;

        if !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }

        match result {
            Ok(value) => return Ok((value, attempt)),
            Err(e) if is_retryable(&e) => {
                if attempt < budget {
                    warn!(
                        attempt = attempt,
                        max_attempts = budget,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                } else {
                    debug!(attempts = budget, error = %e, "Retry budget exhausted");
                }
                last = Some(e);
            }
            Err(e) => {
                return Err(RetryError::Aborted {
                    attempt,
                    error: e,
                })
            }
        }
    }

    Err(RetryError::Exhausted {
        attempts: budget,
        last,
    })
}
