//! Bounded retry loop driven by typed attempt outcomes.
//!
//! Each attempt reports whether it succeeded, failed in a way worth
//! retrying, or failed for good. The loop only ever retries transient
//! failures and never exceeds the attempt budget.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Outcome of a single attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome<T> {
    /// The attempt produced a value
    Success(T),
    /// Timeout, connection error or other failure that may clear up
    Transient(String),
    /// Failure that will not change on retry (e.g. non-200, wrong content type)
    Terminal(String),
}

impl<T> AttemptOutcome<T> {
    /// Classify a request error; every transport-level error is transient
    pub fn from_reqwest_error(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timeout"
        } else if err.is_connect() {
            "connection error"
        } else {
            "request error"
        };
        AttemptOutcome::Transient(format!("{}: {}", kind, err))
    }
}

/// Final result of a retry loop
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptResult<T> {
    /// An attempt succeeded
    Success { value: T, attempts: u32 },
    /// An attempt failed terminally; no further attempts were made
    Terminal { cause: String, attempts: u32 },
    /// Every allowed attempt failed transiently
    Exhausted { cause: String, attempts: u32 },
}

impl<T> AttemptResult<T> {
    /// Number of attempts that were made
    pub fn attempts(&self) -> u32 {
        match self {
            AttemptResult::Success { attempts, .. }
            | AttemptResult::Terminal { attempts, .. }
            | AttemptResult::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// The successful value, if any
    pub fn ok(self) -> Option<T> {
        match self {
            AttemptResult::Success { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Retry policy
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` and no pause between attempts
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// Set the pause between attempts
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Run `operation` until it succeeds, fails terminally, or the budget is spent
///
/// The closure receives the 1-based attempt number.
pub async fn run_attempts<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> AttemptResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptOutcome<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            AttemptOutcome::Success(value) => {
                if attempt > 1 {
                    tracing::debug!(attempt, "Attempt succeeded after transient failure");
                }
                return AttemptResult::Success {
                    value,
                    attempts: attempt,
                };
            }
            AttemptOutcome::Terminal(cause) => {
                return AttemptResult::Terminal {
                    cause,
                    attempts: attempt,
                };
            }
            AttemptOutcome::Transient(cause) => {
                if attempt >= max_attempts {
                    return AttemptResult::Exhausted {
                        cause,
                        attempts: attempt,
                    };
                }

                tracing::debug!(
                    attempt,
                    max_attempts,
                    cause = %cause,
                    "Transient failure, retrying"
                );

                if !policy.delay.is_zero() {
                    sleep(policy.delay).await;
                }
            }
        }
    }
}
