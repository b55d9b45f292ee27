//! Retry utilities with configurable backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Delay strategy between successive attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Every retry waits `base_delay`.
    Fixed,
    /// Retry `n` (0-based) waits `base_delay * (n + 1)`.
    Linear,
    /// Retry `n` waits `base_delay * multiplier^n`, capped at `max_delay`.
    Exponential { multiplier: f64, max_delay: Duration },
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub max_retries: u32,
    /// Delay unit the backoff strategy scales.
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            backoff: Backoff::Exponential {
                multiplier: 2.0,
                max_delay: Duration::from_secs(10),
            },
        }
    }
}

impl RetryPolicy {
    /// Linear backoff: `base, 2*base, 3*base, ...`.
    #[must_use]
    pub fn linear(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            backoff: Backoff::Linear,
        }
    }

    /// Fixed interval between attempts.
    #[must_use]
    pub fn fixed(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            backoff: Backoff::Fixed,
        }
    }

    /// Upper bound on the number of times the operation runs.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay slept before retry `retry` (0-based, so the second attempt is retry 0).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Linear => self.base_delay.saturating_mul(retry.saturating_add(1)),
            Backoff::Exponential {
                multiplier,
                max_delay,
            } => {
                let factor = multiplier.powi(retry.min(i32::MAX as u32) as i32);
                let secs = self.base_delay.as_secs_f64() * factor;
                if !secs.is_finite() || secs >= max_delay.as_secs_f64() {
                    max_delay
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }
}

/// Retry result indicating what happened.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// Operation succeeded on attempt number `attempts`.
    Success { value: T, attempts: u32 },
    /// Operation hit a terminal error or ran out of attempts.
    Failed { last_error: E, attempts: u32 },
}

impl<T, E> RetryOutcome<T, E> {
    /// Convert to a Result, discarding retry information.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryOutcome::Success { value, .. } => Ok(value),
            RetryOutcome::Failed { last_error, .. } => Err(last_error),
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Success { attempts, .. } | RetryOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }
}

/// Determines if an error is retryable.
pub trait Retryable {
    /// Returns true if the failure is transient and the operation may be retried.
    fn is_retryable(&self) -> bool;
}

/// Execute an async operation, retrying transient failures according to `policy`.
///
/// Terminal failures (`is_retryable() == false`) end the sequence immediately.
/// Each retry is logged at `warn`, the final failure at `error`.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    E: Retryable + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(value) => return RetryOutcome::Success { value, attempts },
            Err(error) => {
                if !error.is_retryable() {
                    tracing::error!(
                        operation = operation_name,
                        attempts,
                        %error,
                        "operation failed with a terminal error"
                    );
                    return RetryOutcome::Failed {
                        last_error: error,
                        attempts,
                    };
                }

                if attempts >= policy.max_attempts() {
                    tracing::error!(
                        operation = operation_name,
                        attempts,
                        %error,
                        "operation failed after exhausting retries"
                    );
                    return RetryOutcome::Failed {
                        last_error: error,
                        attempts,
                    };
                }

                let delay = policy.delay_for(attempts - 1);
                tracing::warn!(
                    operation = operation_name,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    %error,
                    "operation failed, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}
