//! Retry utility for transient errors in async operations
//!
//! Provides an exponential backoff policy and a retry loop that honours the
//! shared shutdown signal both before each attempt and while sleeping.

use crate::core::shutdown::ShutdownSignal;
use std::time::Duration;
use tokio::time::sleep;

/// Configurable retry policy for async operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Policy with the default delays and the given attempt limit (at least one attempt)
    pub fn with_attempts(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay applied before retry number `retry` (1-based).
    ///
    /// `base_delay * 2^(retry - 1)`, capped at `max_delay`. Retry 0 is the
    /// first attempt and never waits.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Why a retried operation finally gave up
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The shutdown signal fired before or between attempts
    #[error("cancelled before attempt {attempt}")]
    Cancelled { attempt: usize },

    /// The operation failed with an error that must not be retried
    #[error("{source}")]
    Aborted {
        attempt: usize,
        #[source]
        source: E,
    },

    /// Every attempt failed; carries the last underlying error
    #[error("failed after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: usize,
        #[source]
        source: E,
    },
}

impl<E> RetryError<E> {
    /// Number of attempts that actually ran
    pub fn attempts(&self) -> usize {
        match self {
            RetryError::Cancelled { attempt } => attempt.saturating_sub(1),
            RetryError::Aborted { attempt, .. } => *attempt,
            RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Execute an async operation with exponential backoff between attempts.
///
/// `should_retry` decides whether an error is transient. Errors it rejects end
/// the loop immediately as [`RetryError::Aborted`].
///
/// # Examples
/// ```rust
/// use repotree::core::retry::{retry_async, RetryPolicy};
/// use repotree::core::shutdown::ShutdownSignal;
///
/// # async fn example() -> Result<u32, repotree::core::retry::RetryError<String>> {
/// let shutdown = ShutdownSignal::new();
/// let value = retry_async(
///     "lookup",
///     &RetryPolicy::default(),
///     &shutdown,
///     |_: &String| true,
///     || async { Ok::<u32, String>(7) },
/// )
/// .await?;
/// # Ok(value)
/// # }
/// ```
pub async fn retry_async<F, T, E, Fut, P>(
    operation_name: &str,
    policy: &RetryPolicy,
    shutdown: &ShutdownSignal,
    should_retry: P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        if shutdown.is_triggered() {
            return Err(RetryError::Cancelled { attempt });
        }

        if attempt > 1 {
            let delay = policy.backoff((attempt - 1) as u32);
            log::debug!(
                "Operation '{}' retry {}/{} in {:?}",
                operation_name,
                attempt,
                max_attempts,
                delay
            );
            tokio::select! {
                _ = sleep(delay) => {}
                _ = shutdown.triggered() => {
                    return Err(RetryError::Cancelled { attempt });
                }
            }
        }

        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if !should_retry(&error) {
                    return Err(RetryError::Aborted {
                        attempt,
                        source: error,
                    });
                }
                log::debug!(
                    "Operation '{}' failed on attempt {}/{}: {}",
                    operation_name,
                    attempt,
                    max_attempts,
                    error
                );
                last_error = Some(error);
            }
        }
    }

    match last_error {
        Some(source) => Err(RetryError::Exhausted {
            attempts: max_attempts,
            source,
        }),
        None => Err(RetryError::Cancelled { attempt: 1 }),
    }
}
