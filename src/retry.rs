//! Retry logic with linear backoff
//!
//! This module runs an operation up to a bounded number of times, sleeping
//! between attempts according to a pluggable [`Backoff`] strategy.
//!
//! # Example
//!
//! ```no_run
//! use search_batch::error::IsRetryable;
//! use search_batch::retry::{LinearBackoff, RetryPolicy, run_with_retry};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct Flaky;
//!
//! impl std::fmt::Display for Flaky {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "flaky")
//!     }
//! }
//!
//! impl IsRetryable for Flaky {
//!     fn is_retryable(&self) -> bool {
//!         true
//!     }
//! }
//!
//! # async fn example() {
//! let policy = RetryPolicy::new(3, Arc::new(LinearBackoff::new(Duration::from_secs(1))));
//! let result = run_with_retry(&policy, || async { Ok::<_, Flaky>(42) }).await;
//! assert_eq!(result.ok(), Some(42));
//! # }
//! ```

use crate::error::{IsRetryable, RetryError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Strategy computing how long to wait before a retry
pub trait Backoff: Send + Sync {
    /// Delay before retry number `retry` (1 for the second attempt, 2 for the third, ...)
    fn delay(&self, retry: u32) -> Duration;
}

/// Delay grows by `base_delay` with each retry: 1x, 2x, 3x, ...
///
/// No jitter and no cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearBackoff {
    base_delay: Duration,
}

impl LinearBackoff {
    /// Create a linear backoff with the given step
    pub fn new(base_delay: Duration) -> Self {
        Self { base_delay }
    }
}

impl Backoff for LinearBackoff {
    fn delay(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }
}

/// Retry immediately, without sleeping
#[derive(Clone, Copy, Debug, Default)]
pub struct NoBackoff;

impl Backoff for NoBackoff {
    fn delay(&self, _retry: u32) -> Duration {
        Duration::ZERO
    }
}

/// Bounded attempts plus the backoff between them
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Arc<dyn Backoff>,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` below 1 is raised to 1
    pub fn new(max_attempts: u32, backoff: Arc<dyn Backoff>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Policy that retries without sleeping, for tests and local endpoints
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Arc::new(NoBackoff))
    }

    /// Maximum attempts per operation, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The backoff strategy in use
    pub fn backoff(&self) -> &dyn Backoff {
        self.backoff.as_ref()
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

/// Execute an async operation under a retry policy
///
/// Returns the first success. When every attempt fails, returns
/// [`RetryError::Exhausted`] wrapping the last failure. A failure that is not
/// retryable ends the loop at once with [`RetryError::Permanent`].
///
/// The backoff sleep suspends only the calling task.
pub async fn run_with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + fmt::Display,
{
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if !e.is_retryable() => {
                tracing::error!(error = %e, "operation failed with non-retryable error");
                return Err(RetryError::Permanent(e));
            }
            Err(e) if attempt >= policy.max_attempts => {
                tracing::error!(
                    error = %e,
                    attempts = attempt,
                    "operation failed after all retry attempts exhausted"
                );
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: e,
                });
            }
            Err(e) => {
                let delay = policy.backoff.delay(attempt);

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis(),
                    "operation failed, retrying"
                );

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                TestError::Transient => write!(f, "transient error"),
                TestError::Permanent => write!(f, "permanent error"),
            }
        }
    }

    impl IsRetryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    /// Records every delay it is asked for, returning zero
    #[derive(Default)]
    struct RecordingBackoff {
        requested: std::sync::Mutex<Vec<u32>>,
    }

    impl Backoff for RecordingBackoff {
        fn delay(&self, retry: u32) -> Duration {
            self.requested.lock().unwrap().push(retry);
            Duration::ZERO
        }
    }

    #[tokio::test]
    async fn test_success_no_retry() {
        let policy = RetryPolicy::immediate(3);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = run_with_retry(&policy, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
    }

    #[tokio::test]
    async fn test_retry_transient_then_succeed() {
        let policy = RetryPolicy::new(3, Arc::new(LinearBackoff::new(Duration::from_millis(5))));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = run_with_retry(&policy, || {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(
            counter.load(Ordering::SeqCst),
            3,
            "should retry twice before success"
        );
    }

    #[tokio::test]
    async fn test_retry_exhausted_makes_exactly_max_attempts() {
        let policy = RetryPolicy::immediate(3);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = run_with_retry(&policy, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(err.attempts(), Some(3));
        assert_eq!(err.to_string(), "after 3 attempts: transient error");
    }

    #[tokio::test]
    async fn test_permanent_error_no_retry() {
        let policy = RetryPolicy::immediate(5);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = run_with_retry(&policy, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Permanent)
            }
        })
        .await;

        assert!(matches!(result, Err(RetryError::Permanent(TestError::Permanent))));
        assert_eq!(
            counter.load(Ordering::SeqCst),
            1,
            "should not retry permanent error"
        );
    }

    #[tokio::test]
    async fn test_backoff_consulted_once_per_retry() {
        let backoff = Arc::new(RecordingBackoff::default());
        let policy = RetryPolicy::new(4, backoff.clone());

        let _ = run_with_retry(&policy, || async { Err::<(), _>(TestError::Transient) }).await;

        assert_eq!(*backoff.requested.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_linear_backoff_total_wait() {
        let policy = RetryPolicy::new(3, Arc::new(LinearBackoff::new(Duration::from_millis(20))));
        let start = std::time::Instant::now();

        let _ = run_with_retry(&policy, || async { Err::<(), _>(TestError::Transient) }).await;

        // 20ms before attempt 2, 40ms before attempt 3
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(60),
            "should wait at least 60ms, waited {:?}",
            elapsed
        );
        assert!(
            elapsed < Duration::from_secs(2),
            "should not wait too long, waited {:?}",
            elapsed
        );
    }

    #[test]
    fn linear_backoff_is_positive_and_non_decreasing() {
        let backoff = LinearBackoff::new(Duration::from_millis(100));
        let delays: Vec<Duration> = (1..=6).map(|k| backoff.delay(k)).collect();

        assert!(delays.iter().all(|d| !d.is_zero()));
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(delays[0], Duration::from_millis(100));
        assert_eq!(delays[4], Duration::from_millis(500));
    }

    #[test]
    fn zero_attempts_is_raised_to_one() {
        assert_eq!(RetryPolicy::immediate(0).max_attempts(), 1);
    }
}
