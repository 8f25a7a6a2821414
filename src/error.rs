//! Error types for search-batch
//!
//! Three layers of failure are kept apart:
//! - [`Error`] is fatal for a run (bad configuration, unreadable input, unwritable output)
//! - [`InvokeError`] describes one failed HTTP exchange and is always retryable
//! - [`RetryError`] is the terminal, per-item outcome once the retry policy gives up

use thiserror::Error;

/// Result type alias for search-batch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for search-batch
///
/// These errors abort a run. Per-item failures never surface here; they are
/// recorded in the item's [`ProcessResult`](crate::types::ProcessResult).
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "dispatch.max_concurrent")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited file could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration file could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP client could not be constructed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A result slot was written twice
    #[error("result slot {index} already filled")]
    SlotAlreadyFilled {
        /// Index of the slot that was written twice
        index: usize,
    },

    /// A result was recorded for an index outside the batch
    #[error("result slot {index} out of range for batch of {len}")]
    SlotOutOfRange {
        /// Index that was written
        index: usize,
        /// Number of slots in the batch
        len: usize,
    },
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a configuration key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Failure of a single request/response exchange
#[derive(Clone, Debug, Error)]
pub enum InvokeError {
    /// The request could not be sent, or no response arrived before the deadline
    #[error("sending request: {0}")]
    Transport(String),

    /// A response arrived with a non-2xx status
    #[error("unexpected status code: {status}")]
    Status {
        /// HTTP status code returned by the endpoint
        status: u16,
        /// Leading part of the response body, for diagnostics
        body: String,
    },

    /// A 2xx response body did not match the expected response shape
    #[error("decoding response: {0}")]
    Decode(String),
}

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures should return `true`. Returning `false` makes
/// [`run_with_retry`](crate::retry::run_with_retry) give up immediately.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for InvokeError {
    fn is_retryable(&self) -> bool {
        // Every failure class consumes an attempt. A decode failure from a
        // malformed endpoint repeats identically, so those retries are wasted.
        match self {
            InvokeError::Transport(_) => true,
            InvokeError::Status { .. } => true,
            InvokeError::Decode(_) => true,
        }
    }
}

impl From<reqwest::Error> for InvokeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            InvokeError::Decode(e.without_url().to_string())
        } else {
            InvokeError::Transport(e.without_url().to_string())
        }
    }
}

/// Terminal failure of one item after the retry policy has given up
#[derive(Clone, Debug, Error)]
pub enum RetryError<E> {
    /// Every allowed attempt failed with a retryable error
    #[error("after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts performed
        attempts: u32,
        /// The last failure observed
        last: E,
    },

    /// An attempt failed with an error that must not be retried
    #[error("{0}")]
    Permanent(E),

    /// The worker owning this item stopped before recording an outcome
    #[error("worker stopped before recording a result: {0}")]
    WorkerLost(String),
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up, when known
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::Exhausted { attempts, .. } => Some(*attempts),
            RetryError::Permanent(_) => Some(1),
            RetryError::WorkerLost(_) => None,
        }
    }

    /// The last underlying failure, when one was observed
    pub fn last_error(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { last, .. } | RetryError::Permanent(last) => Some(last),
            RetryError::WorkerLost(_) => None,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_invoke_error_is_retryable() {
        assert!(InvokeError::Transport("connection refused".into()).is_retryable());
        assert!(
            InvokeError::Status {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(InvokeError::Decode("expected value".into()).is_retryable());
    }

    #[test]
    fn exhausted_message_names_attempt_count() {
        let err = RetryError::Exhausted {
            attempts: 3,
            last: InvokeError::Status {
                status: 500,
                body: "boom".into(),
            },
        };

        assert_eq!(err.to_string(), "after 3 attempts: unexpected status code: 500");
        assert_eq!(err.attempts(), Some(3));
        assert!(matches!(
            err.last_error(),
            Some(InvokeError::Status { status: 500, .. })
        ));
    }

    #[test]
    fn worker_lost_has_no_attempt_count() {
        let err: RetryError<InvokeError> = RetryError::WorkerLost("task panicked".into());
        assert_eq!(err.attempts(), None);
        assert!(err.last_error().is_none());
    }

    #[test]
    fn config_helper_records_key() {
        let err = Error::config("retry.max_attempts", "must be at least 1");
        match err {
            Error::Config { message, key } => {
                assert_eq!(message, "must be at least 1");
                assert_eq!(key.as_deref(), Some("retry.max_attempts"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
