//! # search-batch
//!
//! Concurrent batch client for search/enrichment APIs: one POST per input,
//! bounded parallelism, per-request retry with backoff, and results returned in
//! input order.
//!
//! ## Quick Start
//!
//! ```no_run
//! use search_batch::{Config, Dispatcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.api.api_key = std::env::var("SEARCH_BATCH_API_KEY")?;
//!     config.validate()?;
//!
//!     let dispatcher = Dispatcher::from_config(&config)?;
//!     let results = dispatcher
//!         .run(vec!["Acme Corp".to_string(), "Globex".to_string()])
//!         .await;
//!
//!     for result in &results {
//!         println!("{} -> success={}", result.input, result.is_success());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Delimited-file input and output
pub mod csv_file;
/// Bounded-concurrency batch dispatch
pub mod dispatcher;
/// Error types
pub mod error;
/// Single-call HTTP invocation
pub mod invoker;
/// Retry logic with linear backoff
pub mod retry;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, DispatchConfig, RequestConfig, RetryConfig};
pub use dispatcher::{Dispatcher, ResultSlots};
pub use error::{Error, InvokeError, IsRetryable, Result, RetryError};
pub use invoker::{HttpInvoker, Invoker};
pub use retry::{Backoff, LinearBackoff, NoBackoff, RetryPolicy, run_with_retry};
pub use types::{
    BatchSummary, InputItem, OutputRow, ProcessResult, RequestPayload, ResponsePayload,
};
