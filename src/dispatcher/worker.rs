//! Per-item work: build the request, call through the retry policy, record the outcome.

use std::sync::Arc;

use crate::config::RequestConfig;
use crate::invoker::Invoker;
use crate::retry::{RetryPolicy, run_with_retry};
use crate::types::{InputItem, ProcessResult, RequestPayload};

/// Everything a worker needs, shared read-only across the batch
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub(crate) invoker: Arc<dyn Invoker>,
    pub(crate) request: Arc<RequestConfig>,
    pub(crate) retry: RetryPolicy,
}

impl WorkerContext {
    /// Run one item to its terminal outcome
    ///
    /// Never fails: exhaustion is recorded in the returned result.
    pub(crate) async fn process(&self, item: InputItem) -> ProcessResult {
        let payload = RequestPayload::for_query(&item.text, &self.request);

        let outcome = run_with_retry(&self.retry, || self.invoker.invoke(&payload)).await;

        match &outcome {
            Ok(response) => tracing::debug!(
                index = item.index,
                success = response.success,
                "item completed"
            ),
            Err(e) => tracing::warn!(index = item.index, error = %e, "item failed"),
        }

        ProcessResult::from_outcome(item, outcome)
    }
}
