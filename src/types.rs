//! Core types for search-batch

use serde::{Deserialize, Serialize};

use crate::config::RequestConfig;
use crate::error::{InvokeError, RetryError};

/// One input string and its position in the original list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputItem {
    /// Position in the input list
    pub index: usize,
    /// The query text
    pub text: String,
}

impl InputItem {
    /// Number a list of inputs by position
    pub fn enumerate(inputs: Vec<String>) -> Vec<InputItem> {
        inputs
            .into_iter()
            .enumerate()
            .map(|(index, text)| InputItem { index, text })
            .collect()
    }
}

/// Content options sent with a search request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contents {
    /// Include page text in results
    pub text: bool,
}

/// JSON body of one search request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    /// Query text, taken verbatim from the input
    pub query: String,
    /// Search category
    pub category: String,
    /// Number of results requested
    pub num_results: u32,
    /// Content options
    pub contents: Contents,
}

impl RequestPayload {
    /// Build the request for one input
    pub fn for_query(text: &str, config: &RequestConfig) -> Self {
        Self {
            query: text.to_string(),
            category: config.category.clone(),
            num_results: config.num_results,
            contents: Contents {
                text: config.include_text,
            },
        }
    }
}

/// JSON body returned by the search API
///
/// `success` is the API's own verdict and is independent of the HTTP status.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// Result text
    #[serde(default)]
    pub result: String,
    /// Whether the API considers the query answered
    #[serde(default)]
    pub success: bool,
    /// Error reported by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Terminal outcome for one input
#[derive(Clone, Debug)]
pub struct ProcessResult {
    /// Position of the input in the original list
    pub index: usize,
    /// The input text
    pub input: String,
    /// Parsed response, when a call succeeded
    pub response: Option<ResponsePayload>,
    /// Terminal failure, when every attempt failed
    pub error: Option<RetryError<InvokeError>>,
}

impl ProcessResult {
    /// Record the outcome of the retry policy for `item`
    pub fn from_outcome(
        item: InputItem,
        outcome: Result<ResponsePayload, RetryError<InvokeError>>,
    ) -> Self {
        let (response, error) = match outcome {
            Ok(response) => (Some(response), None),
            Err(e) => (None, Some(e)),
        };
        Self {
            index: item.index,
            input: item.text,
            response,
            error,
        }
    }

    /// Result for an item whose worker never reported back
    pub fn lost(index: usize, input: String, reason: impl Into<String>) -> Self {
        Self {
            index,
            input,
            response: None,
            error: Some(RetryError::WorkerLost(reason.into())),
        }
    }

    /// True when a response arrived and the API reported success
    pub fn is_success(&self) -> bool {
        self.response.as_ref().is_some_and(|r| r.success)
    }

    /// Error text shown to the user
    ///
    /// The transport/retry error wins, then the API's own error, then nothing.
    pub fn error_message(&self) -> Option<String> {
        if let Some(e) = &self.error {
            return Some(e.to_string());
        }
        self.response
            .as_ref()
            .and_then(|r| r.error.clone())
            .filter(|e| !e.is_empty())
    }
}

/// One output record: input, result, success flag and error text
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    /// The input text
    #[serde(rename = "Input")]
    pub input: String,
    /// Result text, empty when no response arrived
    #[serde(rename = "Result")]
    pub result: String,
    /// API success flag, false when no response arrived
    #[serde(rename = "Success")]
    pub success: bool,
    /// Error text, empty when none
    #[serde(rename = "Error")]
    pub error: String,
}

impl From<&ProcessResult> for OutputRow {
    fn from(r: &ProcessResult) -> Self {
        Self {
            input: r.input.clone(),
            result: r
                .response
                .as_ref()
                .map(|resp| resp.result.clone())
                .unwrap_or_default(),
            success: r.is_success(),
            error: r.error_message().unwrap_or_default(),
        }
    }
}

/// Counts over a finished batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of inputs
    pub total: usize,
    /// Responses with `success = true`
    pub succeeded: usize,
    /// Responses received where the API reported failure
    pub api_failed: usize,
    /// Items that ended in a terminal error
    pub errored: usize,
}

impl BatchSummary {
    /// Tally a result list
    pub fn from_results(results: &[ProcessResult]) -> Self {
        results.iter().fold(
            BatchSummary {
                total: results.len(),
                ..Default::default()
            },
            |mut acc, r| {
                match (&r.error, &r.response) {
                    (Some(_), _) => acc.errored += 1,
                    (None, Some(resp)) if resp.success => acc.succeeded += 1,
                    (None, _) => acc.api_failed += 1,
                }
                acc
            },
        )
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} total, {} succeeded, {} reported failure, {} errored",
            self.total, self.succeeded, self.api_failed, self.errored
        )
    }
}
