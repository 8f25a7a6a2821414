//! Single-call invocation of the search API
//!
//! An [`Invoker`] performs exactly one request/response exchange and classifies
//! the outcome. Retrying is the caller's job (see [`crate::retry`]).

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use crate::config::ApiConfig;
use crate::error::{Error, InvokeError, Result};
use crate::types::{RequestPayload, ResponsePayload};

/// Longest response body excerpt kept in a status error
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Trait for performing one search request
///
/// Implementations must be safe to share across concurrent workers and must
/// not keep per-item state.
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Send `payload` once and return the parsed response or a classified failure
    async fn invoke(
        &self,
        payload: &RequestPayload,
    ) -> std::result::Result<ResponsePayload, InvokeError>;
}

/// [`Invoker`] backed by a shared `reqwest` client
///
/// The per-call deadline is the client timeout from [`ApiConfig::timeout`].
#[derive(Clone, Debug)]
pub struct HttpInvoker {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl HttpInvoker {
    /// Build a client for the configured endpoint, key header and timeout
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let endpoint = url::Url::parse(&config.endpoint)
            .map_err(|e| Error::config("api.endpoint", format!("invalid URL: {e}")))?;

        let key_header = HeaderName::from_bytes(config.api_key_header.as_bytes())
            .map_err(|e| Error::config("api.api_key_header", e.to_string()))?;
        let mut key_value = HeaderValue::from_str(&config.api_key)
            .map_err(|e| Error::config("api.api_key", e.to_string()))?;
        key_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(key_header, key_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// The endpoint requests are sent to
    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

#[async_trait]
impl Invoker for HttpInvoker {
    async fn invoke(
        &self,
        payload: &RequestPayload,
    ) -> std::result::Result<ResponsePayload, InvokeError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| InvokeError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InvokeError::Status {
                status: status.as_u16(),
                body: read_body_prefix(response).await,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| InvokeError::Decode(e.to_string()))
    }
}

/// Read at most `MAX_ERROR_BODY_CHARS` characters of an error body
///
/// Stops pulling chunks once enough bytes for that many characters have
/// arrived; the rest of the body is never buffered. Read failures yield
/// whatever arrived before them.
async fn read_body_prefix(mut response: reqwest::Response) -> String {
    let byte_limit = MAX_ERROR_BODY_CHARS * 4;
    let mut buf = Vec::new();

    while buf.len() < byte_limit {
        match response.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    buf.truncate(byte_limit);

    String::from_utf8_lossy(&buf)
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect()
}
