//! Configuration types for search-batch

use crate::error::{Error, Result};
use crate::retry::{LinearBackoff, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Remote endpoint and credentials
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Search endpoint receiving one POST per input (default: "https://api.exa.ai/search")
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key sent with every request (no default; supply via file, flag or environment)
    #[serde(default)]
    pub api_key: String,

    /// Header carrying the API key (default: "x-api-key")
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Per-call timeout covering connect, send and body read (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            api_key_header: default_api_key_header(),
            timeout: default_timeout(),
        }
    }
}

/// Fixed request fields shared by every item in a batch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Search category (default: "company")
    #[serde(default = "default_category")]
    pub category: String,

    /// Number of results requested per query (default: 1)
    #[serde(default = "default_num_results")]
    pub num_results: u32,

    /// Ask the API to include page text (default: true)
    #[serde(default = "default_true")]
    pub include_text: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            category: default_category(),
            num_results: default_num_results(),
            include_text: true,
        }
    }
}

/// Scheduler settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum number of items in flight at once (default: 100)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Retry configuration for failed calls
///
/// The delay before retry `n` is `n * base_delay`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per item, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay of the linear backoff (default: 1000 milliseconds)
    #[serde(default = "default_base_delay", with = "millis_serde")]
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
        }
    }
}

impl RetryConfig {
    /// Build the retry policy described by this configuration
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Arc::new(LinearBackoff::new(self.base_delay)),
        )
    }
}

/// Main configuration for a batch run
///
/// Every section may be omitted from a TOML file; missing values take their
/// defaults. The API key has no usable default and must be supplied.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint, credentials and timeout
    #[serde(default)]
    pub api: ApiConfig,

    /// Fixed request fields
    #[serde(default)]
    pub request: RequestConfig,

    /// Concurrency limit
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Retry behaviour
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Self::from_toml_str(&text)
    }

    /// Check that the configuration can drive a run
    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.api.endpoint)
            .map_err(|e| Error::config("api.endpoint", format!("invalid URL: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::config(
                "api.endpoint",
                format!("unsupported scheme: {}", endpoint.scheme()),
            ));
        }
        if self.api.api_key.trim().is_empty() {
            return Err(Error::config("api.api_key", "API key is required"));
        }
        if self.api.api_key_header.trim().is_empty() {
            return Err(Error::config("api.api_key_header", "header name is empty"));
        }
        if self.api.timeout.is_zero() {
            return Err(Error::config("api.timeout", "must be greater than zero"));
        }
        if self.dispatch.max_concurrent == 0 {
            return Err(Error::config(
                "dispatch.max_concurrent",
                "must be at least 1",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config("retry.max_attempts", "must be at least 1"));
        }
        if self.retry.base_delay.is_zero() {
            return Err(Error::config("retry.base_delay", "must be greater than zero"));
        }
        Ok(())
    }
}

// Default value functions
fn default_endpoint() -> String {
    "https://api.exa.ai/search".to_string()
}

fn default_api_key_header() -> String {
    "x-api-key".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_category() -> String {
    "company".to_string()
}

fn default_num_results() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent() -> usize {
    100
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> Duration {
    Duration::from_millis(1000)
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
