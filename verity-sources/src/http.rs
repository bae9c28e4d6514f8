//! Shared HTTP client for evidence sources
//!
//! Every outbound call carries a request timeout so a slow upstream
//! degrades into a sentinel instead of stalling the request.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent sent to every upstream (MediaWiki requires a descriptive one)
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("verity/", env!("CARGO_PKG_VERSION"), " (claim verification bot)")
                .to_string(),
            timeout_secs: 8,
        }
    }
}

/// Errors from evidence source requests
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream returned status {0}")]
    Status(StatusCode),

    #[error("Unexpected response: {0}")]
    Parse(String),

    #[error("Not configured: {0}")]
    NotConfigured(&'static str),
}

/// Create an HTTP client for evidence sources
pub fn create_client(config: &HttpConfig) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| SourceError::ClientBuild(e.to_string()))
}

/// GET a URL and decode a JSON body, treating non-2xx as an error
pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
) -> Result<T, SourceError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| SourceError::Parse(e.to_string()))
}
