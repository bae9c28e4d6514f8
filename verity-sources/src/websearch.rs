//! General web search
//!
//! Supplementary context only: results are shown to the caller but never
//! influence the verdict. Uses the Google Custom Search JSON API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use verity_core::{SearchEntry, MAX_SEARCH_RESULTS};

use crate::http::{get_json, SourceError};

/// Message carried by the disabled sentinel
pub const SEARCH_DISABLED: &str = "Web search is not configured";

/// Keyword web search
///
/// Never fails: errors become a single error entry, and a deployment
/// without credentials yields a single disabled entry.
#[async_trait]
pub trait WebSearchSource: Send + Sync {
    async fn search(&self, query: &str) -> Vec<SearchEntry>;
}

/// Google Custom Search configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    pub api_key: Option<String>,
    /// Programmable search engine id (`cx`)
    pub engine_id: Option<String>,
    pub base_url: String,
    pub max_results: usize,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            base_url: "https://www.googleapis.com/customsearch/v1".to_string(),
            max_results: MAX_SEARCH_RESULTS,
        }
    }
}

impl WebSearchConfig {
    /// Both the API key and the engine id are present
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.api_key) && present(&self.engine_id)
    }
}

/// Web search backed by Google Custom Search
pub struct GoogleSearch {
    http_client: Client,
    config: WebSearchConfig,
}

impl GoogleSearch {
    pub fn new(config: WebSearchConfig, http_client: Client) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn limit(&self) -> usize {
        self.config.max_results.clamp(1, MAX_SEARCH_RESULTS)
    }

    async fn fetch(&self, query: &str, key: &str, cx: &str) -> Result<Vec<SearchEntry>, SourceError> {
        let url = format!(
            "{}?q={}&key={}&cx={}&num={}",
            self.config.base_url,
            urlencoding::encode(query),
            urlencoding::encode(key),
            urlencoding::encode(cx),
            self.limit()
        );

        let response: CustomSearchResponse = get_json(&self.http_client, &url).await?;

        Ok(response
            .items
            .into_iter()
            .take(self.limit())
            .map(|item| SearchEntry::result(item.title, item.snippet, item.link))
            .collect())
    }
}

#[async_trait]
impl WebSearchSource for GoogleSearch {
    async fn search(&self, query: &str) -> Vec<SearchEntry> {
        let (key, cx) = match (&self.config.api_key, &self.config.engine_id) {
            (Some(key), Some(cx)) if self.config.is_configured() => (key, cx),
            _ => {
                debug!("No web search credentials configured");
                return vec![SearchEntry::disabled(SEARCH_DISABLED)];
            }
        };

        match self.fetch(query, key, cx).await {
            Ok(results) => {
                debug!("Web search returned {} results", results.len());
                results
            }
            Err(e) => {
                warn!("Web search degraded: {}", e);
                vec![SearchEntry::error(format!("Google Search API error: {}", e))]
            }
        }
    }
}

// Custom Search API response types
#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    #[serde(default)]
    items: Vec<CustomSearchItem>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}
