//! Fact-check registry lookup
//!
//! Queries the Google Fact Check Tools `claims:search` endpoint for prior
//! reviews of a claim. Results keep the upstream relevance order.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use verity_core::{FactCheckEntry, MISSING_TEXT, MISSING_URL, UNKNOWN_PUBLISHER};

use crate::http::{get_json, SourceError};

/// Structured fact-check database
///
/// Never fails: a broken lookup is reported as a single error entry so the
/// aggregation can carry on with the other sources.
#[async_trait]
pub trait FactCheckSource: Send + Sync {
    async fn lookup(&self, query: &str) -> Vec<FactCheckEntry>;
}

/// Google Fact Check Tools configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FactCheckConfig {
    /// API key (required for lookups)
    pub api_key: Option<String>,
    /// Endpoint base, without the `/claims:search` suffix
    pub base_url: String,
    /// Restrict reviews to a language, e.g. "en"
    pub language_code: Option<String>,
    /// Maximum claims requested
    pub page_size: usize,
}

impl Default for FactCheckConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://factchecktools.googleapis.com/v1alpha1".to_string(),
            language_code: None,
            page_size: 10,
        }
    }
}

impl FactCheckConfig {
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Fact-check source backed by Google Fact Check Tools
pub struct GoogleFactCheck {
    http_client: Client,
    config: FactCheckConfig,
}

impl GoogleFactCheck {
    pub fn new(config: FactCheckConfig, http_client: Client) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn search_url(&self, query: &str, key: &str) -> String {
        let mut url = format!(
            "{}/claims:search?query={}&key={}&pageSize={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(query),
            urlencoding::encode(key),
            self.config.page_size
        );
        if let Some(lang) = &self.config.language_code {
            url.push_str(&format!("&languageCode={}", urlencoding::encode(lang)));
        }
        url
    }

    async fn search(&self, query: &str) -> Result<Vec<FactCheckEntry>, SourceError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(SourceError::NotConfigured("fact-check API key"))?;

        let response: ClaimSearchResponse =
            get_json(&self.http_client, &self.search_url(query, key)).await?;

        Ok(into_entries(response))
    }
}

#[async_trait]
impl FactCheckSource for GoogleFactCheck {
    async fn lookup(&self, query: &str) -> Vec<FactCheckEntry> {
        match self.search(query).await {
            Ok(entries) => {
                debug!("Fact-check lookup returned {} reviews", entries.len());
                entries
            }
            Err(e) => {
                warn!("Fact-check lookup degraded: {}", e);
                vec![FactCheckEntry::error(format!("Google Fact Check API error: {}", e))]
            }
        }
    }
}

/// Map claims to entries, using each claim's first review and skipping
/// claims that have none
fn into_entries(response: ClaimSearchResponse) -> Vec<FactCheckEntry> {
    response
        .claims
        .into_iter()
        .filter_map(|claim| {
            let review = claim.claim_review.into_iter().next()?;
            Some(FactCheckEntry::review(
                claim.text.unwrap_or_else(|| MISSING_TEXT.to_string()),
                review.textual_rating.unwrap_or_else(|| MISSING_TEXT.to_string()),
                review
                    .publisher
                    .and_then(|p| p.name)
                    .unwrap_or_else(|| UNKNOWN_PUBLISHER.to_string()),
                review.url.unwrap_or_else(|| MISSING_URL.to_string()),
            ))
        })
        .collect()
}

// Fact Check Tools API response types
#[derive(Debug, Deserialize)]
struct ClaimSearchResponse {
    #[serde(default)]
    claims: Vec<ApiClaim>,
}

#[derive(Debug, Deserialize)]
struct ApiClaim {
    text: Option<String>,
    #[serde(default, rename = "claimReview")]
    claim_review: Vec<ApiClaimReview>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiClaimReview {
    publisher: Option<ApiPublisher>,
    url: Option<String>,
    textual_rating: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiPublisher {
    name: Option<String>,
}
