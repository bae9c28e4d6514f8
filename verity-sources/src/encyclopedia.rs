//! Encyclopedia lookup
//!
//! Searches Wikipedia for a claim, then tries the top candidate titles in
//! rank order and summarizes the first one that resolves to an article.
//! Finding nothing is a normal outcome, so failures are logged and
//! reported as `None`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use verity_core::{
    truncate_chars, EncyclopediaSummary, ENCYCLOPEDIA_CANDIDATES, SUMMARY_MAX_CHARS,
};

use crate::http::{get_json, SourceError};

/// Reference knowledge base
#[async_trait]
pub trait EncyclopediaSource: Send + Sync {
    async fn summarize(&self, query: &str) -> Option<EncyclopediaSummary>;
}

/// MediaWiki configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WikipediaConfig {
    /// Action API endpoint
    pub api_url: String,
    /// Candidate titles tried per lookup, at most 3
    pub search_limit: usize,
    /// Characters kept from the lead section, at most 500
    pub summary_chars: usize,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self::for_language("en")
    }
}

impl WikipediaConfig {
    pub fn for_language(lang: &str) -> Self {
        Self {
            api_url: format!("https://{}.wikipedia.org/w/api.php", lang),
            search_limit: ENCYCLOPEDIA_CANDIDATES,
            summary_chars: SUMMARY_MAX_CHARS,
        }
    }
}

/// Encyclopedia source backed by the MediaWiki Action API
pub struct Wikipedia {
    http_client: Client,
    config: WikipediaConfig,
}

impl Wikipedia {
    pub fn new(config: WikipediaConfig, http_client: Client) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn candidates(&self) -> usize {
        self.config.search_limit.clamp(1, ENCYCLOPEDIA_CANDIDATES)
    }

    fn summary_chars(&self) -> usize {
        self.config.summary_chars.min(SUMMARY_MAX_CHARS)
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}?action=query&list=search&srsearch={}&srlimit={}&srprop=&format=json&formatversion=2",
            self.config.api_url,
            urlencoding::encode(query),
            self.candidates()
        )
    }

    fn page_url(&self, title: &str) -> String {
        format!(
            "{}?action=query&prop=extracts%7Cinfo&exintro=1&explaintext=1&inprop=url&redirects=1&format=json&formatversion=2&titles={}",
            self.config.api_url,
            urlencoding::encode(title)
        )
    }

    /// Candidate titles, best match first
    async fn search_titles(&self, query: &str) -> Result<Vec<String>, SourceError> {
        let response: SearchResponse = get_json(&self.http_client, &self.search_url(query)).await?;
        Ok(response
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    /// Fetch a page; `None` unless the title resolves to an article with a lead section
    async fn fetch_page(&self, title: &str) -> Result<Option<EncyclopediaSummary>, SourceError> {
        let response: PageResponse = get_json(&self.http_client, &self.page_url(title)).await?;
        let page = response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .filter(|p| !p.missing && !p.invalid);

        Ok(page.and_then(|p| {
            let extract = p.extract.as_deref().map(str::trim).unwrap_or_default();
            if extract.is_empty() {
                return None;
            }
            Some(EncyclopediaSummary {
                summary: truncate_chars(extract, self.summary_chars()),
                url: p.fullurl.unwrap_or_default(),
                title: p.title,
            })
        }))
    }

    async fn lookup(&self, query: &str) -> Result<Option<EncyclopediaSummary>, SourceError> {
        let titles = self.search_titles(query).await?;
        debug!("Encyclopedia search returned {} candidates", titles.len());

        for title in titles.iter().take(self.candidates()) {
            if let Some(summary) = self.fetch_page(title).await? {
                return Ok(Some(summary));
            }
            debug!("Encyclopedia candidate '{}' has no article text", title);
        }

        Ok(None)
    }
}

#[async_trait]
impl EncyclopediaSource for Wikipedia {
    async fn summarize(&self, query: &str) -> Option<EncyclopediaSummary> {
        match self.lookup(query).await {
            Ok(summary) => summary,
            Err(e) => {
                debug!("Encyclopedia lookup failed: {}", e);
                None
            }
        }
    }
}

// MediaWiki API response types
#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    query: Option<PageQuery>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    extract: Option<String>,
    fullurl: Option<String>,
}
