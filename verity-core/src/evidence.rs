//! Evidence gathered from external sources
//!
//! Each source reports its outcome as data rather than as an error:
//! - Fact-check lookups yield reviews, or a single error sentinel
//! - Encyclopedia lookups yield a summary, or nothing
//! - Web searches yield results, an error sentinel, or a disabled sentinel
//!
//! Entries serialize untagged, so a sentinel is told apart by its key:
//! `{"error": ...}` for failures and `{"disabled": ...}` for an
//! unconfigured search.

use serde::{Deserialize, Serialize};

/// Placeholder values for fields a fact-check record left out
pub const MISSING_TEXT: &str = "N/A";
pub const UNKNOWN_PUBLISHER: &str = "Unknown";
pub const MISSING_URL: &str = "#";

/// A prior review published by a fact-checking organisation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReview {
    /// Claim text as recorded by the reviewer
    pub claim: String,
    /// Textual rating, in the publisher's own vocabulary ("False", "Mixed", ...)
    pub verdict: String,
    /// Publisher name
    pub source: String,
    /// Link to the review
    pub source_url: String,
}

/// One entry of a fact-check lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactCheckEntry {
    Review(ClaimReview),
    /// The lookup failed; stands in for the whole result list
    Error {
        #[serde(rename = "error")]
        message: String,
    },
}

impl FactCheckEntry {
    pub fn review(
        claim: impl Into<String>,
        verdict: impl Into<String>,
        source: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        FactCheckEntry::Review(ClaimReview {
            claim: claim.into(),
            verdict: verdict.into(),
            source: source.into(),
            source_url: source_url.into(),
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        FactCheckEntry::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FactCheckEntry::Error { .. })
    }

    pub fn as_review(&self) -> Option<&ClaimReview> {
        match self {
            FactCheckEntry::Review(review) => Some(review),
            FactCheckEntry::Error { .. } => None,
        }
    }
}

/// Lead-section excerpt of the best matching encyclopedia article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncyclopediaSummary {
    pub title: String,
    /// At most [`crate::SUMMARY_MAX_CHARS`] characters
    pub summary: String,
    pub url: String,
}

/// Truncate text to its first `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// One entry of a web search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchEntry {
    Result {
        title: String,
        snippet: String,
        link: String,
    },
    /// The search failed
    Error {
        #[serde(rename = "error")]
        message: String,
    },
    /// Search is not configured for this deployment
    Disabled {
        #[serde(rename = "disabled")]
        message: String,
    },
}

impl SearchEntry {
    pub fn result(
        title: impl Into<String>,
        snippet: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        SearchEntry::Result {
            title: title.into(),
            snippet: snippet.into(),
            link: link.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        SearchEntry::Error {
            message: message.into(),
        }
    }

    pub fn disabled(message: impl Into<String>) -> Self {
        SearchEntry::Disabled {
            message: message.into(),
        }
    }

    pub fn is_result(&self) -> bool {
        matches!(self, SearchEntry::Result { .. })
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, SearchEntry::Disabled { .. })
    }
}
