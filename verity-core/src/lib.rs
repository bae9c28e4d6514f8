//! Verity Core - Domain model for claim verification
//!
//! This crate provides the foundational primitives:
//! - Claims and the classifier label vocabulary
//! - Evidence entries from fact-check, encyclopedia and web search sources
//! - The verdict precedence policy and the response bundle

pub mod claim;
pub mod labels;
pub mod evidence;
pub mod verdict;

pub use claim::*;
pub use labels::*;
pub use evidence::*;
pub use verdict::*;

/// Candidate articles tried per encyclopedia lookup
pub const ENCYCLOPEDIA_CANDIDATES: usize = 3;

/// Maximum characters kept from an article's lead section
pub const SUMMARY_MAX_CHARS: usize = 500;

/// Maximum web search results returned per claim
pub const MAX_SEARCH_RESULTS: usize = 3;

/// Default bound on each evidence call, in seconds
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;
