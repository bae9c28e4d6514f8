//! Verity Evidence Sources
//!
//! HTTP adapters for the external evidence a verdict draws on:
//! - Fact-check registry (Google Fact Check Tools)
//! - Encyclopedia (Wikipedia via the MediaWiki Action API)
//! - Web search (Google Custom Search), advisory only
//!
//! Every source degrades instead of failing; see each trait for how.

pub mod http;
pub mod factcheck;
pub mod encyclopedia;
pub mod websearch;

pub use http::*;
pub use factcheck::*;
pub use encyclopedia::*;
pub use websearch::*;
