//! Verity Runtime
//!
//! Wires the classifier and evidence sources into a [`VerdictAggregator`]
//! and loads the settings that describe them.

pub mod aggregator;
pub mod config;

pub use aggregator::*;
pub use config::*;
