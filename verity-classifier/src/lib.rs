//! Verity Classifier
//!
//! Entailment classification for claims:
//! - **ZeroShotClassifier**: hosted NLI model in a zero-shot pipeline
//! - **LlmClassifier**: chat LLM asked to score the candidate labels
//!
//! Both sit behind [`EntailmentClassifier`], which takes the label set per
//! call so the caller decides whether the classifier may abstain.

pub mod backend;
pub mod llm;
pub mod traits;
pub mod zero_shot;

pub use backend::*;
pub use llm::*;
pub use traits::*;
pub use zero_shot::*;
