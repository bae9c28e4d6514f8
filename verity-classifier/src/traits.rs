//! Entailment classifier interface

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use verity_core::{LabelScore, LabelSet};

use crate::LlmError;

/// Errors from classifier inference
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Inference API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Zero-shot text classification over a caller-chosen label set
///
/// Implementations return every recognized label ranked by descending
/// confidence (0-100). Confidences need not sum to 100.
#[async_trait]
pub trait EntailmentClassifier: Send + Sync {
    async fn classify(&self, text: &str, labels: &LabelSet)
        -> Result<Vec<LabelScore>, ClassifierError>;

    /// Model or backend identifier, for logs and health output
    fn name(&self) -> &str;
}

/// Thread-safe reference to a classifier, shared across requests
pub type SharedClassifier = Arc<dyn EntailmentClassifier>;
