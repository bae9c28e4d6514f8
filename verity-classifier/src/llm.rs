//! LLM-prompted classification
//!
//! Asks a chat model to spread probability over the candidate labels and
//! reply with a JSON object. Scores are normalized to sum to 100.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

use verity_core::{rank_scores, Label, LabelScore, LabelSet};

use crate::{ClassifierError, EntailmentClassifier, SharedBackend};

/// System prompt for label scoring
const CLASSIFIER_SYSTEM_PROMPT: &str = r#"
You are a zero-shot textual entailment classifier used by a fact-checking service.

You are given a passage and a list of candidate labels. Estimate how strongly the passage supports each label.

Rules:
1. Output ONLY a JSON object mapping every candidate label to a probability between 0 and 1
2. Use the labels exactly as given
3. Probabilities should sum to 1
4. No commentary, no code fences

Candidate labels: {labels}
"#;

/// Classifier that scores labels with a chat LLM
pub struct LlmClassifier {
    backend: SharedBackend,
}

impl LlmClassifier {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl EntailmentClassifier for LlmClassifier {
    async fn classify(
        &self,
        text: &str,
        labels: &LabelSet,
    ) -> Result<Vec<LabelScore>, ClassifierError> {
        let system = CLASSIFIER_SYSTEM_PROMPT.replace("{labels}", &labels.names().join(", "));

        let reply = self.backend.generate(&system, text).await?;
        debug!("Classifier reply from {}: {}", self.backend.model_name(), reply);

        parse_reply(&reply, labels)
    }

    fn name(&self) -> &str {
        self.backend.model_name()
    }
}

/// Extract the JSON object from a model reply and turn it into ranked scores
fn parse_reply(reply: &str, labels: &LabelSet) -> Result<Vec<LabelScore>, ClassifierError> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &reply[s..=e],
        _ => return Err(ClassifierError::Parse(format!("no JSON object in reply: {}", reply))),
    };

    // Ordered keys keep the choice stable when several spellings name one label
    let raw: BTreeMap<String, f64> =
        serde_json::from_str(json).map_err(|e| ClassifierError::Parse(e.to_string()))?;

    let mut recognized = false;
    let weights: Vec<f64> = labels
        .labels()
        .iter()
        .map(|label| {
            let weight = raw
                .get_key_value(label.as_str())
                .or_else(|| {
                    raw.iter()
                        .find(|(name, _)| name.parse::<Label>().ok() == Some(*label))
                })
                .map(|(_, &w)| {
                    recognized = true;
                    if w.is_finite() { w.max(0.0) } else { 0.0 }
                });
            weight.unwrap_or(0.0)
        })
        .collect();

    if !recognized {
        return Err(ClassifierError::Parse(
            "reply scored none of the candidate labels".to_string(),
        ));
    }

    let total: f64 = weights.iter().sum();
    let scores = labels
        .labels()
        .iter()
        .zip(weights)
        .map(|(label, weight)| {
            let share = if total > 0.0 { weight / total * 100.0 } else { 0.0 };
            LabelScore::new(*label, share)
        })
        .collect();

    Ok(rank_scores(scores))
}
