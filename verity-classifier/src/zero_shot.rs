//! Hosted zero-shot classification
//!
//! Calls a Hugging Face style inference endpoint running an NLI model in
//! the zero-shot-classification pipeline. Two response shapes are seen in
//! the wild and both are accepted:
//! - `{"sequence": ..., "labels": [...], "scores": [...]}`
//! - `[{"label": ..., "score": ...}, ...]`

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use verity_core::{rank_scores, Label, LabelScore, LabelSet};

use crate::{ClassifierError, EntailmentClassifier};

/// Zero-shot inference endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZeroShotConfig {
    /// Endpoint prefix; the model id is appended
    pub endpoint: String,
    pub model: String,
    pub api_token: Option<String>,
    /// NLI hypothesis template, e.g. "This claim is {}."
    pub hypothesis_template: Option<String>,
}

impl Default for ZeroShotConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co/models".to_string(),
            model: "microsoft/deberta-large-mnli".to_string(),
            api_token: None,
            hypothesis_template: None,
        }
    }
}

/// Classifier backed by a hosted zero-shot pipeline
pub struct ZeroShotClassifier {
    http_client: Client,
    config: ZeroShotConfig,
    url: String,
}

impl ZeroShotClassifier {
    pub fn new(config: ZeroShotConfig, timeout: Duration) -> Result<Self, ClassifierError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Network(e.to_string()))?;
        let url = format!("{}/{}", config.endpoint.trim_end_matches('/'), config.model);
        Ok(Self {
            http_client,
            config,
            url,
        })
    }

    fn request_body(&self, text: &str, labels: &LabelSet) -> serde_json::Value {
        let mut parameters = serde_json::json!({
            "candidate_labels": labels.names(),
            "multi_label": false,
        });
        if let Some(template) = &self.config.hypothesis_template {
            parameters["hypothesis_template"] = serde_json::Value::String(template.clone());
        }
        serde_json::json!({ "inputs": text, "parameters": parameters })
    }
}

#[async_trait]
impl EntailmentClassifier for ZeroShotClassifier {
    async fn classify(
        &self,
        text: &str,
        labels: &LabelSet,
    ) -> Result<Vec<LabelScore>, ClassifierError> {
        let mut request = self.http_client.post(&self.url).json(&self.request_body(text, labels));
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        if !status.is_success() {
            // Model cold starts come back as 503 {"error": "...", "estimated_time": ...}
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ClassifierError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let scores = parse_scores(&body, labels)?;
        debug!("Zero-shot model {} ranked {} labels", self.config.model, scores.len());
        Ok(scores)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// Decode an inference response into ranked scores for the offered labels
pub fn parse_scores(body: &str, labels: &LabelSet) -> Result<Vec<LabelScore>, ClassifierError> {
    let response: ZeroShotResponse =
        serde_json::from_str(body).map_err(|e| ClassifierError::Parse(e.to_string()))?;

    let pairs: Vec<(String, f64)> = match response {
        ZeroShotResponse::Pipeline { labels, scores } => labels.into_iter().zip(scores).collect(),
        ZeroShotResponse::Pairs(pairs) => pairs.into_iter().map(|p| (p.label, p.score)).collect(),
    };

    let scores: Vec<LabelScore> = pairs
        .into_iter()
        .filter_map(|(name, score)| {
            let label = name.parse::<Label>().ok()?;
            labels
                .contains(label)
                .then(|| LabelScore::from_probability(label, score))
        })
        .collect();

    if scores.is_empty() {
        return Err(ClassifierError::Parse(
            "response contained none of the candidate labels".to_string(),
        ));
    }

    Ok(rank_scores(scores))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Pipeline { labels: Vec<String>, scores: Vec<f64> },
    Pairs(Vec<LabelProbability>),
}

#[derive(Debug, Deserialize)]
struct LabelProbability {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}
