//! Runtime configuration
//!
//! Settings come from an optional TOML file. Every section has defaults,
//! so an empty file (or no file) yields a working deployment with the
//! hosted zero-shot classifier and the unauthenticated encyclopedia.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use verity_classifier::{
    create_backend, ChatConfig, ClassifierError, LlmClassifier, LlmError, SharedClassifier,
    ZeroShotClassifier, ZeroShotConfig,
};
use verity_core::{LabelError, LabelSet, DEFAULT_SOURCE_TIMEOUT_SECS};
use verity_sources::{
    create_client, FactCheckConfig, GoogleFactCheck, GoogleSearch, HttpConfig, SourceError,
    WebSearchConfig, Wikipedia, WikipediaConfig,
};

use crate::{AggregatorConfig, VerdictAggregator};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid labels: {0}")]
    Labels(#[from] LabelError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Top-level settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub aggregator: AggregatorSettings,
    pub http: HttpConfig,
    pub fact_check: FactCheckConfig,
    pub encyclopedia: WikipediaConfig,
    pub web_search: WebSearchConfig,
    pub classifier: ClassifierSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Browser origins allowed to call the gateway (CORS)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bind address: {}", e)))
    }
}

/// Aggregation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregatorSettings {
    /// Candidate labels, e.g. `["true", "false", "not sure"]`
    pub labels: LabelSet,
    pub source_timeout_secs: u64,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            labels: LabelSet::default(),
            source_timeout_secs: DEFAULT_SOURCE_TIMEOUT_SECS,
        }
    }
}

/// Which classifier backs the aggregator
///
/// ```toml
/// [classifier]
/// kind = "chat"
/// provider = "anthropic"
/// model = "claude-3-5-haiku-latest"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSettings {
    ZeroShot(ZeroShotConfig),
    Chat(ChatConfig),
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        ClassifierSettings::ZeroShot(ZeroShotConfig::default())
    }
}

/// One line of `verity status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub name: &'static str,
    pub configured: bool,
    pub detail: String,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aggregator.source_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "aggregator.source_timeout_secs must be positive".to_string(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid("http.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.aggregator.source_timeout_secs)
    }

    /// Construct the configured classifier
    pub fn build_classifier(&self) -> Result<SharedClassifier, ConfigError> {
        let timeout = self.source_timeout();
        let classifier: SharedClassifier = match &self.classifier {
            ClassifierSettings::ZeroShot(config) => {
                Arc::new(ZeroShotClassifier::new(config.clone(), timeout)?)
            }
            ClassifierSettings::Chat(config) => {
                Arc::new(LlmClassifier::new(create_backend(config.clone(), timeout)?))
            }
        };
        Ok(classifier)
    }

    /// Wire the classifier and all three sources into an aggregator
    pub fn build_aggregator(&self) -> Result<VerdictAggregator, ConfigError> {
        self.validate()?;
        let http_client = create_client(&self.http)?;
        let classifier = self.build_classifier()?;

        info!(
            "Aggregator ready: classifier={} labels={:?} timeout={}s",
            classifier.name(),
            self.aggregator.labels.names(),
            self.aggregator.source_timeout_secs
        );

        let config = AggregatorConfig::new(
            classifier,
            Arc::new(GoogleFactCheck::new(self.fact_check.clone(), http_client.clone())),
            Arc::new(Wikipedia::new(self.encyclopedia.clone(), http_client.clone())),
            Arc::new(GoogleSearch::new(self.web_search.clone(), http_client)),
        )
        .with_labels(self.aggregator.labels.clone())
        .with_timeout(self.source_timeout());

        Ok(VerdictAggregator::new(config))
    }

    /// Which sources will produce evidence with the current credentials
    pub fn source_status(&self) -> Vec<SourceStatus> {
        let classifier = match &self.classifier {
            ClassifierSettings::ZeroShot(config) => SourceStatus {
                name: "classifier",
                configured: true,
                detail: format!(
                    "zero-shot {} ({})",
                    config.model,
                    if config.api_token.is_some() { "token set" } else { "anonymous" }
                ),
            },
            ClassifierSettings::Chat(config) => SourceStatus {
                name: "classifier",
                configured: !config.model.is_empty(),
                detail: format!("{:?} chat model {}", config.provider, config.model),
            },
        };

        vec![
            classifier,
            SourceStatus {
                name: "fact_check",
                configured: self.fact_check.is_configured(),
                detail: self.fact_check.base_url.clone(),
            },
            SourceStatus {
                name: "encyclopedia",
                configured: true,
                detail: self.encyclopedia.api_url.clone(),
            },
            SourceStatus {
                name: "web_search",
                configured: self.web_search.is_configured(),
                detail: self.web_search.base_url.clone(),
            },
        ]
    }
}
