//! Chat LLM backends
//!
//! Used by [`crate::LlmClassifier`] when no hosted zero-shot model is
//! available. Supports OpenAI-compatible APIs (OpenAI, OpenRouter, local
//! servers) and Anthropic's Messages API.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// LLM backend errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Empty response")]
    EmptyResponse,
}

/// A chat model that answers a system + user prompt pair
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError>;

    fn model_name(&self) -> &str;
}

/// Thread-safe reference to an LLM backend
pub type SharedBackend = Arc<dyn LlmBackend>;

/// Which chat API a backend talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatProvider {
    OpenAi,
    OpenRouter,
    /// Any OpenAI-compatible server (llama.cpp, vLLM, Ollama, ...)
    Local,
    Anthropic,
}

impl ChatProvider {
    fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ChatProvider::OpenAi => None,
            ChatProvider::OpenRouter => Some("https://openrouter.ai/api/v1"),
            ChatProvider::Local => Some("http://localhost:11434/v1"),
            ChatProvider::Anthropic => Some("https://api.anthropic.com/v1"),
        }
    }
}

/// Chat backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    pub provider: ChatProvider,
    #[serde(default)]
    pub api_key: String,
    /// Overrides the provider's default endpoint
    #[serde(default)]
    pub base_url: Option<String>,
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_tokens() -> u32 {
    256
}

impl ChatConfig {
    pub fn new(provider: ChatProvider, api_key: &str, model: &str) -> Self {
        Self {
            provider,
            api_key: api_key.to_string(),
            base_url: None,
            model: model.to_string(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    fn endpoint(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| self.provider.default_base_url().map(str::to_string))
    }
}

/// Build a shared backend for the configured provider
pub fn create_backend(config: ChatConfig, timeout: Duration) -> Result<SharedBackend, LlmError> {
    if config.model.is_empty() {
        return Err(LlmError::Config("model name is empty".to_string()));
    }
    if config.api_key.is_empty() && config.provider != ChatProvider::Local {
        return Err(LlmError::Config(format!(
            "{:?} backend needs an API key",
            config.provider
        )));
    }

    match config.provider {
        ChatProvider::Anthropic => Ok(Arc::new(AnthropicBackend::new(config, timeout)?)),
        _ => Ok(Arc::new(OpenAIBackend::new(config))),
    }
}

/// OpenAI-compatible chat backend
pub struct OpenAIBackend {
    client: Client<OpenAIConfig>,
    config: ChatConfig,
}

impl OpenAIBackend {
    pub fn new(config: ChatConfig) -> Self {
        let api_key = if config.api_key.is_empty() {
            "sk-local"
        } else {
            config.api_key.as_str()
        };
        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base_url) = config.endpoint() {
            openai_config = openai_config.with_api_base(base_url);
        }

        Self {
            client: Client::with_config(openai_config),
            config,
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAIBackend {
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let api = |e: async_openai::error::OpenAIError| LlmError::Api(e.to_string());

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(api)?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()
                    .map_err(api)?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.config.model)
            .messages(messages)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build()
            .map_err(api)?;

        let response = self.client.chat().create(request).await.map_err(api)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Anthropic Messages API backend
pub struct AnthropicBackend {
    client: reqwest::Client,
    config: ChatConfig,
    endpoint: String,
}

impl AnthropicBackend {
    pub fn new(config: ChatConfig, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;
        let endpoint = format!(
            "{}/messages",
            config.endpoint().unwrap_or_default().trim_end_matches('/')
        );
        Ok(Self {
            client,
            config,
            endpoint,
        })
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": system,
            "messages": [{"role": "user", "content": user}]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("Anthropic API error {}: {}", status, text)));
        }

        let message: AnthropicMessage = response
            .json()
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        message
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or(LlmError::EmptyResponse)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicMessage {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_defaults() {
        let openai = ChatConfig::new(ChatProvider::OpenAi, "k", "gpt-4o-mini");
        assert_eq!(openai.endpoint(), None);

        let router = ChatConfig::new(ChatProvider::OpenRouter, "k", "m");
        assert_eq!(router.endpoint().as_deref(), Some("https://openrouter.ai/api/v1"));

        let custom = ChatConfig::new(ChatProvider::Local, "", "m").with_base_url("http://gpu:8000/v1");
        assert_eq!(custom.endpoint().as_deref(), Some("http://gpu:8000/v1"));
    }

    #[test]
    fn test_create_backend_requires_key() {
        let config = ChatConfig::new(ChatProvider::Anthropic, "", "claude-3-5-haiku-latest");
        assert!(matches!(
            create_backend(config, Duration::from_secs(5)),
            Err(LlmError::Config(_))
        ));

        let local = ChatConfig::new(ChatProvider::Local, "", "llama3");
        let backend = create_backend(local, Duration::from_secs(5)).unwrap();
        assert_eq!(backend.model_name(), "llama3");
    }

    #[test]
    fn test_config_deserialize() {
        let config: ChatConfig = serde_json::from_str(
            r#"{"provider": "openrouter", "api_key": "k", "model": "meta-llama/llama-3-70b"}"#,
        )
        .unwrap();
        assert_eq!(config.provider, ChatProvider::OpenRouter);
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_parse_anthropic_message() {
        let json = r#"{"content":[{"type":"text","text":"{\"true\": 0.9}"}],"stop_reason":"end_turn"}"#;
        let message: AnthropicMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.content[0].text.as_deref(), Some("{\"true\": 0.9}"));
    }
}
