pub mod claude;
pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output constraint requested from the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    Json,
    /// The reply must be exactly one of these values.
    Enum(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub format: ResponseFormat,
}

impl GenerateRequest {
    pub fn text(model: &str, prompt: String) -> Self {
        Self {
            model: model.to_string(),
            prompt,
            format: ResponseFormat::Text,
        }
    }

    pub fn json(model: &str, prompt: String) -> Self {
        Self {
            model: model.to_string(),
            prompt,
            format: ResponseFormat::Json,
        }
    }

    pub fn one_of(model: &str, prompt: String, values: &[&str]) -> Self {
        Self {
            model: model.to_string(),
            prompt,
            format: ResponseFormat::Enum(values.iter().map(|v| v.to_string()).collect()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
}

/// A single-prompt, single-reply inference endpoint.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, LlmError>;

    /// Models this endpoint can serve `generate` calls with.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderKind {
    Gemini,
    Openai,
    Claude,
    Ollama,
}

/// LLM provider, dispatched to the Gemini, OpenAI-compatible or Claude backend.
#[derive(Debug, Clone)]
pub enum Provider {
    Gemini(gemini::GeminiConfig),
    OpenAi(openai::OpenAiConfig),
    Claude(claude::ClaudeConfig),
    Ollama(openai::OpenAiConfig),
}

impl Provider {
    pub fn gemini(api_key: String) -> Self {
        Provider::Gemini(gemini::GeminiConfig {
            api_key,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        })
    }

    pub fn openai(api_key: String) -> Self {
        Provider::OpenAi(openai::OpenAiConfig {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
        })
    }

    pub fn claude(api_key: String) -> Self {
        Provider::Claude(claude::ClaudeConfig {
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
        })
    }

    pub fn ollama(host: String) -> Self {
        Provider::Ollama(openai::OpenAiConfig {
            api_key: String::new(),
            base_url: format!("{}/v1", host.trim_end_matches('/')),
        })
    }

    /// Build a provider from configuration. `base_url` overrides the
    /// provider default; for ollama it is the host.
    pub fn from_kind(kind: ProviderKind, api_key: String, base_url: Option<String>) -> Self {
        match kind {
            ProviderKind::Gemini => {
                let mut provider = Self::gemini(api_key);
                if let (Provider::Gemini(config), Some(url)) = (&mut provider, base_url) {
                    config.base_url = url;
                }
                provider
            }
            ProviderKind::Openai => {
                let mut provider = Self::openai(api_key);
                if let (Provider::OpenAi(config), Some(url)) = (&mut provider, base_url) {
                    config.base_url = url;
                }
                provider
            }
            ProviderKind::Claude => {
                let mut provider = Self::claude(api_key);
                if let (Provider::Claude(config), Some(url)) = (&mut provider, base_url) {
                    config.base_url = url;
                }
                provider
            }
            ProviderKind::Ollama => {
                Self::ollama(base_url.unwrap_or_else(|| "http://localhost:11434".to_string()))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini(_) => "gemini",
            Provider::OpenAi(_) => "openai",
            Provider::Claude(_) => "claude",
            Provider::Ollama(_) => "ollama",
        }
    }
}

/// Process-wide model client: one pooled HTTP client plus the provider it talks to.
pub struct LlmClient {
    http: Client,
    provider: Provider,
}

impl LlmClient {
    pub fn new(provider: Provider, timeout: Duration) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, provider })
    }
}

#[async_trait]
impl InferenceBackend for LlmClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, LlmError> {
        tracing::debug!(
            provider = self.provider.name(),
            model = %request.model,
            prompt_len = request.prompt.len(),
            "inference call"
        );
        match &self.provider {
            Provider::Gemini(config) => gemini::generate(&self.http, config, request).await,
            Provider::OpenAi(config) | Provider::Ollama(config) => {
                openai::generate(&self.http, config, request).await
            }
            Provider::Claude(config) => claude::generate(&self.http, config, request).await,
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let provider = self.provider.name();
        match &self.provider {
            Provider::Gemini(config) => gemini::list_models(&self.http, config).await,
            Provider::OpenAi(config) | Provider::Ollama(config) => {
                openai::list_models(&self.http, config, provider).await
            }
            Provider::Claude(config) => claude::list_models(&self.http, config).await,
        }
    }
}

/// Turn a non-2xx reply into `LlmError::Api` carrying the provider's body.
async fn error_for_status(resp: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}
