use crate::llm::ProviderKind;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const MIN_SECRET_LEN: usize = 32;

/// Secrets that have shipped as defaults or examples and must never sign tokens.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "fallback-key-for-dev",
    "your-secret-key-for-teatimeninja",
    "changeme",
    "secret",
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET_KEY is a known placeholder value")]
    PlaceholderSecret,
    #[error("JWT_SECRET_KEY must be at least 32 bytes")]
    ShortSecret,
    #[error("an API key is required for the {0} provider (set LLM_API_KEY)")]
    MissingApiKey(&'static str),
    #[error("TOKEN_TTL_MINUTES must be positive")]
    BadTokenTtl,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "contract-sentinel")]
#[command(about = "Contract risk analysis service with a prompt-injection guard")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "database.db")]
    pub database: PathBuf,

    /// Token signing secret
    #[arg(long, env = "JWT_SECRET_KEY", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "TOKEN_TTL_MINUTES", default_value_t = 30)]
    pub token_ttl_minutes: i64,

    #[arg(long, env = "LOGIN_USERNAME", default_value = "ryoma")]
    pub login_username: String,

    #[arg(long, env = "LOGIN_PASSWORD", default_value = "teatime", hide_env_values = true)]
    pub login_password: String,

    #[arg(long, env = "LLM_PROVIDER", value_enum, default_value_t = ProviderKind::Gemini)]
    pub provider: ProviderKind,

    /// Provider API key; for gemini GOOGLE_API_KEY is used when this is empty
    #[arg(long, env = "LLM_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Override the provider endpoint (the host for ollama)
    #[arg(long, env = "LLM_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, env = "ANALYSIS_MODEL", default_value = "gemini-2.5-flash")]
    pub analysis_model: String,

    #[arg(long, env = "GUARD_MODEL", default_value = "gemini-2.5-flash")]
    pub guard_model: String,

    #[arg(long, env = "CHAT_MODEL", default_value = "gemini-2.5-flash")]
    pub chat_model: String,

    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 120)]
    pub llm_timeout_secs: u64,

    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 20 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Require a bearer token on /analyze, /chat and /history
    #[arg(long, env = "REQUIRE_AUTH")]
    pub require_auth: bool,

    /// Run the injection guard over chat messages too
    #[arg(long, env = "CHAT_GUARD")]
    pub chat_guard: bool,
}

impl Config {
    /// Fill values that have a secondary source.
    pub fn with_fallbacks(mut self) -> Self {
        if self.api_key.is_empty() && self.provider == ProviderKind::Gemini {
            if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
                self.api_key = key;
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str()) {
            return Err(ConfigError::PlaceholderSecret);
        }
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::ShortSecret);
        }
        if self.token_ttl_minutes <= 0 {
            return Err(ConfigError::BadTokenTtl);
        }
        if self.api_key.is_empty() {
            match self.provider {
                ProviderKind::Gemini => return Err(ConfigError::MissingApiKey("gemini")),
                ProviderKind::Openai => return Err(ConfigError::MissingApiKey("openai")),
                ProviderKind::Claude => return Err(ConfigError::MissingApiKey("claude")),
                ProviderKind::Ollama => {}
            }
        }
        Ok(())
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}
