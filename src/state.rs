use crate::auth::{Credentials, TokenIssuer};
use crate::config::Config;
use crate::db::Database;
use crate::llm::{InferenceBackend, LlmClient, Provider};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ModelSet {
    pub guard: String,
    pub analysis: String,
    pub chat: String,
}

/// Everything a handler needs, built once at startup and shared by `Arc`.
pub struct AppState {
    pub backend: Arc<dyn InferenceBackend>,
    pub db: Arc<Database>,
    pub tokens: TokenIssuer,
    pub credentials: Credentials,
    pub models: ModelSet,
    pub require_auth: bool,
    pub chat_guard: bool,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Arc<Self>> {
        let credentials = Credentials::new(&config.login_username, &config.login_password)?;
        let db = Database::open(&config.database)?;
        let user = db.ensure_user(&credentials.username, &credentials.password_hash)?;
        tracing::info!(
            path = %config.database.display(),
            user_id = user.id,
            "database ready"
        );

        let provider = Provider::from_kind(
            config.provider,
            config.api_key.clone(),
            config.base_url.clone(),
        );
        tracing::info!(provider = provider.name(), "inference provider configured");
        let client = LlmClient::new(provider, config.llm_timeout())?;

        Ok(Arc::new(Self {
            backend: Arc::new(client),
            db: Arc::new(db),
            tokens: TokenIssuer::new(&config.jwt_secret, config.token_ttl_minutes),
            credentials,
            models: ModelSet {
                guard: config.guard_model.clone(),
                analysis: config.analysis_model.clone(),
                chat: config.chat_model.clone(),
            },
            require_auth: config.require_auth,
            chat_guard: config.chat_guard,
        }))
    }
}
