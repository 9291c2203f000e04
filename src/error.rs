use crate::auth::AuthError;
use crate::db::StoreError;
use crate::doc_processor::ExtractError;
use crate::llm::LlmError;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("prompt injection detected")]
    InjectionDetected,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    JsonBody(#[from] JsonRejection),
    #[error(transparent)]
    MultipartRejected(#[from] MultipartRejection),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(AuthError::BadCredentials)
            | AppError::InjectionDetected
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::Hash(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::JsonBody(e) => e.status(),
            AppError::MultipartRejected(e) => e.status(),
            AppError::Multipart(e) => e.status(),
            AppError::Llm(_) => StatusCode::BAD_GATEWAY,
            AppError::Extract(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Auth(AuthError::BadCredentials) => {
                "Incorrect username or password".to_string()
            }
            AppError::Auth(AuthError::Hash(_)) => "Internal server error".to_string(),
            AppError::Auth(_) => "Could not validate credentials".to_string(),
            AppError::InjectionDetected => "Malicious input detected.".to_string(),
            AppError::BadRequest(message) => message.clone(),
            AppError::JsonBody(e) => e.body_text(),
            AppError::MultipartRejected(e) => e.body_text(),
            AppError::Multipart(e) => e.body_text(),
            AppError::Extract(_) => "Failed to extract text from the document".to_string(),
            AppError::Llm(_) => "The inference provider request failed".to_string(),
            AppError::Store(_) | AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

/// Run a synchronous call (SQLite, PDF parsing, password hashing) on the
/// blocking pool.
pub async fn run_blocking<T, E, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    AppError: From<E>,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))?
        .map_err(AppError::from)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({ "detail": self.detail() }));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
