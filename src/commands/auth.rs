use crate::auth::AuthError;
use crate::error::{run_blocking, AppError};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(LoginRequest { username, password }) = payload?;
    let credentials = state.credentials.clone();
    let candidate = username.clone();
    let checked = run_blocking(move || credentials.check(&candidate, &password)).await;
    if let Err(e) = checked {
        tracing::info!(username = %username, "login rejected");
        return Err(e);
    }
    let access_token = state.tokens.issue(&username);
    tracing::info!(username = %username, "login succeeded");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Rejects requests without a valid bearer token when auth is enabled.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.require_auth {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::Malformed)?;
    let claims = state.tokens.verify(token.trim())?;
    tracing::debug!(sub = %claims.sub, "bearer accepted");

    Ok(next.run(request).await)
}
