use crate::error::AppError;
use crate::llm::ModelInfo;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// Models the configured provider offers for content generation.
pub async fn list_models(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ModelInfo>>, AppError> {
    let models = state.backend.list_models().await?;
    tracing::debug!(count = models.len(), "listed provider models");
    Ok(Json(models))
}
