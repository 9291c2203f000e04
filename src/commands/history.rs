use crate::db::models::AnalysisHistory;
use crate::db::HistoryStore;
use crate::error::{run_blocking, AppError};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

pub async fn list_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AnalysisHistory>>, AppError> {
    let db = state.db.clone();
    let rows = run_blocking(move || db.list()).await?;
    Ok(Json(rows))
}
