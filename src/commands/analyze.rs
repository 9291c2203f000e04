use crate::error::AppError;
use crate::pipeline::{AnalysisRequest, GuardedPipeline};
use crate::state::AppState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
}

/// Pull the `file` field out of the upload; other fields are ignored.
async fn read_upload(multipart: &mut Multipart) -> Result<AnalysisRequest, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let raw_bytes = field.bytes().await?.to_vec();
        return Ok(AnalysisRequest {
            raw_bytes,
            filename,
        });
    }
    Err(AppError::BadRequest("Field 'file' is required".to_string()))
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut multipart = multipart?;
    let request = read_upload(&mut multipart).await?;
    tracing::info!(
        filename = %request.filename,
        size = request.raw_bytes.len(),
        "analysis requested"
    );

    let pipeline = GuardedPipeline {
        backend: state.backend.as_ref(),
        store: state.db.clone(),
        guard_model: &state.models.guard,
        analysis_model: &state.models.analysis,
    };
    let outcome = pipeline.run(request).await?;

    Ok(Json(AnalyzeResponse {
        analysis: outcome.analysis,
    }))
}
