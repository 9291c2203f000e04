use crate::error::AppError;
use crate::guard;
use crate::responder::{self, ContextItem};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub analysis_context: Vec<ContextItem>,
    pub user_message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, AppError> {
    let Json(request) = payload?;
    if state.chat_guard {
        let verdict =
            guard::judge(state.backend.as_ref(), &state.models.guard, &request.user_message)
                .await?;
        if verdict.is_malicious() {
            return Err(AppError::InjectionDetected);
        }
    }

    let response = responder::respond(
        state.backend.as_ref(),
        &state.models.chat,
        &request.analysis_context,
        &request.user_message,
    )
    .await?;

    Ok(Json(ChatReply { response }))
}
