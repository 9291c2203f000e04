//! Guarded two-pass analysis: extract, judge, analyze, persist.
//!
//! Every stage runs strictly after the previous one and any failure ends the
//! request. Nothing is written before the final stage, so an aborted request
//! leaves no trace in the store.

use crate::analyzer;
use crate::db::models::{AnalysisHistory, NewAnalysisHistory};
use crate::db::HistoryStore;
use crate::doc_processor;
use crate::error::{run_blocking, AppError};
use crate::guard::{self, GuardVerdict};
use crate::llm::InferenceBackend;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// Owner recorded on every history row until sessions are bound to users.
pub const PLACEHOLDER_USER_ID: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Extracted,
    GuardPending,
    GuardRejected,
    GuardPassed,
    Analyzed,
    Persisted,
}

impl Stage {
    pub fn can_advance_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Received, Stage::Extracted)
                | (Stage::Extracted, Stage::GuardPending)
                | (Stage::GuardPending, Stage::GuardRejected)
                | (Stage::GuardPending, Stage::GuardPassed)
                | (Stage::GuardPassed, Stage::Analyzed)
                | (Stage::Analyzed, Stage::Persisted)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::GuardRejected | Stage::Persisted)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Extracted => "extracted",
            Stage::GuardPending => "guard_pending",
            Stage::GuardRejected => "guard_rejected",
            Stage::GuardPassed => "guard_passed",
            Stage::Analyzed => "analyzed",
            Stage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

struct Progress(Stage);

impl Progress {
    fn advance(&mut self, next: Stage) {
        debug_assert!(
            !self.0.is_terminal() && self.0.can_advance_to(next),
            "illegal transition {} -> {}",
            self.0,
            next
        );
        tracing::debug!(from = %self.0, to = %next, "pipeline stage");
        self.0 = next;
    }
}

pub struct AnalysisRequest {
    pub raw_bytes: Vec<u8>,
    pub filename: String,
}

#[derive(Debug)]
pub struct AnalysisOutcome {
    pub analysis: String,
    pub record: AnalysisHistory,
}

pub struct GuardedPipeline<'a> {
    pub backend: &'a dyn InferenceBackend,
    pub store: Arc<dyn HistoryStore>,
    pub guard_model: &'a str,
    pub analysis_model: &'a str,
}

impl GuardedPipeline<'_> {
    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AppError> {
        let span = tracing::info_span!(
            "analysis",
            request_id = %uuid::Uuid::new_v4(),
            filename = %request.filename
        );
        self.run_stages(request).instrument(span).await
    }

    async fn run_stages(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AppError> {
        let mut progress = Progress(Stage::Received);
        let AnalysisRequest {
            raw_bytes,
            filename,
        } = request;

        let name = filename.clone();
        let parsed = run_blocking(move || doc_processor::parse_bytes(&raw_bytes, &name)).await?;
        progress.advance(Stage::Extracted);
        tracing::info!(
            file_type = %parsed.file_type,
            text_len = parsed.content.len(),
            "document text extracted"
        );

        progress.advance(Stage::GuardPending);
        match guard::judge(self.backend, self.guard_model, &parsed.content).await? {
            GuardVerdict::Malicious => {
                progress.advance(Stage::GuardRejected);
                return Err(AppError::InjectionDetected);
            }
            GuardVerdict::Safe => progress.advance(Stage::GuardPassed),
        }

        let analysis = analyzer::analyze(self.backend, self.analysis_model, &parsed.content).await?;
        progress.advance(Stage::Analyzed);

        let store = self.store.clone();
        let result_json = analysis.clone();
        let record = run_blocking(move || {
            store.append(NewAnalysisHistory {
                user_id: PLACEHOLDER_USER_ID,
                filename: &filename,
                result_json: &result_json,
            })
        })
        .await?;
        progress.advance(Stage::Persisted);
        tracing::info!(history_id = record.id, "analysis stored");

        Ok(AnalysisOutcome { analysis, record })
    }
}
