use crate::llm::{GenerateRequest, InferenceBackend, LlmError};
use crate::prompts::analysis_prompt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskRank {
    High,
    Medium,
    Low,
}

impl RiskRank {
    pub const ALL: [RiskRank; 3] = [RiskRank::High, RiskRank::Medium, RiskRank::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskRank::High => "HIGH",
            RiskRank::Medium => "MEDIUM",
            RiskRank::Low => "LOW",
        }
    }
}

/// One risk finding, the element type of the analysis JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskItem {
    pub rank: RiskRank,
    pub title: String,
    pub description: String,
    pub action: String,
}

/// Remove Markdown code-fence markers and trim the result.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Request the risk analysis of already-guarded text.
///
/// The reply is returned fence-stripped but otherwise as produced. A reply
/// that does not match the `RiskItem` schema is logged and still returned.
pub async fn analyze(
    backend: &dyn InferenceBackend,
    model: &str,
    text: &str,
) -> Result<String, LlmError> {
    let ranks: Vec<&str> = RiskRank::ALL.iter().map(|r| r.as_str()).collect();
    let request = GenerateRequest::json(model, analysis_prompt(text, &ranks));
    let raw = backend.generate(&request).await?;
    let analysis = strip_code_fences(&raw);
    match risk_items(&analysis) {
        Some(items) => tracing::debug!(items = items.len(), "analysis reply matches schema"),
        None => tracing::warn!(reply_len = analysis.len(), "analysis reply does not match schema"),
    }
    Ok(analysis)
}

/// Parse an analysis reply as risk items, if it has that shape.
pub fn risk_items(analysis: &str) -> Option<Vec<RiskItem>> {
    serde_json::from_str(analysis).ok()
}
