use super::{GenerateRequest, LlmError, ModelInfo, ResponseFormat};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ClaudeModelList {
    #[serde(default)]
    data: Vec<ClaudeModel>,
}

#[derive(Deserialize)]
struct ClaudeModel {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
}

// The Messages API has no output-format switch, so constraints travel as a
// system instruction.
fn system_instruction(format: &ResponseFormat) -> Option<String> {
    match format {
        ResponseFormat::Text => None,
        ResponseFormat::Json => Some("Respond with JSON only, without commentary.".to_string()),
        ResponseFormat::Enum(values) => Some(format!(
            "Respond with exactly one of the following words and nothing else: {}.",
            values.join(", ")
        )),
    }
}

fn build_request(request: &GenerateRequest) -> ClaudeRequest {
    ClaudeRequest {
        model: request.model.clone(),
        max_tokens: 4096,
        messages: vec![ClaudeMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        }],
        system: system_instruction(&request.format),
    }
}

pub async fn generate(
    client: &Client,
    config: &ClaudeConfig,
    request: &GenerateRequest,
) -> Result<String, LlmError> {
    let body = build_request(request);

    let resp = client
        .post(format!("{}/v1/messages", config.base_url))
        .header("Content-Type", "application/json")
        .header("x-api-key", &config.api_key)
        .header("anthropic-version", "2023-06-01")
        .json(&body)
        .send()
        .await?;
    let resp = super::error_for_status(resp).await?;

    let data: ClaudeResponse = resp.json().await?;
    let content: String = data.content.into_iter().filter_map(|c| c.text).collect();
    if content.is_empty() {
        return Err(LlmError::Parse("Claude response contained no text".to_string()));
    }
    Ok(content)
}

fn models_from_list(list: ClaudeModelList) -> Vec<ModelInfo> {
    list.data
        .into_iter()
        .map(|m| ModelInfo {
            name: m.display_name.unwrap_or_else(|| m.id.clone()),
            id: m.id,
            provider: "claude".into(),
        })
        .collect()
}

pub async fn list_models(client: &Client, config: &ClaudeConfig) -> Result<Vec<ModelInfo>, LlmError> {
    let resp = client
        .get(format!("{}/v1/models", config.base_url))
        .header("x-api-key", &config.api_key)
        .header("anthropic-version", "2023-06-01")
        .send()
        .await?;
    let resp = super::error_for_status(resp).await?;
    let list: ClaudeModelList = resp.json().await?;
    Ok(models_from_list(list))
}
