use super::{GenerateRequest, LlmError, ModelInfo, ResponseFormat};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiModelList {
    #[serde(default)]
    data: Vec<OpenAiModel>,
}

#[derive(Deserialize)]
struct OpenAiModel {
    id: String,
}

#[derive(Deserialize)]
struct VerdictEnvelope {
    verdict: String,
}

// `json_object` mode only admits a top-level object, so the array contract of
// a Json request is carried by the prompt alone.
fn response_format(format: &ResponseFormat) -> Option<serde_json::Value> {
    match format {
        ResponseFormat::Text | ResponseFormat::Json => None,
        ResponseFormat::Enum(values) => Some(json!({
            "type": "json_schema",
            "json_schema": {
                "name": "verdict",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": { "verdict": { "type": "string", "enum": values } },
                    "required": ["verdict"],
                    "additionalProperties": false
                }
            }
        })),
    }
}

fn build_request(request: &GenerateRequest) -> OpenAiRequest {
    OpenAiRequest {
        model: request.model.clone(),
        messages: vec![OpenAiMessage {
            role: "user".to_string(),
            content: Some(request.prompt.clone()),
        }],
        stream: false,
        response_format: response_format(&request.format),
    }
}

/// Enum replies arrive wrapped in `{"verdict": ...}`; unwrap to the bare value.
fn unwrap_verdict(content: String) -> String {
    match serde_json::from_str::<VerdictEnvelope>(&content) {
        Ok(envelope) => envelope.verdict,
        Err(_) => content,
    }
}

pub async fn generate(
    client: &Client,
    config: &OpenAiConfig,
    request: &GenerateRequest,
) -> Result<String, LlmError> {
    let body = build_request(request);

    let mut req = client
        .post(format!("{}/chat/completions", config.base_url))
        .header("Content-Type", "application/json")
        .json(&body);

    if !config.api_key.is_empty() {
        req = req.header("Authorization", format!("Bearer {}", config.api_key));
    }

    let resp = super::error_for_status(req.send().await?).await?;

    let data: OpenAiResponse = resp.json().await?;
    let content = data
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::Parse("completion contained no message content".to_string()))?;

    Ok(match request.format {
        ResponseFormat::Enum(_) => unwrap_verdict(content),
        _ => content,
    })
}

fn models_from_list(list: OpenAiModelList, provider: &str) -> Vec<ModelInfo> {
    list.data
        .into_iter()
        .map(|m| ModelInfo {
            name: m.id.clone(),
            id: m.id,
            provider: provider.to_string(),
        })
        .collect()
}

/// `GET /models`; Ollama serves the same listing under its `/v1` prefix.
pub async fn list_models(
    client: &Client,
    config: &OpenAiConfig,
    provider: &str,
) -> Result<Vec<ModelInfo>, LlmError> {
    let mut req = client.get(format!("{}/models", config.base_url));
    if !config.api_key.is_empty() {
        req = req.header("Authorization", format!("Bearer {}", config.api_key));
    }
    let resp = super::error_for_status(req.send().await?).await?;
    let list: OpenAiModelList = resp.json().await?;
    Ok(models_from_list(list, provider))
}
