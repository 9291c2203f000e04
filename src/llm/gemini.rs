use super::{GenerateRequest, LlmError, ModelInfo, ResponseFormat};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModel {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

fn generation_config(format: &ResponseFormat) -> Option<GenerationConfig> {
    match format {
        ResponseFormat::Text => None,
        ResponseFormat::Json => Some(GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: None,
        }),
        ResponseFormat::Enum(values) => Some(GenerationConfig {
            response_mime_type: "text/x.enum".to_string(),
            response_schema: Some(json!({ "type": "STRING", "enum": values })),
        }),
    }
}

fn build_request(request: &GenerateRequest) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart {
                text: Some(request.prompt.clone()),
            }],
        }],
        generation_config: generation_config(&request.format),
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(data: GeminiResponse) -> Result<String, LlmError> {
    let text: String = data
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(LlmError::Parse(
            "Gemini response contained no text".to_string(),
        ));
    }
    Ok(text)
}

pub async fn generate(
    client: &Client,
    config: &GeminiConfig,
    request: &GenerateRequest,
) -> Result<String, LlmError> {
    let body = build_request(request);

    let resp = client
        .post(format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            request.model
        ))
        .header("Content-Type", "application/json")
        .header("x-goog-api-key", &config.api_key)
        .json(&body)
        .send()
        .await?;
    let resp = super::error_for_status(resp).await?;

    let data: GeminiResponse = resp.json().await?;
    response_text(data)
}

/// Keep models that accept `generateContent`, with the `models/` prefix
/// dropped so the id can be used directly as a model setting.
fn content_models(list: GeminiModelList) -> Vec<ModelInfo> {
    list.models
        .into_iter()
        .filter(|m| {
            m.supported_generation_methods
                .iter()
                .any(|method| method == "generateContent")
        })
        .map(|m| {
            let id = m.name.strip_prefix("models/").unwrap_or(&m.name).to_string();
            ModelInfo {
                name: m.display_name.unwrap_or_else(|| id.clone()),
                id,
                provider: "gemini".into(),
            }
        })
        .collect()
}

pub async fn list_models(client: &Client, config: &GeminiConfig) -> Result<Vec<ModelInfo>, LlmError> {
    let url = format!("{}/v1beta/models", config.base_url.trim_end_matches('/'));
    let mut models = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut req = client
            .get(&url)
            .header("x-goog-api-key", &config.api_key)
            .query(&[("pageSize", "1000")]);
        if let Some(token) = &page_token {
            req = req.query(&[("pageToken", token.as_str())]);
        }
        let resp = super::error_for_status(req.send().await?).await?;
        let mut list: GeminiModelList = resp.json().await?;
        page_token = list.next_page_token.take().filter(|t| !t.is_empty());
        models.extend(content_models(list));
        if page_token.is_none() {
            break;
        }
    }

    Ok(models)
}
