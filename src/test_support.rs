use crate::llm::{GenerateRequest, InferenceBackend, LlmError, ModelInfo, ResponseFormat};
use async_trait::async_trait;
use std::sync::Mutex;

pub const SAMPLE_ANALYSIS: &str = r#"[{"rank":"HIGH","title":"Unlimited liability","description":"Damages are uncapped.","action":"Cap liability at twelve months of fees."}]"#;

const INJECTION_MARKERS: &[&str] = &[
    "ignore previous instructions",
    "ignore all previous",
    "forget your previous instructions",
];

enum Reply {
    Fixed(String),
    Fail,
}

/// Scripted backend that records every request. Guard calls answer by
/// scanning the judged text for injection phrases unless overridden.
pub struct MockBackend {
    calls: Mutex<Vec<GenerateRequest>>,
    guard: Option<Reply>,
    analysis: Reply,
    chat: Reply,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            guard: None,
            analysis: Reply::Fixed(SAMPLE_ANALYSIS.to_string()),
            chat: Reply::Fixed("Consider adding a liability cap.".to_string()),
        }
    }

    pub fn reply_guard(mut self, reply: &str) -> Self {
        self.guard = Some(Reply::Fixed(reply.to_string()));
        self
    }

    pub fn fail_guard(mut self) -> Self {
        self.guard = Some(Reply::Fail);
        self
    }

    pub fn reply_analysis(mut self, reply: &str) -> Self {
        self.analysis = Reply::Fixed(reply.to_string());
        self
    }

    pub fn fail_analysis(mut self) -> Self {
        self.analysis = Reply::Fail;
        self
    }

    pub fn reply_chat(mut self, reply: &str) -> Self {
        self.chat = Reply::Fixed(reply.to_string());
        self
    }

    pub fn calls(&self) -> Vec<GenerateRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, pred: impl Fn(&ResponseFormat) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(&c.format)).count()
    }

    pub fn guard_calls(&self) -> usize {
        self.count(|f| matches!(f, ResponseFormat::Enum(_)))
    }

    pub fn analysis_calls(&self) -> usize {
        self.count(|f| matches!(f, ResponseFormat::Json))
    }

    pub fn chat_calls(&self) -> usize {
        self.count(|f| matches!(f, ResponseFormat::Text))
    }
}

fn judged_text(prompt: &str) -> &str {
    prompt
        .rsplit_once("[Text under judgment]\n")
        .map(|(_, text)| text)
        .unwrap_or(prompt)
}

fn answer(reply: &Reply) -> Result<String, LlmError> {
    match reply {
        Reply::Fixed(text) => Ok(text.clone()),
        Reply::Fail => Err(LlmError::Api {
            status: 503,
            message: "backend unavailable".to_string(),
        }),
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(request.clone());
        match request.format {
            ResponseFormat::Enum(_) => match &self.guard {
                Some(reply) => answer(reply),
                None => {
                    let text = judged_text(&request.prompt).to_lowercase();
                    if INJECTION_MARKERS.iter().any(|m| text.contains(m)) {
                        Ok("MALICIOUS".to_string())
                    } else {
                        Ok("SAFE".to_string())
                    }
                }
            },
            ResponseFormat::Json => answer(&self.analysis),
            ResponseFormat::Text => answer(&self.chat),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        Ok(vec![ModelInfo {
            id: "gemini-2.5-flash".to_string(),
            name: "Gemini 2.5 Flash".to_string(),
            provider: "gemini".to_string(),
        }])
    }
}
