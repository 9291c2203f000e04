use crate::llm::{GenerateRequest, InferenceBackend, LlmError};
use crate::prompts::{guard_prompt, VERDICT_MALICIOUS, VERDICT_SAFE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    Safe,
    Malicious,
}

impl GuardVerdict {
    pub fn is_malicious(self) -> bool {
        self == GuardVerdict::Malicious
    }
}

/// Map the classifier reply onto a verdict. The reply is requested as an
/// enum, so anything but the two tokens (ignoring case, whitespace and
/// surrounding punctuation) is a provider fault.
pub fn parse_verdict(raw: &str) -> Result<GuardVerdict, LlmError> {
    let token = raw
        .trim()
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_uppercase();
    match token.as_str() {
        VERDICT_SAFE => Ok(GuardVerdict::Safe),
        VERDICT_MALICIOUS => Ok(GuardVerdict::Malicious),
        _ => Err(LlmError::Parse(format!(
            "unrecognized guard verdict: {:?}",
            raw
        ))),
    }
}

/// Classify `text` for prompt-injection intent with one inference call.
pub async fn judge(
    backend: &dyn InferenceBackend,
    model: &str,
    text: &str,
) -> Result<GuardVerdict, LlmError> {
    let request = GenerateRequest::one_of(
        model,
        guard_prompt(text),
        &[VERDICT_SAFE, VERDICT_MALICIOUS],
    );
    let raw = backend.generate(&request).await?;
    let verdict = parse_verdict(&raw)?;
    if verdict.is_malicious() {
        tracing::warn!(text_len = text.len(), "prompt injection detected");
    }
    Ok(verdict)
}
