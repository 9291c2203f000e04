use crate::llm::{GenerateRequest, InferenceBackend, LlmError};
use crate::prompts::chat_prompt;
use serde::{Deserialize, Serialize};

/// A finding the caller wants the answer grounded in. Any `rank` the caller
/// sends is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    pub title: String,
    pub description: String,
    pub action: String,
}

pub fn context_text(items: &[ContextItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "- Item: {}\n Risk: {}\n Action: {}",
                item.title, item.description, item.action
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-turn answer over a caller-supplied analysis. The reply is returned verbatim.
pub async fn respond(
    backend: &dyn InferenceBackend,
    model: &str,
    context: &[ContextItem],
    message: &str,
) -> Result<String, LlmError> {
    let prompt = chat_prompt(&context_text(context), message);
    let request = GenerateRequest::text(model, prompt);
    backend.generate(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::CHAT_FEW_SHOT;
    use crate::test_support::MockBackend;

    fn item(title: &str) -> ContextItem {
        ContextItem {
            title: title.into(),
            description: format!("{} description", title),
            action: format!("{} action", title),
        }
    }

    #[test]
    fn test_context_text_is_deterministic() {
        let text = context_text(&[item("Auto renewal"), item("Liability")]);
        assert_eq!(
            text,
            "- Item: Auto renewal\n Risk: Auto renewal description\n Action: Auto renewal action\n\
             - Item: Liability\n Risk: Liability description\n Action: Liability action"
        );
    }

    #[tokio::test]
    async fn test_empty_context_still_sends_examples_and_message() {
        let backend = MockBackend::new().reply_chat("  raw reply \n");
        let reply = respond(&backend, "chat-model", &[], "Can I cancel early?")
            .await
            .unwrap();
        assert_eq!(reply, "  raw reply \n");

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.contains(CHAT_FEW_SHOT));
        assert!(calls[0].prompt.contains("Example 1"));
        assert!(calls[0].prompt.contains("Example 2"));
        assert!(calls[0].prompt.contains("Can I cancel early?"));
        assert_eq!(backend.chat_calls(), 1);
        assert_eq!(backend.guard_calls(), 0);
    }

    #[test]
    fn test_context_item_accepts_any_rank() {
        for raw in [
            r#"{"title":"t","description":"d","action":"a"}"#,
            r#"{"rank":"高","title":"t","description":"d","action":"a"}"#,
        ] {
            let parsed: ContextItem = serde_json::from_str(raw).unwrap();
            assert_eq!(context_text(&[parsed]), "- Item: t\n Risk: d\n Action: a");
        }
    }
}
