//! Generator that writes predictable replies.

use brain_core::{
    async_trait, BrainError, HistoryMessage, PromptContext, ReplyGenerator,
};
use tokio::sync::Mutex;

/// Replies with `"[<target state>] <directive>"` and records every prompt it
/// was given.
#[derive(Debug, Default)]
pub struct TemplateGenerator {
    prompts: Mutex<Vec<PromptContext>>,
}

impl TemplateGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every context passed to [`ReplyGenerator::generate`], in call order.
    pub async fn prompts(&self) -> Vec<PromptContext> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl ReplyGenerator for TemplateGenerator {
    async fn generate(&self, context: &PromptContext) -> Result<String, BrainError> {
        self.prompts.lock().await.push(context.clone());
        Ok(format!("[{}] {}", context.target_state, context.directive))
    }

    async fn summarize(&self, history: &[HistoryMessage]) -> Result<String, BrainError> {
        Ok(format!("Conversation of {} messages", history.len()))
    }

    fn name(&self) -> &str {
        "TemplateGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_records_prompt() {
        let generator = TemplateGenerator::new();
        let context = PromptContext {
            target_state: "CLOSING".to_string(),
            directive: "Close the sale.".to_string(),
            ..Default::default()
        };

        let reply = generator.generate(&context).await.unwrap();
        assert_eq!(reply, "[CLOSING] Close the sale.");
        assert_eq!(generator.prompts().await.len(), 1);

        let summary = generator
            .summarize(&[HistoryMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(summary, "Conversation of 1 messages");
    }
}
