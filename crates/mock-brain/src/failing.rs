//! A brain whose every call fails.

use brain_core::{
    async_trait, BrainError, Classification, HistoryMessage, IntentClassifier, PromptContext,
    ReplyGenerator,
};

/// Fails every classification, generation and summary with
/// [`BrainError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct FailingBrain {
    reason: String,
}

impl FailingBrain {
    pub fn new() -> Self {
        Self::with_reason("backend offline")
    }

    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl IntentClassifier for FailingBrain {
    async fn classify(
        &self,
        _text: &str,
        _history: &[HistoryMessage],
    ) -> Result<Classification, BrainError> {
        Err(BrainError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "FailingBrain"
    }
}

#[async_trait]
impl ReplyGenerator for FailingBrain {
    async fn generate(&self, _context: &PromptContext) -> Result<String, BrainError> {
        Err(BrainError::Unavailable(self.reason.clone()))
    }

    async fn summarize(&self, _history: &[HistoryMessage]) -> Result<String, BrainError> {
        Err(BrainError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "FailingBrain"
    }
}
