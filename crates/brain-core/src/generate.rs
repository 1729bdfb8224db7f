//! Reply generation contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BrainError;
use crate::history::HistoryMessage;

/// The parts of a customer record a reply generator is allowed to see.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub name: String,
    pub farm_name: Option<String>,
    pub location: Option<String>,
    pub profile: String,
    pub pain_point: Option<String>,
    pub lead_score: i64,
    pub pivots: u32,
    pub pumps: u32,
    pub quote_total: f64,
}

/// Everything a generator needs to write the next reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptContext {
    /// Snapshot taken after the transition was committed.
    pub customer: CustomerSnapshot,
    /// State the conversation is moving into.
    pub target_state: String,
    /// Every tag accumulated for the customer.
    pub tags: Vec<String>,
    /// Tags detected in the current message.
    pub new_tags: Vec<String>,
    /// Trimmed conversation history, oldest first.
    pub history: Vec<HistoryMessage>,
    /// The message being answered.
    pub user_text: String,
    /// What the reply has to accomplish in this state.
    pub directive: String,
}

/// A backend that writes natural-language replies.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generate the reply text for `context`.
    async fn generate(&self, context: &PromptContext) -> Result<String, BrainError>;

    /// Summarize a conversation for a human operator.
    ///
    /// Default implementation reports the capability as unavailable.
    async fn summarize(&self, history: &[HistoryMessage]) -> Result<String, BrainError> {
        let _ = history;
        Err(BrainError::Unavailable(format!(
            "{} does not summarize conversations",
            self.name()
        )))
    }

    /// Get a human-readable name for this generator.
    fn name(&self) -> &str;
}
