//! Conversation history entries and the sliding-window helpers.

use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in a customer's conversation history.
pub const MAX_HISTORY_MESSAGES: usize = 30;

/// Who authored a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single message in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

impl HistoryMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append `entries` to `history`, dropping the oldest entries beyond `max`.
pub fn push_bounded(
    history: &mut Vec<HistoryMessage>,
    entries: impl IntoIterator<Item = HistoryMessage>,
    max: usize,
) {
    history.extend(entries);
    if history.len() > max {
        let to_remove = history.len() - max;
        history.drain(0..to_remove);
    }
}

/// The last `n` entries of `history`, oldest first.
pub fn recent(history: &[HistoryMessage], n: usize) -> &[HistoryMessage] {
    let start = history.len().saturating_sub(n);
    &history[start..]
}
