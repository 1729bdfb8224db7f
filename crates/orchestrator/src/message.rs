//! Inbound message types.

use chrono::{DateTime, Utc};

/// What the customer sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// Free text.
    Text(String),
    /// A button from a fixed menu, identified by its option id.
    Choice { id: String },
}

impl MessageContent {
    /// The text to record and analyse; the option id for choices.
    pub fn as_text(&self) -> &str {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Choice { id } => id,
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, MessageContent::Choice { .. })
    }
}

/// A message from a customer (or the operator) to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Stable customer identifier (the chat id).
    pub customer_id: String,
    /// Display name from the transport, used when creating a record.
    pub display_name: Option<String>,
    pub content: MessageContent,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn text(customer_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            display_name: None,
            content: MessageContent::Text(text.into()),
            received_at: Utc::now(),
        }
    }

    pub fn choice(customer_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            display_name: None,
            content: MessageContent::Choice { id: id.into() },
            received_at: Utc::now(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }

    /// Free text, if this is a text message.
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Choice { .. } => None,
        }
    }
}
