//! Message sender trait and implementations.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::OrchestratorError;

/// One button of a fixed choice menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    /// Identifier returned when the option is picked.
    pub id: String,
    /// Text shown to the customer.
    pub label: String,
}

impl ChoiceOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A media asset already uploaded to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub file_id: String,
    pub caption: Option<String>,
}

/// Trait for sending messages to customers and the operator.
///
/// Abstracted to support different transports (Telegram, tests, etc.)
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a text message.
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), OrchestratorError>;

    /// Send a text message with a fixed set of choices.
    ///
    /// Default implementation lists the options below the text.
    async fn send_choices(
        &self,
        recipient: &str,
        text: &str,
        choices: &[ChoiceOption],
    ) -> Result<(), OrchestratorError> {
        let mut body = text.to_string();
        for (i, choice) in choices.iter().enumerate() {
            body.push_str(&format!("\n{}. {}", i + 1, choice.label));
        }
        self.send_text(recipient, &body).await
    }

    /// Send a media asset.
    async fn send_media(&self, recipient: &str, media: &MediaAsset)
        -> Result<(), OrchestratorError>;

    /// Set typing indicator state.
    async fn set_typing(&self, recipient: &str, started: bool) -> Result<(), OrchestratorError>;
}

/// A no-op message sender for testing that discards all messages.
#[derive(Debug, Clone, Default)]
pub struct NoOpSender;

#[async_trait]
impl MessageSender for NoOpSender {
    async fn send_text(&self, _recipient: &str, _text: &str) -> Result<(), OrchestratorError> {
        Ok(())
    }

    async fn send_media(
        &self,
        _recipient: &str,
        _media: &MediaAsset,
    ) -> Result<(), OrchestratorError> {
        Ok(())
    }

    async fn set_typing(&self, _recipient: &str, _started: bool) -> Result<(), OrchestratorError> {
        Ok(())
    }
}

/// A logging message sender for debugging that logs all operations.
#[derive(Debug, Clone, Default)]
pub struct LoggingSender;

#[async_trait]
impl MessageSender for LoggingSender {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), OrchestratorError> {
        tracing::info!("Sending message to {}: {}", recipient, text);
        Ok(())
    }

    async fn send_media(
        &self,
        recipient: &str,
        media: &MediaAsset,
    ) -> Result<(), OrchestratorError> {
        tracing::info!("Sending media {} to {}", media.file_id, recipient);
        Ok(())
    }

    async fn set_typing(&self, recipient: &str, started: bool) -> Result<(), OrchestratorError> {
        let state = if started { "started" } else { "stopped" };
        tracing::debug!("Typing {} for {}", state, recipient);
        Ok(())
    }
}

/// Something a [`RecordingSender`] delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        recipient: String,
        text: String,
    },
    Choices {
        recipient: String,
        text: String,
        choices: Vec<ChoiceOption>,
    },
    Media {
        recipient: String,
        file_id: String,
    },
}

impl Sent {
    pub fn recipient(&self) -> &str {
        match self {
            Sent::Text { recipient, .. }
            | Sent::Choices { recipient, .. }
            | Sent::Media { recipient, .. } => recipient,
        }
    }

    /// Text body, `None` for media.
    pub fn text(&self) -> Option<&str> {
        match self {
            Sent::Text { text, .. } | Sent::Choices { text, .. } => Some(text),
            Sent::Media { .. } => None,
        }
    }
}

/// Sender that keeps everything it delivers, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<bool>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following delivery fail (or succeed again).
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.lock().await = failing;
    }

    pub async fn sent(&self) -> Vec<Sent> {
        self.sent.lock().await.clone()
    }

    /// Everything delivered to `recipient`.
    pub async fn sent_to(&self, recipient: &str) -> Vec<Sent> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|s| s.recipient() == recipient)
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }

    async fn record(&self, item: Sent) -> Result<(), OrchestratorError> {
        if *self.failing.lock().await {
            return Err(OrchestratorError::Delivery(format!(
                "delivery to {} refused",
                item.recipient()
            )));
        }
        self.sent.lock().await.push(item);
        Ok(())
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), OrchestratorError> {
        self.record(Sent::Text {
            recipient: recipient.to_string(),
            text: text.to_string(),
        })
        .await
    }

    async fn send_choices(
        &self,
        recipient: &str,
        text: &str,
        choices: &[ChoiceOption],
    ) -> Result<(), OrchestratorError> {
        self.record(Sent::Choices {
            recipient: recipient.to_string(),
            text: text.to_string(),
            choices: choices.to_vec(),
        })
        .await
    }

    async fn send_media(
        &self,
        recipient: &str,
        media: &MediaAsset,
    ) -> Result<(), OrchestratorError> {
        self.record(Sent::Media {
            recipient: recipient.to_string(),
            file_id: media.file_id.clone(),
        })
        .await
    }

    async fn set_typing(&self, _recipient: &str, _started: bool) -> Result<(), OrchestratorError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sender() {
        let sender = NoOpSender;

        // Should not error
        sender.send_text("42", "test").await.unwrap();
        sender.set_typing("42", true).await.unwrap();
    }

    #[tokio::test]
    async fn test_default_choices_rendering() {
        struct Capture(Mutex<String>);

        #[async_trait]
        impl MessageSender for Capture {
            async fn send_text(&self, _r: &str, text: &str) -> Result<(), OrchestratorError> {
                *self.0.lock().await = text.to_string();
                Ok(())
            }
            async fn send_media(&self, _r: &str, _m: &MediaAsset) -> Result<(), OrchestratorError> {
                Ok(())
            }
            async fn set_typing(&self, _r: &str, _s: bool) -> Result<(), OrchestratorError> {
                Ok(())
            }
        }

        let sender = Capture(Mutex::new(String::new()));
        let choices = [ChoiceOption::new("a", "Alpha"), ChoiceOption::new("b", "Beta")];
        sender.send_choices("42", "Pick one", &choices).await.unwrap();

        assert_eq!(*sender.0.lock().await, "Pick one\n1. Alpha\n2. Beta");
    }

    #[tokio::test]
    async fn test_recording_sender() {
        let sender = RecordingSender::new();
        sender.send_text("42", "hello").await.unwrap();
        sender
            .send_media(
                "7",
                &MediaAsset {
                    file_id: "vid".into(),
                    caption: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(sender.sent().await.len(), 2);
        assert_eq!(sender.sent_to("42").await[0].text(), Some("hello"));

        sender.set_failing(true).await;
        assert!(matches!(
            sender.send_text("42", "again").await,
            Err(OrchestratorError::Delivery(_))
        ));
        assert_eq!(sender.sent().await.len(), 2);
    }
}
