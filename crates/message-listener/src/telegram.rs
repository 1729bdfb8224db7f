//! Telegram implementations of the engine's outbound seams.

use async_trait::async_trait;
use orchestrator::{
    format_money, AlertPayload, AlertReason, ChoiceOption, MediaAsset, MessageSender,
    OperatorNotifier, OrchestratorError,
};
use telegram_client::{parse_chat_id, ChatAction, TelegramClient, TelegramError};
use tracing::{debug, info};

fn delivery(e: TelegramError) -> OrchestratorError {
    OrchestratorError::Delivery(e.to_string())
}

fn chat(recipient: &str) -> Result<i64, OrchestratorError> {
    parse_chat_id(recipient).map_err(delivery)
}

/// Sends customer replies through the Bot API.
#[derive(Debug, Clone)]
pub struct TelegramSender {
    client: TelegramClient,
}

impl TelegramSender {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageSender for TelegramSender {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), OrchestratorError> {
        self.client
            .send_text(chat(recipient)?, text)
            .await
            .map_err(delivery)?;
        debug!("Sent text to {}", recipient);
        Ok(())
    }

    async fn send_choices(
        &self,
        recipient: &str,
        text: &str,
        choices: &[ChoiceOption],
    ) -> Result<(), OrchestratorError> {
        let buttons: Vec<(String, String)> = choices
            .iter()
            .map(|c| (c.label.clone(), c.id.clone()))
            .collect();
        self.client
            .send_with_choices(chat(recipient)?, text, &buttons)
            .await
            .map_err(delivery)?;
        debug!("Sent {} choices to {}", choices.len(), recipient);
        Ok(())
    }

    async fn send_media(
        &self,
        recipient: &str,
        media: &MediaAsset,
    ) -> Result<(), OrchestratorError> {
        let chat_id = chat(recipient)?;
        // Best effort; the upload itself is what matters.
        let _ = self
            .client
            .send_chat_action(chat_id, ChatAction::UploadVideo)
            .await;
        self.client
            .send_video(chat_id, &media.file_id, media.caption.as_deref())
            .await
            .map_err(delivery)?;
        Ok(())
    }

    async fn set_typing(&self, recipient: &str, started: bool) -> Result<(), OrchestratorError> {
        // Telegram clears the indicator on the next message; there is no stop call.
        if !started {
            return Ok(());
        }
        self.client
            .send_chat_action(chat(recipient)?, ChatAction::Typing)
            .await
            .map_err(delivery)
    }
}

/// Delivers operator alerts as a Telegram message to one chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: TelegramClient,
    operator_chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient, operator_chat_id: i64) -> Self {
        Self {
            client,
            operator_chat_id,
        }
    }
}

#[async_trait]
impl OperatorNotifier for TelegramNotifier {
    async fn notify(&self, alert: &AlertPayload) -> Result<(), OrchestratorError> {
        self.client
            .send_text(self.operator_chat_id, &format_alert(alert))
            .await
            .map_err(delivery)?;
        info!(
            customer_id = %alert.customer_id,
            reason = %alert.reason,
            "Operator alert delivered"
        );
        Ok(())
    }
}

/// Render an alert as plain text for the operator.
pub fn format_alert(alert: &AlertPayload) -> String {
    let (title, action) = match alert.reason {
        AlertReason::ReadyToClose => (
            "✅ CUSTOMER READY TO CLOSE ✅",
            "Recommended action: contact the customer IMMEDIATELY to finalize the contract.",
        ),
        AlertReason::HotLead => (
            "🔥 HOT LEAD ALERT 🔥",
            "Recommended action: get in touch with the customer.",
        ),
    };

    let farm = alert.farm_name.as_deref().unwrap_or("N/A");
    let location = alert.location.as_deref().unwrap_or("N/A");
    let tags = if alert.tags.is_empty() {
        "none".to_string()
    } else {
        alert.tags.iter().cloned().collect::<Vec<_>>().join(", ")
    };

    let mut lines = vec![
        title.to_string(),
        String::new(),
        format!("👤 Customer: {} (ID: {})", alert.name, alert.customer_id),
        format!("🏡 Property: {} in {}", farm, location),
        format!("⭐ Score: {}", alert.score),
        format!("🎯 Tags: {}", tags),
        format!(
            "😟 Main pain: {}",
            alert.pain_point.as_deref().unwrap_or("not stated")
        ),
        format!("📍 Stage: {}", alert.state),
    ];
    if alert.quote_total > 0.0 {
        lines.push(format!("💰 Quote: {}", format_money(alert.quote_total)));
    }
    if let Some(ref summary) = alert.summary {
        lines.push(String::new());
        lines.push(format!("📝 {}", summary));
    }
    lines.push(String::new());
    lines.push(action.to_string());

    lines.join("\n")
}
