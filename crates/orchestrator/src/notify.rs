//! Operator alert payloads and the notifier seam.

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use database::{ConversationState, Customer};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::OrchestratorError;

/// Why the operator is being alerted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    /// The customer said they want to buy.
    ReadyToClose,
    /// The lead score crossed the hot-lead threshold.
    HotLead,
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertReason::ReadyToClose => write!(f, "ready to close"),
            AlertReason::HotLead => write!(f, "hot lead"),
        }
    }
}

/// Structured alert; formatting is left to the notifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertPayload {
    pub customer_id: String,
    pub name: String,
    pub farm_name: Option<String>,
    pub location: Option<String>,
    pub reason: AlertReason,
    pub score: i64,
    pub tags: BTreeSet<String>,
    pub pain_point: Option<String>,
    pub quote_total: f64,
    /// Short generated summary of the conversation, when one was available.
    pub summary: Option<String>,
    pub state: ConversationState,
}

impl AlertPayload {
    pub fn from_customer(customer: &Customer, reason: AlertReason, summary: Option<String>) -> Self {
        Self {
            customer_id: customer.id.clone(),
            name: customer.name.clone(),
            farm_name: customer.farm_name.clone(),
            location: customer.location.clone(),
            reason,
            score: customer.lead_score,
            tags: customer.tags.clone(),
            pain_point: customer.pain_point.clone(),
            quote_total: customer.quote_total,
            summary,
            state: customer.state,
        }
    }
}

/// Side channel to a human operator.
#[async_trait]
pub trait OperatorNotifier: Send + Sync {
    /// Deliver one alert. `Ok` means delivery was confirmed.
    async fn notify(&self, alert: &AlertPayload) -> Result<(), OrchestratorError>;
}

/// Notifier that drops every alert.
#[derive(Debug, Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl OperatorNotifier for NoOpNotifier {
    async fn notify(&self, _alert: &AlertPayload) -> Result<(), OrchestratorError> {
        Ok(())
    }
}

/// Notifier that only logs.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl OperatorNotifier for LoggingNotifier {
    async fn notify(&self, alert: &AlertPayload) -> Result<(), OrchestratorError> {
        tracing::info!(
            customer = %alert.customer_id,
            score = alert.score,
            "Operator alert ({}): {}",
            alert.reason,
            alert.name
        );
        Ok(())
    }
}

/// Notifier that keeps delivered alerts for tests; can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<AlertPayload>>,
    failing: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failing.lock().await = failing;
    }

    pub async fn alerts(&self) -> Vec<AlertPayload> {
        self.alerts.lock().await.clone()
    }

    pub async fn count(&self, reason: AlertReason) -> usize {
        self.alerts
            .lock()
            .await
            .iter()
            .filter(|a| a.reason == reason)
            .count()
    }
}

#[async_trait]
impl OperatorNotifier for RecordingNotifier {
    async fn notify(&self, alert: &AlertPayload) -> Result<(), OrchestratorError> {
        if *self.failing.lock().await {
            return Err(OrchestratorError::Delivery("operator channel down".into()));
        }
        self.alerts.lock().await.push(alert.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_recording_notifier() {
        let mut customer = Customer::new("42", "Ana", Utc::now());
        customer.lead_score = 45;
        customer.pain_point = Some("cable theft".into());
        let alert = AlertPayload::from_customer(&customer, AlertReason::HotLead, None);

        let notifier = RecordingNotifier::new();
        notifier.notify(&alert).await.unwrap();
        assert_eq!(notifier.count(AlertReason::HotLead).await, 1);
        assert_eq!(notifier.alerts().await[0].pain_point.as_deref(), Some("cable theft"));

        notifier.set_failing(true).await;
        assert!(notifier.notify(&alert).await.is_err());
        assert_eq!(notifier.alerts().await.len(), 1);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(AlertReason::ReadyToClose.to_string(), "ready to close");
        assert_eq!(AlertReason::HotLead.to_string(), "hot lead");
    }
}
