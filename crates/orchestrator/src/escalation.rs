//! Operator escalation.
//!
//! Closing intent alerts every time it is seen. The hot-lead alert fires
//! once per record: the `hot_lead_notified` latch is written only after the
//! notifier confirms delivery, so a failed alert is retried on the next
//! qualifying message.

use std::collections::BTreeSet;
use std::sync::Arc;

use brain_core::{tags, ReplyGenerator};
use chrono::{DateTime, Utc};
use database::{Customer, CustomerUpdate};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::notify::{AlertPayload, AlertReason, OperatorNotifier};
use crate::store::CustomerStore;

/// Result of one escalation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// No alert was due.
    NotDue,
    /// The alert was delivered.
    Sent(AlertReason),
    /// The alert was due but delivery failed.
    Failed(AlertReason),
}

/// Which alert, if any, is due for `customer` after a message carrying
/// `message_tags`. `customer` must already reflect this message's score.
pub fn evaluate(
    customer: &Customer,
    message_tags: &BTreeSet<String>,
    hot_lead_threshold: i64,
) -> Option<AlertReason> {
    if message_tags.contains(tags::CLOSING_INTENT) {
        Some(AlertReason::ReadyToClose)
    } else if customer.lead_score >= hot_lead_threshold && !customer.hot_lead_notified {
        Some(AlertReason::HotLead)
    } else {
        None
    }
}

/// Sends operator alerts and maintains the hot-lead latch.
pub struct EscalationNotifier {
    notifier: Arc<dyn OperatorNotifier>,
    generator: Arc<dyn ReplyGenerator>,
    store: Arc<dyn CustomerStore>,
    config: Arc<EngineConfig>,
}

impl EscalationNotifier {
    pub fn new(
        notifier: Arc<dyn OperatorNotifier>,
        generator: Arc<dyn ReplyGenerator>,
        store: Arc<dyn CustomerStore>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            notifier,
            generator,
            store,
            config,
        }
    }

    /// Check and, when due, send the alert for `customer`.
    pub async fn escalate(
        &self,
        customer: &Customer,
        message_tags: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> EscalationOutcome {
        let Some(reason) = evaluate(customer, message_tags, self.config.hot_lead_threshold) else {
            return EscalationOutcome::NotDue;
        };

        let summary = self.summarize(customer).await;
        let alert = AlertPayload::from_customer(customer, reason, summary);

        let delivered = match timeout(self.config.notify_timeout, self.notifier.notify(&alert)).await
        {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(customer = %customer.id, "Operator alert ({}) failed: {}", reason, e);
                false
            }
            Err(_) => {
                warn!(
                    customer = %customer.id,
                    "Operator alert ({}) timed out after {:?}",
                    reason,
                    self.config.notify_timeout
                );
                false
            }
        };

        if !delivered {
            return EscalationOutcome::Failed(reason);
        }

        info!(customer = %customer.id, score = customer.lead_score, "Operator alerted: {}", reason);

        if reason == AlertReason::HotLead {
            let latch = CustomerUpdate::new().mark_hot_lead_notified().without_touch();
            if let Err(e) = self.store.update(&customer.id, &latch, now).await {
                error!(customer = %customer.id, "Failed to record hot-lead alert: {}", e);
            }
        }

        EscalationOutcome::Sent(reason)
    }

    async fn summarize(&self, customer: &Customer) -> Option<String> {
        if customer.conversation_history.is_empty() {
            return None;
        }

        match timeout(
            self.config.generate_timeout,
            self.generator.summarize(&customer.conversation_history),
        )
        .await
        {
            Ok(Ok(summary)) if !summary.trim().is_empty() => Some(summary.trim().to_string()),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                debug!(customer = %customer.id, "No summary for alert: {}", e);
                None
            }
            Err(_) => {
                debug!(customer = %customer.id, "Summary timed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::store::InMemoryStore;
    use brain_core::HistoryMessage;
    use mock_brain::{FailingBrain, TemplateGenerator};

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn hot(score: i64, notified: bool) -> Customer {
        let mut c = Customer::new("42", "Ana", Utc::now());
        c.lead_score = score;
        c.hot_lead_notified = notified;
        c
    }

    #[test]
    fn test_evaluate_rules() {
        assert_eq!(
            evaluate(&hot(0, true), &set(&[tags::CLOSING_INTENT]), 40),
            Some(AlertReason::ReadyToClose)
        );
        assert_eq!(evaluate(&hot(40, false), &BTreeSet::new(), 40), Some(AlertReason::HotLead));
        assert_eq!(evaluate(&hot(40, true), &BTreeSet::new(), 40), None);
        assert_eq!(evaluate(&hot(39, false), &BTreeSet::new(), 40), None);
    }

    async fn setup(
        generator: Arc<dyn ReplyGenerator>,
    ) -> (EscalationNotifier, Arc<RecordingNotifier>, Arc<InMemoryStore>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let store = Arc::new(InMemoryStore::new());
        let escalation = EscalationNotifier::new(
            notifier.clone(),
            generator,
            store.clone(),
            Arc::new(EngineConfig::default()),
        );
        (escalation, notifier, store)
    }

    #[tokio::test]
    async fn test_latch_set_only_after_delivery() {
        let (escalation, notifier, store) = setup(Arc::new(TemplateGenerator::new())).await;
        let customer = hot(45, false);
        store.insert(customer.clone()).await;

        notifier.set_failing(true).await;
        let outcome = escalation.escalate(&customer, &BTreeSet::new(), Utc::now()).await;
        assert_eq!(outcome, EscalationOutcome::Failed(AlertReason::HotLead));
        assert!(!store.get("42").await.unwrap().unwrap().hot_lead_notified);

        notifier.set_failing(false).await;
        let outcome = escalation.escalate(&customer, &BTreeSet::new(), Utc::now()).await;
        assert_eq!(outcome, EscalationOutcome::Sent(AlertReason::HotLead));
        assert!(store.get("42").await.unwrap().unwrap().hot_lead_notified);
        assert_eq!(notifier.count(AlertReason::HotLead).await, 1);
    }

    #[tokio::test]
    async fn test_summary_attached_when_available() {
        let (escalation, notifier, store) = setup(Arc::new(TemplateGenerator::new())).await;
        let mut customer = hot(0, false);
        customer.conversation_history = vec![
            HistoryMessage::user("I want to buy"),
            HistoryMessage::assistant("Great!"),
        ];
        store.insert(customer.clone()).await;

        escalation
            .escalate(&customer, &set(&[tags::CLOSING_INTENT]), Utc::now())
            .await;

        let alerts = notifier.alerts().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].reason, AlertReason::ReadyToClose);
        assert!(alerts[0].summary.is_some());
    }

    #[tokio::test]
    async fn test_summary_failure_still_alerts() {
        let (escalation, notifier, store) = setup(Arc::new(FailingBrain::new())).await;
        let mut customer = hot(50, false);
        customer.conversation_history = vec![HistoryMessage::user("hello")];
        store.insert(customer.clone()).await;

        let outcome = escalation.escalate(&customer, &BTreeSet::new(), Utc::now()).await;
        assert_eq!(outcome, EscalationOutcome::Sent(AlertReason::HotLead));
        assert_eq!(notifier.alerts().await[0].summary, None);
    }

    #[tokio::test]
    async fn test_closing_does_not_latch() {
        let (escalation, _notifier, store) = setup(Arc::new(TemplateGenerator::new())).await;
        let customer = hot(80, false);
        store.insert(customer.clone()).await;

        let outcome = escalation
            .escalate(&customer, &set(&[tags::CLOSING_INTENT]), Utc::now())
            .await;
        assert_eq!(outcome, EscalationOutcome::Sent(AlertReason::ReadyToClose));
        assert!(!store.get("42").await.unwrap().unwrap().hot_lead_notified);
    }
}
