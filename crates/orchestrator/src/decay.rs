//! The decay and follow-up job.
//!
//! Two independent passes over the store:
//!
//! 1. score decay for every active customer (neither paused nor finalized),
//!    proportional to whole idle days. Each idle day is charged once: the
//!    record remembers how far decay has run, and contact starts afresh;
//! 2. staged follow-up messages for customers holding a quote, at 3 and 7
//!    idle days, the second one finalizing the conversation. Paused
//!    customers are skipped.
//!
//! Each customer is processed in isolation; one failure is logged and counted
//! and the sweep moves on.

use std::sync::Arc;

use brain_core::HistoryMessage;
use chrono::{DateTime, Duration, Utc};
use database::{ConversationState, Customer, CustomerQuery, CustomerUpdate};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::OrchestratorError;
use crate::scoring::decay_score;
use crate::script;
use crate::sender::MessageSender;
use crate::store::CustomerStore;

/// Counters from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecayReport {
    /// Customers looked at by the decay pass.
    pub scanned: usize,
    /// Customers whose score went down.
    pub decayed: usize,
    pub follow_ups_sent: usize,
    /// Customers moved to `FOLLOW_UP_FINALIZED`.
    pub finalized: usize,
    pub failures: usize,
}

/// Scheduled score decay and follow-up messaging.
pub struct DecayJob {
    store: Arc<dyn CustomerStore>,
    sender: Arc<dyn MessageSender>,
    config: Arc<EngineConfig>,
}

impl DecayJob {
    pub fn new(
        store: Arc<dyn CustomerStore>,
        sender: Arc<dyn MessageSender>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            sender,
            config,
        }
    }

    /// Run one sweep now.
    pub async fn run(&self) -> Result<DecayReport, OrchestratorError> {
        self.run_at(Utc::now()).await
    }

    /// Run one sweep as if the current time were `now`.
    ///
    /// Fails only when a pass cannot list its customers.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<DecayReport, OrchestratorError> {
        let mut report = DecayReport::default();

        self.decay_pass(now, &mut report).await?;
        self.follow_up_pass(now, &mut report).await?;

        info!(
            "Decay sweep finished: {} scanned, {} decayed, {} follow-ups, {} finalized, {} failures",
            report.scanned,
            report.decayed,
            report.follow_ups_sent,
            report.finalized,
            report.failures
        );
        Ok(report)
    }

    async fn decay_pass(
        &self,
        now: DateTime<Utc>,
        report: &mut DecayReport,
    ) -> Result<(), OrchestratorError> {
        let customers = self.store.query(CustomerQuery::Active).await?;
        debug!("Decay pass over {} customers", customers.len());

        for customer in customers {
            report.scanned += 1;

            let days = customer.undecayed_days(now);
            let decayed = decay_score(customer.lead_score, days, self.config.decay_rate_per_day);
            if decayed == customer.lead_score {
                continue;
            }

            // Advance by whole days so partial days carry over to the next run.
            // Idle time must keep accumulating, so the contact time stays.
            let charged = customer.decay_anchor() + Duration::days(days);
            let update = CustomerUpdate::new()
                .lead_score(decayed)
                .decayed_through(charged)
                .without_touch();
            match self.store.update(&customer.id, &update, now).await {
                Ok(_) => {
                    debug!(
                        customer = %customer.id,
                        "Score decayed {} -> {} for {} idle days",
                        customer.lead_score,
                        decayed,
                        days
                    );
                    report.decayed += 1;
                }
                Err(e) => {
                    error!(customer = %customer.id, "Failed to decay score: {}", e);
                    report.failures += 1;
                }
            }
        }

        Ok(())
    }

    async fn follow_up_pass(
        &self,
        now: DateTime<Utc>,
        report: &mut DecayReport,
    ) -> Result<(), OrchestratorError> {
        let customers = self.store.query(CustomerQuery::AwaitingFollowUp).await?;
        debug!("Follow-up pass over {} customers", customers.len());

        let mut first_send = true;
        for customer in customers {
            let Some((template, update)) = self.follow_up_for(&customer, now) else {
                continue;
            };

            if !first_send {
                sleep(self.config.send_delay).await;
            }
            first_send = false;

            let message = script::personalize(template, &customer.name);
            if let Err(e) = self.send(&customer.id, &message).await {
                warn!(customer = %customer.id, "Follow-up not delivered: {}", e);
                report.failures += 1;
                continue;
            }

            let finalizes = update.state == Some(ConversationState::FollowUpFinalized);
            let update = update.append_history(HistoryMessage::assistant(format!(
                "{}\n{}",
                script::FOLLOW_UP_HISTORY_PREFIX,
                message
            )));

            match self.store.update(&customer.id, &update, now).await {
                Ok(_) => {
                    info!(
                        customer = %customer.id,
                        "Follow-up #{} sent",
                        update.follow_up_level.unwrap_or_default()
                    );
                    report.follow_ups_sent += 1;
                    if finalizes {
                        report.finalized += 1;
                    }
                }
                Err(e) => {
                    error!(customer = %customer.id, "Follow-up sent but not recorded: {}", e);
                    report.failures += 1;
                }
            }
        }

        Ok(())
    }

    /// The follow-up due for `customer`, with the update recording it.
    fn follow_up_for(
        &self,
        customer: &Customer,
        now: DateTime<Utc>,
    ) -> Option<(&'static str, CustomerUpdate)> {
        // An operator who paused the customer owns the conversation.
        if customer.is_paused() {
            return None;
        }

        let days_idle = customer.days_idle(now);

        if days_idle >= self.config.first_follow_up_days && customer.follow_up_level == 0 {
            Some((script::FOLLOW_UP_FIRST, CustomerUpdate::new().follow_up_level(1)))
        } else if days_idle >= self.config.second_follow_up_days && customer.follow_up_level == 1 {
            Some((
                script::FOLLOW_UP_SECOND,
                CustomerUpdate::new()
                    .follow_up_level(2)
                    .state(ConversationState::FollowUpFinalized),
            ))
        } else {
            None
        }
    }

    async fn send(&self, customer_id: &str, text: &str) -> Result<(), OrchestratorError> {
        match timeout(self.config.send_timeout, self.sender.send_text(customer_id, text)).await {
            Ok(result) => result,
            Err(_) => Err(OrchestratorError::Timeout {
                operation: "follow-up send",
                after: self.config.send_timeout,
            }),
        }
    }
}
