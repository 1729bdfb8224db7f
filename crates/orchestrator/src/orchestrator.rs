//! Main orchestrator that coordinates message processing.

use std::collections::BTreeSet;
use std::sync::Arc;

use brain_core::{
    recent, Classification, CustomerSnapshot, HistoryMessage, IntentClassifier, PromptContext,
    ReplyGenerator,
};
use chrono::{DateTime, Utc};
use database::{ConversationState, Customer, CustomerUpdate};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::commands::{parse_command, Command};
use crate::config::EngineConfig;
use crate::decay::DecayJob;
use crate::error::OrchestratorError;
use crate::escalation::{EscalationNotifier, EscalationOutcome};
use crate::locks::CustomerLocks;
use crate::message::{InboundMessage, MessageContent};
use crate::notify::{LoggingNotifier, OperatorNotifier};
use crate::scoring::score_message;
use crate::script;
use crate::sender::{ChoiceOption, MediaAsset, MessageSender};
use crate::state_machine::{ReplyPlan, StateMachine, Transition};
use crate::store::CustomerStore;

/// What happened to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The conversation advanced and a reply was produced.
    Replied {
        state: ConversationState,
        reply: String,
        /// Whether the transport accepted the reply.
        delivered: bool,
        escalation: EscalationOutcome,
    },
    /// The customer is paused; nothing was processed.
    Swallowed,
    /// A command was handled.
    Command { reply: String },
}

/// Coordinates one inbound message end to end.
///
/// For each message the orchestrator:
/// 1. Serializes on the customer id
/// 2. Handles slash commands
/// 3. Loads or creates the customer record
/// 4. Swallows the message if the customer is paused
/// 5. Classifies free text (menu choices skip the classifier)
/// 6. Decides the transition and scores the new tags
/// 7. Commits state, fields, tags, score and history in one update
/// 8. Produces and sends the reply, then the demo video if scheduled
/// 9. Runs the escalation check
pub struct Orchestrator {
    store: Arc<dyn CustomerStore>,
    classifier: Arc<dyn IntentClassifier>,
    generator: Arc<dyn ReplyGenerator>,
    sender: Arc<dyn MessageSender>,
    machine: StateMachine,
    escalation: EscalationNotifier,
    locks: CustomerLocks,
    config: Arc<EngineConfig>,
    operator_id: Option<String>,
}

impl Orchestrator {
    /// Create a new orchestrator builder.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A decay job sharing this orchestrator's store, sender and config.
    pub fn decay_job(&self) -> DecayJob {
        DecayJob::new(self.store.clone(), self.sender.clone(), self.config.clone())
    }

    fn is_operator(&self, customer_id: &str) -> bool {
        self.operator_id.as_deref() == Some(customer_id)
    }

    /// Process an incoming message end-to-end.
    ///
    /// Classifier and generator failures are recovered here. An `Err` means
    /// the record could not be read or written; the caller should send
    /// [`script::FALLBACK_REPLY`].
    pub async fn process(&self, message: InboundMessage) -> Result<Outcome, OrchestratorError> {
        let _guard = self.locks.acquire(&message.customer_id).await;

        if let Some(text) = message.text_content() {
            if let Some(parsed) = parse_command(text, self.is_operator(&message.customer_id)) {
                return self.run_command(&message, parsed).await;
            }
        }

        self.converse(message).await
    }

    async fn converse(&self, message: InboundMessage) -> Result<Outcome, OrchestratorError> {
        let id = message.customer_id.as_str();
        let now = message.received_at;
        let display_name = message.display_name.as_deref().unwrap_or_default();

        let customer = self.store.get_or_create(id, display_name, now).await?;

        if customer.is_paused() {
            info!(customer = %id, "Customer paused by operator; message ignored: {}", message.content.as_text());
            return Ok(Outcome::Swallowed);
        }

        info!(customer = %id, state = %customer.state, "Processing message");

        if let Err(e) = self.sender.set_typing(id, true).await {
            warn!("Failed to start typing indicator: {}", e);
        }

        let classification = match &message.content {
            MessageContent::Text(text) => self.classify(&customer, text).await,
            MessageContent::Choice { .. } => Classification::default(),
        };

        let transition = self
            .machine
            .decide(&customer, &message.content, &classification);
        debug!(
            customer = %id,
            "Transition {} -> {}",
            customer.state,
            transition.next_state
        );

        let detected: BTreeSet<String> = classification
            .tags
            .iter()
            .chain(transition.choice_tags.iter())
            .cloned()
            .collect();
        let score = score_message(customer.lead_score, &customer.tags, &detected, &self.config);
        if score.changed() {
            debug!(customer = %id, "Score {} -> {}", score.previous, score.score);
        }

        let mut update = transition
            .updates
            .clone()
            .append_history(HistoryMessage::user(history_text(&message.content)))
            .add_tags(detected.iter().cloned())
            .lead_score(score.score);
        if let Some(ref profile) = classification.profile {
            update = update.profile(profile.clone());
        }

        // The transition is committed before any reply is generated.
        let customer = self.store.update(id, &update, now).await?;

        let user_text = message.content.as_text();
        let reply = self
            .render_reply(&customer, &transition, user_text, &score.new_tags)
            .await;

        let delivered = self.deliver(&customer, &reply, &transition.choices, now).await;

        if transition.send_demo {
            self.send_demo(id, now).await;
        }

        if let Err(e) = self.sender.set_typing(id, false).await {
            debug!("Failed to stop typing indicator: {}", e);
        }

        let escalation = self.escalation.escalate(&customer, &detected, now).await;

        Ok(Outcome::Replied {
            state: customer.state,
            reply,
            delivered,
            escalation,
        })
    }

    /// Classify with a time budget; any failure yields an empty classification.
    async fn classify(&self, customer: &Customer, text: &str) -> Classification {
        let history = recent(&customer.conversation_history, self.config.prompt_history);

        match timeout(
            self.config.classify_timeout,
            self.classifier.classify(text, history),
        )
        .await
        {
            Ok(Ok(classification)) => {
                debug!(
                    customer = %customer.id,
                    "{} tags: {:?}",
                    self.classifier.name(),
                    classification.tags
                );
                classification
            }
            Ok(Err(e)) => {
                warn!(customer = %customer.id, "{}", OrchestratorError::Classification(e));
                Classification::default()
            }
            Err(_) => {
                warn!(
                    customer = %customer.id,
                    "Classification timed out after {:?}",
                    self.config.classify_timeout
                );
                Classification::default()
            }
        }
    }

    async fn render_reply(
        &self,
        customer: &Customer,
        transition: &Transition,
        user_text: &str,
        new_tags: &BTreeSet<String>,
    ) -> String {
        match &transition.reply {
            ReplyPlan::Fixed(text) => text.clone(),
            ReplyPlan::Generate { directive } => self
                .generate(customer, user_text, new_tags, directive)
                .await
                .unwrap_or_else(|e| {
                    warn!(customer = %customer.id, "{}; sending fallback reply", e);
                    script::FALLBACK_REPLY.to_string()
                }),
            ReplyPlan::Quote { quote, directive } => {
                let rendered = quote.render(&customer.name);
                match self.generate(customer, user_text, new_tags, directive).await {
                    Ok(commentary) => format!("{}\n\n{}", rendered, commentary),
                    Err(e) => {
                        warn!(customer = %customer.id, "{}; sending bare quote", e);
                        rendered
                    }
                }
            }
            ReplyPlan::Silent => String::new(),
        }
    }

    async fn generate(
        &self,
        customer: &Customer,
        user_text: &str,
        new_tags: &BTreeSet<String>,
        directive: &str,
    ) -> Result<String, OrchestratorError> {
        // The newest history entry is the message being answered.
        let history = customer
            .conversation_history
            .split_last()
            .map(|(_, earlier)| earlier)
            .unwrap_or_default();

        let context = PromptContext {
            customer: snapshot(customer),
            target_state: customer.state.as_str().to_string(),
            tags: customer.tags.iter().cloned().collect(),
            new_tags: new_tags.iter().cloned().collect(),
            history: recent(history, self.config.prompt_history).to_vec(),
            user_text: user_text.to_string(),
            directive: directive.to_string(),
        };

        match timeout(self.config.generate_timeout, self.generator.generate(&context)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(Ok(_)) => Err(OrchestratorError::Generation(
                brain_core::BrainError::ProcessingFailed("empty reply".into()),
            )),
            Ok(Err(e)) => Err(OrchestratorError::Generation(e)),
            Err(_) => Err(OrchestratorError::Timeout {
                operation: "reply generation",
                after: self.config.generate_timeout,
            }),
        }
    }

    /// Send the reply and record it in history. Returns whether it went out.
    async fn deliver(
        &self,
        customer: &Customer,
        reply: &str,
        choices: &[ChoiceOption],
        now: DateTime<Utc>,
    ) -> bool {
        if reply.is_empty() {
            return false;
        }

        let send = async {
            if choices.is_empty() {
                self.sender.send_text(&customer.id, reply).await
            } else {
                self.sender.send_choices(&customer.id, reply, choices).await
            }
        };
        let result = match timeout(self.config.send_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(OrchestratorError::Timeout {
                operation: "reply send",
                after: self.config.send_timeout,
            }),
        };

        if let Err(e) = result {
            error!(customer = %customer.id, "Reply not delivered: {}", e);
            return false;
        }

        let record = CustomerUpdate::new().append_history(HistoryMessage::assistant(reply));
        if let Err(e) = self.store.update(&customer.id, &record, now).await {
            error!(customer = %customer.id, "Failed to record reply: {}", e);
        }
        true
    }

    async fn send_demo(&self, customer_id: &str, now: DateTime<Utc>) {
        let Some(file_id) = self.config.demo_video.clone() else {
            return;
        };
        let media = MediaAsset {
            file_id,
            caption: Some(script::DEMO_CAPTION.to_string()),
        };

        info!(customer = %customer_id, "Sending demo video");
        match timeout(self.config.send_timeout, self.sender.send_media(customer_id, &media)).await {
            Ok(Ok(())) => {
                let record = CustomerUpdate::new()
                    .append_history(HistoryMessage::assistant(script::DEMO_HISTORY_NOTE));
                if let Err(e) = self.store.update(customer_id, &record, now).await {
                    error!(customer = %customer_id, "Failed to record demo video: {}", e);
                }
            }
            Ok(Err(e)) => warn!(customer = %customer_id, "Demo video not delivered: {}", e),
            Err(_) => warn!(customer = %customer_id, "Demo video send timed out"),
        }
    }

    async fn run_command(
        &self,
        message: &InboundMessage,
        parsed: Result<Command, OrchestratorError>,
    ) -> Result<Outcome, OrchestratorError> {
        let reply = match parsed {
            Ok(command) => {
                info!(from = %message.customer_id, "Command: {:?}", command);
                self.execute(message, command).await?
            }
            Err(e) => {
                warn!(from = %message.customer_id, "{}", e);
                e.to_string()
            }
        };

        if let Err(e) = self.sender.send_text(&message.customer_id, &reply).await {
            warn!("Failed to send command reply: {}", e);
        }
        Ok(Outcome::Command { reply })
    }

    async fn execute(
        &self,
        message: &InboundMessage,
        command: Command,
    ) -> Result<String, OrchestratorError> {
        let now = message.received_at;

        let reply = match command {
            Command::ResetSelf => {
                if self.store.delete(&message.customer_id).await? {
                    script::RESET_DONE.to_string()
                } else {
                    script::RESET_NOTHING.to_string()
                }
            }
            Command::Help => script::OPERATOR_HELP.to_string(),
            Command::ResetCustomer(id) => {
                if self.store.delete(&id).await? {
                    format!("Customer {} deleted.", id)
                } else {
                    format!("No customer {}.", id)
                }
            }
            Command::Pause(id) => match self.store.get(&id).await? {
                None => format!("No customer {}.", id),
                Some(customer) if customer.is_paused() => {
                    format!("Customer {} is already paused.", id)
                }
                Some(customer) => {
                    let update = CustomerUpdate::new()
                        .previous_state(Some(customer.state))
                        .state(ConversationState::PausedByOperator)
                        .without_touch();
                    self.store.update(&id, &update, now).await?;
                    format!("Customer {} paused (was {}).", id, customer.state)
                }
            },
            Command::Resume(id) => match self.store.get(&id).await? {
                None => format!("No customer {}.", id),
                Some(customer) if !customer.is_paused() => {
                    format!("Customer {} is not paused.", id)
                }
                Some(customer) => {
                    let state = customer
                        .previous_state
                        .unwrap_or(ConversationState::GeneralConversation);
                    let update = CustomerUpdate::new()
                        .state(state)
                        .previous_state(None)
                        .without_touch();
                    self.store.update(&id, &update, now).await?;
                    format!("Customer {} resumed in {}.", id, state)
                }
            },
            Command::Status(id) => match self.store.get(&id).await? {
                None => format!("No customer {}.", id),
                Some(customer) => status_line(&customer),
            },
        };

        Ok(reply)
    }
}

/// Text stored in history for an inbound message.
fn history_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Choice { id } => script::pain_option(id)
            .map(|(label, _)| label.to_string())
            .unwrap_or_else(|| id.clone()),
    }
}

fn snapshot(customer: &Customer) -> CustomerSnapshot {
    CustomerSnapshot {
        name: customer.name.clone(),
        farm_name: customer.farm_name.clone(),
        location: customer.location.clone(),
        profile: customer.profile.clone(),
        pain_point: customer.pain_point.clone(),
        lead_score: customer.lead_score,
        pivots: customer.equipment.pivots,
        pumps: customer.equipment.pumps,
        quote_total: customer.quote_total,
    }
}

fn status_line(customer: &Customer) -> String {
    let tags = if customer.tags.is_empty() {
        "-".to_string()
    } else {
        customer.tags.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    format!(
        "{} ({})\nstate: {}\nscore: {}\ntags: {}\nfollow-ups sent: {}",
        customer.name, customer.id, customer.state, customer.lead_score, tags, customer.follow_up_level
    )
}

/// Builder for [`Orchestrator`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    store: Option<Arc<dyn CustomerStore>>,
    classifier: Option<Arc<dyn IntentClassifier>>,
    generator: Option<Arc<dyn ReplyGenerator>>,
    sender: Option<Arc<dyn MessageSender>>,
    notifier: Option<Arc<dyn OperatorNotifier>>,
    config: Option<EngineConfig>,
    operator_id: Option<String>,
}

impl OrchestratorBuilder {
    pub fn store(mut self, store: Arc<dyn CustomerStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn ReplyGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn sender(mut self, sender: Arc<dyn MessageSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Operator alert channel (default: log only).
    pub fn notifier(mut self, notifier: Arc<dyn OperatorNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Chat id allowed to run operator commands.
    pub fn operator_id(mut self, id: impl Into<String>) -> Self {
        self.operator_id = Some(id.into());
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> Result<Orchestrator, OrchestratorError> {
        let missing = |what: &str| OrchestratorError::Configuration(format!("{} is required", what));

        let store = self.store.ok_or_else(|| missing("store"))?;
        let classifier = self.classifier.ok_or_else(|| missing("classifier"))?;
        let generator = self.generator.ok_or_else(|| missing("generator"))?;
        let sender = self.sender.ok_or_else(|| missing("sender"))?;
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(LoggingNotifier) as Arc<dyn OperatorNotifier>);
        let config = Arc::new(self.config.unwrap_or_default());

        let escalation =
            EscalationNotifier::new(notifier, generator.clone(), store.clone(), config.clone());

        Ok(Orchestrator {
            store,
            classifier,
            generator,
            sender,
            machine: StateMachine::new(config.clone()),
            escalation,
            locks: CustomerLocks::default(),
            config,
            operator_id: self.operator_id,
        })
    }
}
