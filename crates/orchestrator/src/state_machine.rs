//! The conversation state machine.
//!
//! [`StateMachine::decide`] is a pure function of the customer record, the
//! inbound content and the classification. It returns a [`Transition`]
//! describing the next state, the field updates to commit and the reply to
//! produce; the orchestrator performs the side effects.
//!
//! Every state has an explicit arm. Onboarding reads free text directly,
//! menu clicks bypass the classifier, and everything after qualification is
//! routed by classifier tags with this precedence:
//!
//! 1. delivery-timeline question
//! 2. price or deferral objection
//! 3. closing intent
//! 4. quote request
//! 5. default (stay, or return to general conversation)

use std::collections::BTreeSet;
use std::sync::Arc;

use brain_core::{tags, Classification};
use database::{ConversationState, Customer, CustomerUpdate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{EngineConfig, QuoteFlow};
use crate::message::MessageContent;
use crate::quantity::{extract_quantity, Quantity};
use crate::quote::{generate_quote, Quote};
use crate::script;
use crate::sender::ChoiceOption;

static AFFIRMATIVE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:yes|yeah|yep|yup|sure|ok|okay|of course|absolutely|definitely|please|sim|claro|quero|pode)\b",
    )
    .ok()
});

static PUMP_WORDS: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:pumps?|pump houses?|bombas?)\b").ok());

/// Whether `text` reads as agreement.
pub fn is_affirmative(text: &str) -> bool {
    AFFIRMATIVE.as_ref().is_some_and(|re| re.is_match(text))
}

fn mentions_pumps(text: &str) -> bool {
    PUMP_WORDS.as_ref().is_some_and(|re| re.is_match(text))
}

/// How the reply to this message is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyPlan {
    /// Send this text as-is.
    Fixed(String),
    /// Ask the reply generator, steering it with `directive`.
    Generate { directive: String },
    /// Send the rendered quote followed by generated commentary.
    Quote { quote: Quote, directive: String },
    /// Say nothing.
    Silent,
}

/// The decided outcome of one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next_state: ConversationState,
    /// Field updates, including the state change.
    pub updates: CustomerUpdate,
    pub reply: ReplyPlan,
    /// Menu to attach to the reply.
    pub choices: Vec<ChoiceOption>,
    /// Send the demo video after the reply.
    pub send_demo: bool,
    /// Tags implied by a menu choice, scored like classifier tags.
    pub choice_tags: BTreeSet<String>,
}

impl Transition {
    fn to(next_state: ConversationState, reply: ReplyPlan) -> Self {
        Self {
            next_state,
            updates: CustomerUpdate::new().state(next_state),
            reply,
            choices: Vec::new(),
            send_demo: false,
            choice_tags: BTreeSet::new(),
        }
    }

    fn with_updates(mut self, updates: CustomerUpdate) -> Self {
        self.updates = self.updates.merge(updates);
        self
    }

    fn with_choices(mut self, choices: Vec<ChoiceOption>) -> Self {
        self.choices = choices;
        self
    }

    /// Whether the state changes.
    pub fn changes_state(&self, current: ConversationState) -> bool {
        self.next_state != current
    }
}

/// Maps `(state, input, classification)` to a [`Transition`].
#[derive(Debug, Clone)]
pub struct StateMachine {
    config: Arc<EngineConfig>,
}

impl StateMachine {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decide what happens with one inbound message.
    pub fn decide(
        &self,
        customer: &Customer,
        content: &MessageContent,
        classification: &Classification,
    ) -> Transition {
        use ConversationState::*;

        match customer.state {
            PausedByOperator => Transition {
                updates: CustomerUpdate::new().without_touch(),
                ..Transition::to(PausedByOperator, ReplyPlan::Silent)
            },
            Initial => Transition::to(AwaitingName, ReplyPlan::Fixed(script::GREETING.into())),
            AwaitingName => self.capture_name(content, classification),
            AwaitingLocation => self.capture_location(customer, content, classification),
            AwaitingPainPoint | AwaitingPain => self.capture_pain(content),
            ConfirmingInterest => self.confirm_interest(customer, content, classification),
            AwaitingQuoteQuantity => self.capture_quantity(customer, content, classification),
            AwaitingPivotCount => self.capture_pivots(content),
            AwaitingPumpCount => self.capture_pumps(customer, content),
            PresentingSolution | QuotePresented | GeneralConversation => {
                self.route(customer, content, classification, customer.state)
            }
            ObjectionHandling | Closing | DeliveryTimelineQuestion | FollowUpFinalized => {
                self.route(customer, content, classification, GeneralConversation)
            }
        }
    }

    fn generate(&self, state: ConversationState) -> ReplyPlan {
        ReplyPlan::Generate {
            directive: script::directive_for(state, &self.config.delivery_lead_time),
        }
    }

    fn capture_name(&self, content: &MessageContent, classification: &Classification) -> Transition {
        let name = classification
            .entities
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| title_case(content.as_text()));

        if name.is_empty() {
            return Transition::to(
                ConversationState::AwaitingName,
                ReplyPlan::Fixed(script::GREETING.into()),
            );
        }

        let mut updates = CustomerUpdate::new().name(name.clone());
        if let Some(ref farm) = classification.entities.farm_name {
            updates = updates.farm_name(farm.clone());
        }

        Transition::to(
            ConversationState::AwaitingLocation,
            ReplyPlan::Fixed(script::personalize(script::LOCATION_QUESTION, &name)),
        )
        .with_updates(updates)
    }

    fn capture_location(
        &self,
        customer: &Customer,
        content: &MessageContent,
        classification: &Classification,
    ) -> Transition {
        let entities = &classification.entities;
        let location = entities
            .location
            .clone()
            .unwrap_or_else(|| content.as_text().trim().to_string());

        let mut updates = CustomerUpdate::new();
        if !location.is_empty() {
            updates = updates.location(location);
        }
        if customer.farm_name.is_none() {
            if let Some(ref farm) = entities.farm_name {
                updates = updates.farm_name(farm.clone());
            }
        }

        Transition::to(
            ConversationState::AwaitingPainPoint,
            ReplyPlan::Fixed(script::PAIN_QUESTION.into()),
        )
        .with_updates(updates)
        .with_choices(script::pain_menu())
    }

    fn capture_pain(&self, content: &MessageContent) -> Transition {
        let mut transition = Transition::to(
            ConversationState::ConfirmingInterest,
            self.generate(ConversationState::ConfirmingInterest),
        );

        let option = match content {
            MessageContent::Choice { id } => script::pain_option(id),
            MessageContent::Text(_) => None,
        };

        match option {
            Some((label, tag)) => {
                transition.updates = transition.updates.pain_point(label);
                transition.choice_tags.insert(tag.to_string());
            }
            None => {
                let pain = content.as_text().trim();
                if !pain.is_empty() {
                    transition.updates = transition.updates.pain_point(pain);
                }
            }
        }

        transition
    }

    fn confirm_interest(
        &self,
        customer: &Customer,
        content: &MessageContent,
        classification: &Classification,
    ) -> Transition {
        if !is_affirmative(content.as_text()) {
            return self.route(
                customer,
                content,
                classification,
                ConversationState::ConfirmingInterest,
            );
        }

        let mut transition = Transition::to(
            ConversationState::PresentingSolution,
            self.generate(ConversationState::PresentingSolution),
        );
        if !customer.video_sent && self.config.demo_video.is_some() {
            transition.send_demo = true;
            transition.updates = transition.updates.mark_video_sent();
        }
        transition
    }

    /// Tag-driven routing; `default_state` applies when no routing tag fires.
    fn route(
        &self,
        customer: &Customer,
        content: &MessageContent,
        classification: &Classification,
        default_state: ConversationState,
    ) -> Transition {
        use ConversationState::*;

        let transition = if classification.has_tag(tags::DELIVERY_TIMELINE_QUESTION) {
            Transition::to(
                DeliveryTimelineQuestion,
                self.generate(DeliveryTimelineQuestion),
            )
        } else if classification.has_tag(tags::PRICE_OBJECTION)
            || classification.has_tag(tags::DEFERRAL_OBJECTION)
        {
            Transition::to(ObjectionHandling, self.generate(ObjectionHandling))
        } else if classification.has_tag(tags::CLOSING_INTENT) {
            Transition::to(Closing, self.generate(Closing))
        } else if classification.has_tag(tags::QUOTE_REQUEST) {
            self.start_quote(customer, content, classification)
        } else {
            Transition::to(default_state, self.generate(GeneralConversation))
        };

        transition.with_updates(entity_updates(customer, classification))
    }

    fn start_quote(
        &self,
        customer: &Customer,
        content: &MessageContent,
        classification: &Classification,
    ) -> Transition {
        let entities = &classification.entities;
        let (pivots, pumps) = match (entities.pivot_count, entities.pump_count) {
            (None, None) => match extract_quantity(content.as_text()) {
                Quantity::Count(n) if n > 0 => split_by_keyword(n, content.as_text()),
                _ => (0, 0),
            },
            (pivots, pumps) => (pivots.unwrap_or(0), pumps.unwrap_or(0)),
        };

        if pivots > 0 || pumps > 0 {
            return self.present_quote(pivots, pumps);
        }

        let name = customer.name.as_str();
        match self.config.quote_flow {
            QuoteFlow::Generic => Transition::to(
                ConversationState::AwaitingQuoteQuantity,
                ReplyPlan::Fixed(script::personalize(script::QUANTITY_QUESTION, name)),
            ),
            QuoteFlow::Split => Transition::to(
                ConversationState::AwaitingPivotCount,
                ReplyPlan::Fixed(script::personalize(script::PIVOT_QUESTION, name)),
            ),
        }
    }

    fn capture_quantity(
        &self,
        customer: &Customer,
        content: &MessageContent,
        classification: &Classification,
    ) -> Transition {
        let entities = &classification.entities;
        if entities.pivot_count.is_some() || entities.pump_count.is_some() {
            return self.present_quote(
                entities.pivot_count.unwrap_or(0),
                entities.pump_count.unwrap_or(0),
            );
        }

        match extract_quantity(content.as_text()) {
            Quantity::Count(n) => {
                let (pivots, pumps) = split_by_keyword(n, content.as_text());
                self.present_quote(pivots, pumps)
            }
            Quantity::Unrecognized if has_routing_tag(classification) => self.route(
                customer,
                content,
                classification,
                ConversationState::GeneralConversation,
            ),
            Quantity::Unrecognized => Transition::to(
                ConversationState::AwaitingQuoteQuantity,
                ReplyPlan::Fixed(script::QUANTITY_REPROMPT.into()),
            ),
        }
    }

    fn capture_pivots(&self, content: &MessageContent) -> Transition {
        let pivots = extract_quantity(content.as_text()).or_zero();
        Transition::to(
            ConversationState::AwaitingPumpCount,
            ReplyPlan::Fixed(script::PUMP_QUESTION.into()),
        )
        .with_updates(CustomerUpdate::new().pivots(pivots))
    }

    fn capture_pumps(&self, customer: &Customer, content: &MessageContent) -> Transition {
        let pumps = extract_quantity(content.as_text()).or_zero();
        self.present_quote(customer.equipment.pivots, pumps)
    }

    fn present_quote(&self, pivots: u32, pumps: u32) -> Transition {
        let quote = generate_quote(pivots, pumps, &self.config.pricing);
        let updates = CustomerUpdate::new().equipment(pivots, pumps);

        if quote.is_empty() {
            return Transition::to(
                ConversationState::GeneralConversation,
                self.generate(ConversationState::GeneralConversation),
            )
            .with_updates(updates);
        }

        Transition::to(
            ConversationState::QuotePresented,
            ReplyPlan::Quote {
                quote,
                directive: script::directive_for(
                    ConversationState::QuotePresented,
                    &self.config.delivery_lead_time,
                ),
            },
        )
        .with_updates(updates.quote_total(quote.total))
    }
}

/// A single count belongs to pumps when the text talks about pumps.
fn split_by_keyword(count: u32, text: &str) -> (u32, u32) {
    if mentions_pumps(text) {
        (0, count)
    } else {
        (count, 0)
    }
}

fn has_routing_tag(classification: &Classification) -> bool {
    [
        tags::DELIVERY_TIMELINE_QUESTION,
        tags::PRICE_OBJECTION,
        tags::DEFERRAL_OBJECTION,
        tags::CLOSING_INTENT,
        tags::QUOTE_REQUEST,
    ]
    .iter()
    .any(|tag| classification.has_tag(tag))
}

/// Fill farm and location from entities when the record lacks them.
fn entity_updates(customer: &Customer, classification: &Classification) -> CustomerUpdate {
    let entities = &classification.entities;
    let mut updates = CustomerUpdate::new();
    if customer.farm_name.is_none() {
        if let Some(ref farm) = entities.farm_name {
            updates = updates.farm_name(farm.clone());
        }
    }
    if customer.location.is_none() {
        if let Some(ref location) = entities.location {
            updates = updates.location(location.clone());
        }
    }
    updates
}

/// "joHN  smith" -> "John Smith".
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
