//! Conversation engine for the sales qualification bot.
//!
//! This crate provides the [`Orchestrator`] type, which takes inbound
//! customer messages through the qualification flow, plus the [`DecayJob`]
//! that cools idle leads and sends follow-ups.
//!
//! # Architecture
//!
//! ```text
//! Telegram update (from message-listener)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  1. Lock customer, handle /commands                         │
//! │         ↓                                                   │
//! │  2. Load record (paused → swallow)                          │
//! │         ↓                                                   │
//! │  3. Classify text (failure → no tags)                       │
//! │         ↓                                                   │
//! │  4. StateMachine::decide + score_message                    │
//! │         ↓                                                   │
//! │  5. Commit one CustomerUpdate                               │
//! │         ↓                                                   │
//! │  6. Generate reply (failure → apology), send, demo video    │
//! │         ↓                                                   │
//! │  7. EscalationNotifier → operator                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use orchestrator::{InMemoryStore, InboundMessage, LoggingSender, Orchestrator};
//! use mock_brain::{KeywordClassifier, TemplateGenerator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = Orchestrator::builder()
//!         .store(Arc::new(InMemoryStore::new()))
//!         .classifier(Arc::new(KeywordClassifier::new()))
//!         .generator(Arc::new(TemplateGenerator::new()))
//!         .sender(Arc::new(LoggingSender))
//!         .build()?;
//!
//!     let outcome = orchestrator.process(InboundMessage::text("1001", "Hi")).await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

mod commands;
mod config;
mod decay;
mod error;
mod escalation;
mod locks;
mod message;
mod notify;
mod orchestrator;
mod quantity;
mod quote;
mod scoring;
pub mod script;
mod sender;
mod state_machine;
mod store;

// Public exports
pub use commands::{parse_command, Command};
pub use config::{default_tag_weights, parse_tag_weights, EngineConfig, EngineConfigBuilder, QuoteFlow};
pub use decay::{DecayJob, DecayReport};
pub use error::OrchestratorError;
pub use escalation::{evaluate, EscalationNotifier, EscalationOutcome};
pub use locks::CustomerLocks;
pub use message::{InboundMessage, MessageContent};
pub use notify::{AlertPayload, AlertReason, LoggingNotifier, NoOpNotifier, OperatorNotifier, RecordingNotifier};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, Outcome};
pub use quantity::{extract_quantity, Quantity};
pub use quote::{format_money, generate_quote, Pricing, Quote};
pub use scoring::{decay_score, score_message, ScoreOutcome};
pub use sender::{ChoiceOption, LoggingSender, MediaAsset, MessageSender, NoOpSender, RecordingSender, Sent};
pub use state_machine::{is_affirmative, ReplyPlan, StateMachine, Transition};
pub use store::{CustomerStore, InMemoryStore};

// Re-export commonly used types from dependencies
pub use brain_core::{IntentClassifier, ReplyGenerator};
pub use database::{ConversationState, Customer, CustomerQuery, CustomerUpdate};
