//! Core traits and types for the language-model collaborators.
//!
//! The sales bot consumes two capabilities it does not implement itself:
//!
//! - [`IntentClassifier`] turns raw customer text (plus recent history) into a
//!   [`Classification`]: semantic tags, a profile label, extracted entities and
//!   a journey stage.
//! - [`ReplyGenerator`] turns a [`PromptContext`] into natural-language text,
//!   and optionally summarizes a conversation for the human operator.
//!
//! Both are fallible and non-deterministic; callers decide how to recover.
//!
//! # Example
//!
//! ```rust
//! use brain_core::{async_trait, BrainError, Classification, HistoryMessage, IntentClassifier};
//!
//! struct AlwaysGreeting;
//!
//! #[async_trait]
//! impl IntentClassifier for AlwaysGreeting {
//!     async fn classify(
//!         &self,
//!         _text: &str,
//!         _history: &[HistoryMessage],
//!     ) -> Result<Classification, BrainError> {
//!         Ok(Classification::with_tags([brain_core::tags::GREETING]))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "AlwaysGreeting"
//!     }
//! }
//! ```

mod classify;
mod error;
mod generate;
mod history;
mod prompt;
pub mod tags;

pub use classify::{Classification, Entities, IntentClassifier};
pub use error::BrainError;
pub use generate::{CustomerSnapshot, PromptContext, ReplyGenerator};
pub use history::{push_bounded, recent, HistoryMessage, Role, MAX_HISTORY_MESSAGES};
pub use prompt::{format_transcript, hash_prompt};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
