//! Deterministic brain implementations.
//!
//! - [`KeywordClassifier`] - rule-based tag and profile detection, usable in
//!   place of a model-backed classifier
//! - [`ScriptedClassifier`] - replays queued classifications (or failures)
//! - [`TemplateGenerator`] - writes predictable replies and records prompts
//! - [`FailingBrain`] - fails every call
//! - [`DelayedBrain`] - wraps another brain with artificial delay
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{IntentClassifier, KeywordClassifier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let classifier = KeywordClassifier::new();
//!     let result = classifier.classify("How much does it cost?", &[]).await?;
//!     assert!(result.has_tag(brain_core::tags::QUOTE_REQUEST));
//!     Ok(())
//! }
//! ```

mod delayed;
mod failing;
mod keyword;
mod scripted;
mod template;

// Re-export brain-core types for convenience
pub use brain_core::{
    async_trait, BrainError, Classification, Entities, HistoryMessage, IntentClassifier,
    PromptContext, ReplyGenerator,
};

pub use delayed::DelayedBrain;
pub use failing::FailingBrain;
pub use keyword::{classify_profile, KeywordClassifier};
pub use scripted::ScriptedClassifier;
pub use template::TemplateGenerator;
