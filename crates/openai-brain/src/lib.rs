//! OpenAI-compatible backend for the sales bot's language-model capabilities.
//!
//! [`OpenAiBrain`] implements both [`IntentClassifier`] (a JSON-mode call to
//! the analysis model) and [`ReplyGenerator`] (the sales persona prompt sent
//! to the reply model, plus operator summaries).
//!
//! # Usage
//!
//! ```rust,no_run
//! use openai_brain::{IntentClassifier, OpenAiBrain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let brain = OpenAiBrain::from_env()?;
//!     let classification = brain.classify("How much for 3 pivots?", &[]).await?;
//!     println!("{:?}", classification.tags);
//!     Ok(())
//! }
//! ```

mod api_types;
mod brain;
mod config;
mod json;
mod prompts;

pub use brain::OpenAiBrain;
pub use config::{OpenAiConfig, OpenAiConfigBuilder, DEFAULT_PROMPT_FILE};
pub use json::{extract_json, parse_classification};
pub use prompts::DEFAULT_PERSONA;

// Re-export brain-core types for convenience
pub use brain_core::{
    async_trait, BrainError, Classification, HistoryMessage, IntentClassifier, PromptContext,
    ReplyGenerator,
};
