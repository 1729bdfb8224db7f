//! Telegram front end for the sales conversation engine.
//!
//! This crate turns Telegram updates into engine messages and provides the
//! Telegram-backed implementations of the engine's outbound seams:
//!
//! - [`MessageProcessor`] long-polls updates, acknowledges button presses,
//!   runs each message through the [`Orchestrator`](orchestrator::Orchestrator)
//!   and falls back to a fixed apology when the engine fails
//! - [`TelegramSender`] implements [`MessageSender`](orchestrator::MessageSender)
//! - [`TelegramNotifier`] implements [`OperatorNotifier`](orchestrator::OperatorNotifier)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use message_listener::{MessageProcessor, TelegramNotifier, TelegramSender};
//! use orchestrator::{InMemoryStore, Orchestrator};
//! use telegram_client::{TelegramClient, TelegramConfig};
//!
//! # async fn example(
//! #     classifier: Arc<dyn orchestrator::IntentClassifier>,
//! #     generator: Arc<dyn orchestrator::ReplyGenerator>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let client = TelegramClient::connect(TelegramConfig::from_env()?).await?;
//! let orchestrator = Orchestrator::builder()
//!     .store(Arc::new(InMemoryStore::new()))
//!     .classifier(classifier)
//!     .generator(generator)
//!     .sender(Arc::new(TelegramSender::new(client.clone())))
//!     .notifier(Arc::new(TelegramNotifier::new(client.clone(), 9000)))
//!     .build()?;
//!
//! MessageProcessor::with_defaults(client, Arc::new(orchestrator))
//!     .run()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod convert;
mod processor;
mod telegram;

pub use convert::{to_inbound, SkipReason};
pub use processor::{MessageProcessor, ProcessResult, ProcessorConfig, ProcessorError};
pub use telegram::{format_alert, TelegramNotifier, TelegramSender};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
