//! Telegram Bot API client library.
//!
//! This crate provides the transport used by the sales bot:
//!
//! - Sending text, inline-keyboard choices and videos
//! - Chat actions ("typing...") and callback acknowledgements
//! - Receiving updates via long polling with reconnect backoff
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use telegram_client::{TelegramClient, TelegramConfig};
//!
//! # async fn example() -> Result<(), telegram_client::TelegramError> {
//! let client = TelegramClient::connect(TelegramConfig::from_env()?).await?;
//!
//! let mut updates = telegram_client::subscribe(&client);
//! while let Some(result) = updates.next().await {
//!     match result {
//!         Ok(update) => {
//!             if let Some(message) = update.message {
//!                 client.send_text(message.chat.id, "Hello!").await?;
//!             }
//!         }
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod poll;
pub mod types;

pub use client::{parse_chat_id, TelegramClient};
pub use config::{TelegramConfig, DEFAULT_API_URL};
pub use error::TelegramError;
pub use poll::{subscribe, subscribe_with_reconnect, ReconnectConfig, UpdateStream};
pub use types::*;
