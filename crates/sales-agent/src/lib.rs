//! Process wiring for the farm-security sales bot.
//!
//! Binaries:
//! - `sales-bot`: long-polls Telegram and runs every message through the engine
//! - `follow-up`: runs the score decay and follow-up sweep once or on a timer
//! - `inspect-customer`: prints one stored customer record

pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod wiring;

pub use config::{AgentConfig, ClassifierBackend, LogFormat};
pub use error::AgentError;
pub use logging::init_tracing;
pub use report::{render_customer, summarize_sweep};
pub use wiring::{build_brains, build_decay_job, build_orchestrator, connect_telegram, open_database};
