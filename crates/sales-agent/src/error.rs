use brain_core::BrainError;
use database::DatabaseError;
use message_listener::ProcessorError;
use orchestrator::OrchestratorError;
use telegram_client::TelegramError;
use thiserror::Error;

/// Errors raised while wiring or running the bot processes.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Brain(#[from] BrainError),

    #[error(transparent)]
    Telegram(#[from] TelegramError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error("failed to set up logging: {0}")]
    Logging(String),
}
