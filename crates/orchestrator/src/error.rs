//! Error types for orchestrator operations.

use std::time::Duration;

use brain_core::BrainError;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while handling a message or running the decay job.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The classifier errored or returned unusable data.
    #[error("classification failed: {0}")]
    Classification(BrainError),

    /// Reply text could not be generated.
    #[error("generation failed: {0}")]
    Generation(BrainError),

    /// A store read or write failed.
    #[error("persistence failed: {0}")]
    Persistence(#[from] DatabaseError),

    /// A message, media or alert could not be delivered.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// A malformed operator or customer command.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// An external call exceeded its time budget.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
