//! Error types for brain operations.

use thiserror::Error;

/// Errors that can occur while classifying or generating.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The backend is temporarily unavailable or does not support the call.
    #[error("brain unavailable: {0}")]
    Unavailable(String),

    /// The request was made but the output could not be used.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure talking to the backend.
    #[error("network error: {0}")]
    Network(String),

    /// A timeout occurred during processing.
    #[error("processing timed out")]
    Timeout,
}
