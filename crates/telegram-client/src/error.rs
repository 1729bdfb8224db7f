//! Error types for telegram-client.

use thiserror::Error;

/// Errors that can occur when talking to the Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with `ok: false`.
    #[error("API error {code}: {description}")]
    Api {
        code: i32,
        description: String,
        /// Seconds to wait before retrying, when rate limited.
        retry_after: Option<u64>,
    },

    /// The bot token was rejected by `getMe`.
    #[error("Bot token rejected")]
    Unauthorized,

    /// A chat id that is not a Telegram integer id.
    #[error("Invalid chat id: {0}")]
    InvalidChatId(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Long polling gave up after exhausting its retries.
    #[error("Polling stopped: {0}")]
    Poll(String),
}

impl TelegramError {
    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            TelegramError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            TelegramError::Api { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let rate_limited = TelegramError::Api {
            code: 429,
            description: "Too Many Requests".into(),
            retry_after: Some(3),
        };
        let blocked = TelegramError::Api {
            code: 403,
            description: "Forbidden: bot was blocked by the user".into(),
            retry_after: None,
        };

        assert!(rate_limited.is_transient());
        assert!(!blocked.is_transient());
        assert!(!TelegramError::Unauthorized.is_transient());
        assert_eq!(
            blocked.to_string(),
            "API error 403: Forbidden: bot was blocked by the user"
        );
    }
}
