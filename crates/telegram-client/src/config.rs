//! Configuration types for telegram-client.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::TelegramError;

/// Default Bot API base URL.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Configuration for connecting to the Bot API.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    pub token: String,
    /// Base URL of the Bot API server.
    pub api_url: String,
    /// Long-poll timeout passed to `getUpdates`.
    pub poll_timeout: Duration,
    /// Timeout for ordinary (non-polling) requests.
    pub request_timeout: Duration,
}

impl TelegramConfig {
    /// Create a configuration for the given token with default endpoints.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            poll_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `TELEGRAM_BOT_TOKEN`
    ///
    /// Optional:
    /// - `TELEGRAM_API_URL` (default: https://api.telegram.org)
    /// - `TELEGRAM_POLL_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, TelegramError> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| TelegramError::Config("TELEGRAM_BOT_TOKEN not set".to_string()))?;

        let mut config = Self::new(token.trim());
        if let Ok(url) = env::var("TELEGRAM_API_URL") {
            config = config.with_api_url(url);
        }
        if let Some(secs) = env::var("TELEGRAM_POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.poll_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Point the client at another Bot API server (e.g. a local one).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// URL of a Bot API method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }
}

// The token is a credential; keep it out of logs.
impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("poll_timeout", &self.poll_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let config = TelegramConfig::new("123:abc").with_api_url("http://localhost:8081/");
        assert_eq!(
            config.method_url("sendMessage"),
            "http://localhost:8081/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let config = TelegramConfig::new("123:secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("api.telegram.org"));
    }

    #[test]
    fn test_from_env() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        std::env::remove_var("TELEGRAM_BOT_TOKEN");
        std::env::remove_var("TELEGRAM_API_URL");
        std::env::remove_var("TELEGRAM_POLL_TIMEOUT_SECS");
        assert!(matches!(
            TelegramConfig::from_env(),
            Err(TelegramError::Config(_))
        ));

        std::env::set_var("TELEGRAM_BOT_TOKEN", " 42:token ");
        std::env::set_var("TELEGRAM_POLL_TIMEOUT_SECS", "5");
        let config = TelegramConfig::from_env().unwrap();
        assert_eq!(config.token, "42:token");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.poll_timeout, Duration::from_secs(5));

        std::env::remove_var("TELEGRAM_BOT_TOKEN");
        std::env::remove_var("TELEGRAM_POLL_TIMEOUT_SECS");
    }
}
