//! Configuration for OpenAiBrain.

use brain_core::BrainError;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Default persona prompt file name.
pub const DEFAULT_PROMPT_FILE: &str = "SALES_PROMPT.md";

/// Configuration for OpenAiBrain.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL of the OpenAI-compatible API.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model used for customer-facing replies.
    pub model: String,

    /// Cheaper model used for classification and summaries.
    pub analysis_model: String,

    /// Optional persona prompt replacing the built-in one.
    pub persona_prompt: Option<String>,

    /// Maximum tokens for a generated reply.
    pub max_tokens: Option<u32>,

    /// Temperature for reply generation (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Number of history entries rendered into prompts.
    pub history_window: usize,

    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            analysis_model: "gpt-3.5-turbo".to_string(),
            persona_prompt: None,
            max_tokens: Some(400),
            temperature: Some(0.7),
            history_window: 10,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl OpenAiConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `OPENAI_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `OPENAI_API_URL` - API URL (default: https://api.openai.com)
    /// - `OPENAI_MODEL` - Reply model (default: gpt-4o)
    /// - `OPENAI_ANALYSIS_MODEL` - Classification model (default: gpt-3.5-turbo)
    /// - `OPENAI_PROMPT_FILE` - Persona prompt file (default: SALES_PROMPT.md)
    /// - `OPENAI_MAX_TOKENS` - Max reply tokens (default: 400)
    /// - `OPENAI_TEMPERATURE` - Temperature (default: 0.7)
    /// - `OPENAI_HISTORY_WINDOW` - History entries per prompt (default: 10)
    /// - `OPENAI_TIMEOUT_SECS` - HTTP timeout in seconds (default: 60)
    pub fn from_env() -> Result<Self, BrainError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| BrainError::Configuration("OPENAI_API_KEY not set".to_string()))?;

        let defaults = Self::default();

        let api_url = env::var("OPENAI_API_URL").unwrap_or(defaults.api_url);
        let model = env::var("OPENAI_MODEL").unwrap_or(defaults.model);
        let analysis_model = env::var("OPENAI_ANALYSIS_MODEL").unwrap_or(defaults.analysis_model);

        let prompt_file =
            env::var("OPENAI_PROMPT_FILE").unwrap_or_else(|_| DEFAULT_PROMPT_FILE.to_string());
        let persona_prompt = load_prompt_file(&prompt_file);

        let max_tokens = env::var("OPENAI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(defaults.max_tokens);

        let temperature = env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(defaults.temperature);

        let history_window = env::var("OPENAI_HISTORY_WINDOW")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.history_window);

        let request_timeout = env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            analysis_model,
            persona_prompt,
            max_tokens,
            temperature,
            history_window,
            request_timeout,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> OpenAiConfigBuilder {
        OpenAiConfigBuilder::default()
    }
}

/// Builder for OpenAiConfig.
#[derive(Debug, Default)]
pub struct OpenAiConfigBuilder {
    config: OpenAiConfig,
}

impl OpenAiConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn analysis_model(mut self, model: impl Into<String>) -> Self {
        self.config.analysis_model = model.into();
        self
    }

    pub fn persona_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.persona_prompt = Some(prompt.into());
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    pub fn history_window(mut self, entries: usize) -> Self {
        self.config.history_window = entries;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Load the persona prompt from a file, if it exists and is non-empty.
    pub fn load_prompt_file(mut self, path: impl AsRef<Path>) -> Self {
        if let Some(prompt) = load_prompt_file(path) {
            self.config.persona_prompt = Some(prompt);
        }
        self
    }

    pub fn build(self) -> OpenAiConfig {
        self.config
    }
}

/// Load a prompt file, returning None if not found or empty.
fn load_prompt_file(path: impl AsRef<Path>) -> Option<String> {
    let content = std::fs::read_to_string(path.as_ref()).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAiConfig::default();

        assert_eq!(config.api_url, "https://api.openai.com");
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.analysis_model, "gpt-3.5-turbo");
        assert_eq!(config.max_tokens, Some(400));
        assert_eq!(config.temperature, Some(0.7));
        assert_eq!(config.history_window, 10);
        assert!(config.persona_prompt.is_none());
    }

    #[test]
    fn test_builder_all_options() {
        let config = OpenAiConfig::builder()
            .api_key("my-key")
            .api_url("https://proxy.local/")
            .model("gpt-4o-mini")
            .analysis_model("gpt-4o-mini")
            .persona_prompt("You sell alarms")
            .max_tokens(200)
            .temperature(0.2)
            .history_window(4)
            .request_timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.api_key, "my-key");
        assert_eq!(config.api_url, "https://proxy.local");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.analysis_model, "gpt-4o-mini");
        assert_eq!(config.persona_prompt.as_deref(), Some("You sell alarms"));
        assert_eq!(config.max_tokens, Some(200));
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.history_window, 4);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_prompt_file_is_ignored() {
        let config = OpenAiConfig::builder()
            .load_prompt_file("/definitely/not/here.md")
            .build();
        assert!(config.persona_prompt.is_none());
    }

    // Env vars are process-global, so every scenario lives in one test.
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_openai_vars() {
            for var in [
                "OPENAI_API_KEY",
                "OPENAI_API_URL",
                "OPENAI_MODEL",
                "OPENAI_ANALYSIS_MODEL",
                "OPENAI_PROMPT_FILE",
                "OPENAI_MAX_TOKENS",
                "OPENAI_TEMPERATURE",
                "OPENAI_HISTORY_WINDOW",
                "OPENAI_TIMEOUT_SECS",
            ] {
                std::env::remove_var(var);
            }
        }

        // Missing key
        clear_all_openai_vars();
        match OpenAiConfig::from_env() {
            Err(BrainError::Configuration(msg)) => assert!(msg.contains("OPENAI_API_KEY")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }

        // Defaults
        clear_all_openai_vars();
        std::env::set_var("OPENAI_API_KEY", "env-key");
        std::env::set_var("OPENAI_PROMPT_FILE", "/definitely/not/here.md");
        let config = OpenAiConfig::from_env().unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.analysis_model, "gpt-3.5-turbo");
        assert_eq!(config.max_tokens, Some(400));

        // Overrides; unparseable numbers fall back to defaults
        clear_all_openai_vars();
        std::env::set_var("OPENAI_API_KEY", "env-key");
        std::env::set_var("OPENAI_API_URL", "http://localhost:8080/");
        std::env::set_var("OPENAI_MODEL", "local-model");
        std::env::set_var("OPENAI_MAX_TOKENS", "250");
        std::env::set_var("OPENAI_TEMPERATURE", "warm");
        std::env::set_var("OPENAI_HISTORY_WINDOW", "6");
        std::env::set_var("OPENAI_TIMEOUT_SECS", "15");
        let config = OpenAiConfig::from_env().unwrap();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.model, "local-model");
        assert_eq!(config.max_tokens, Some(250));
        assert_eq!(config.temperature, Some(0.7));
        assert_eq!(config.history_window, 6);
        assert_eq!(config.request_timeout, Duration::from_secs(15));

        clear_all_openai_vars();
    }
}
