//! Process configuration for the sales bot binaries.

use std::env;
use std::path::PathBuf;

use database::sqlite_url_from_path;

use crate::error::AgentError;

/// Default SQLite path when `SQLITE_PATH` is unset.
pub const DEFAULT_SQLITE_PATH: &str = "./data/sales_bot.db";

/// Default directory for the rolling log file.
pub const DEFAULT_LOG_DIR: &str = "data";

/// Which implementation classifies customer messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierBackend {
    /// The OpenAI-compatible model.
    OpenAi,
    /// Offline keyword rules.
    Keyword,
}

impl ClassifierBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "keyword" | "keywords" => Some(Self::Keyword),
            _ => None,
        }
    }
}

/// Log line format on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Configuration shared by the binaries.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// SQLite URL for the customer database.
    pub sqlite_url: String,
    /// Chat id of the human sales operator.
    pub operator_chat_id: Option<String>,
    pub classifier: ClassifierBackend,
    /// Directory of the daily log file; `None` disables the file sink.
    pub log_dir: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from_sqlite_path(DEFAULT_SQLITE_PATH)
    }
}

impl AgentConfig {
    /// Create a new config from a SQLite path or URL.
    pub fn from_sqlite_path(path: impl Into<String>) -> Self {
        let sqlite_path = path.into();
        Self {
            sqlite_url: sqlite_url_from_path(&sqlite_path),
            operator_chat_id: None,
            classifier: ClassifierBackend::OpenAi,
            log_dir: Some(PathBuf::from(DEFAULT_LOG_DIR)),
            log_format: LogFormat::Pretty,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `SQLITE_PATH` (path or sqlite URL, default: ./data/sales_bot.db)
    /// - `OPERATOR_CHAT_ID` (operator alerts and commands are disabled without it)
    /// - `CLASSIFIER_BACKEND` (`openai` | `keyword`, default: openai)
    /// - `LOG_DIR` (default: data; empty disables the log file)
    /// - `LOG_FORMAT` (`pretty` | `json`, default: pretty)
    pub fn from_env() -> Result<Self, AgentError> {
        let sqlite_path =
            env::var("SQLITE_PATH").unwrap_or_else(|_| DEFAULT_SQLITE_PATH.to_string());
        let mut config = Self::from_sqlite_path(sqlite_path);

        config.operator_chat_id = env::var("OPERATOR_CHAT_ID")
            .ok()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        if let Ok(backend) = env::var("CLASSIFIER_BACKEND") {
            config.classifier = ClassifierBackend::parse(&backend).ok_or_else(|| {
                AgentError::Config(format!("CLASSIFIER_BACKEND is invalid: {}", backend))
            })?;
        }

        if let Ok(dir) = env::var("LOG_DIR") {
            config.log_dir = if dir.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }

        if let Ok(format) = env::var("LOG_FORMAT") {
            config.log_format = match format.trim().to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                other => {
                    return Err(AgentError::Config(format!("LOG_FORMAT is invalid: {}", other)))
                }
            };
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "SQLITE_PATH",
        "OPERATOR_CHAT_ID",
        "CLASSIFIER_BACKEND",
        "LOG_DIR",
        "LOG_FORMAT",
    ];

    fn clear() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(ClassifierBackend::parse("OpenAI"), Some(ClassifierBackend::OpenAi));
        assert_eq!(ClassifierBackend::parse(" keyword "), Some(ClassifierBackend::Keyword));
        assert_eq!(ClassifierBackend::parse("grok"), None);
    }

    #[test]
    fn test_from_env_scenarios() {
        let _guard = ENV_LOCK.lock().unwrap();

        clear();
        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.sqlite_url, "sqlite:./data/sales_bot.db?mode=rwc");
        assert_eq!(config.operator_chat_id, None);
        assert_eq!(config.classifier, ClassifierBackend::OpenAi);
        assert_eq!(config.log_dir, Some(PathBuf::from("data")));
        assert_eq!(config.log_format, LogFormat::Pretty);

        env::set_var("SQLITE_PATH", "sqlite::memory:");
        env::set_var("OPERATOR_CHAT_ID", " 9000 ");
        env::set_var("CLASSIFIER_BACKEND", "keyword");
        env::set_var("LOG_DIR", "");
        env::set_var("LOG_FORMAT", "json");
        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.sqlite_url, "sqlite::memory:");
        assert_eq!(config.operator_chat_id.as_deref(), Some("9000"));
        assert_eq!(config.classifier, ClassifierBackend::Keyword);
        assert_eq!(config.log_dir, None);
        assert_eq!(config.log_format, LogFormat::Json);

        env::set_var("CLASSIFIER_BACKEND", "magic");
        assert!(matches!(AgentConfig::from_env(), Err(AgentError::Config(_))));
        env::remove_var("CLASSIFIER_BACKEND");

        env::set_var("LOG_FORMAT", "xml");
        assert!(AgentConfig::from_env().is_err());

        clear();
    }
}
