//! Tracing setup for the binaries: stdout plus an optional daily log file.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{AgentConfig, LogFormat};
use crate::error::AgentError;

/// File name prefix of the rolling log.
pub const LOG_FILE_NAME: &str = "sales_bot.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// stops the file writer.
pub fn init_tracing(config: &AgentConfig) -> Result<Option<WorkerGuard>, AgentError> {
    let stdout = match config.log_format {
        LogFormat::Pretty => fmt::layer().boxed(),
        LogFormat::Json => fmt::layer().json().boxed(),
    };

    let (file, guard) = match config.log_dir {
        Some(ref dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| AgentError::Logging(format!("{}: {}", dir.display(), e)))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(stdout)
        .with(file)
        .try_init()
        .map_err(|e| AgentError::Logging(e.to_string()))?;

    Ok(guard)
}
