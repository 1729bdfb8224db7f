//! Message processor that connects the Telegram update stream to the
//! conversation engine.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use orchestrator::{script, Orchestrator, OrchestratorError, Outcome};
use telegram_client::{TelegramClient, TelegramError, Update};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::convert::{to_inbound, SkipReason};

/// Configuration for the message processor.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Only serve private chats.
    pub private_only: bool,

    /// Maximum number of updates handled concurrently. Messages of one
    /// customer are still serialized by the engine.
    pub max_in_flight: usize,

    /// How long to wait for in-flight messages on shutdown.
    pub shutdown_grace: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            private_only: true,
            max_in_flight: 32,
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

/// Errors that can occur during message processing.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Error from the Bot API.
    #[error("telegram error: {0}")]
    Telegram(#[from] TelegramError),

    /// The engine failed to handle the message.
    #[error("engine error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    /// The update stream ended unexpectedly.
    #[error("update stream ended")]
    StreamEnded,
}

/// Result of processing a single update.
#[derive(Debug)]
pub enum ProcessResult {
    /// The engine handled the message.
    Handled {
        customer_id: String,
        outcome: Outcome,
    },
    /// The update was not meant for the engine.
    Skipped { reason: SkipReason },
    /// The engine failed; the customer got the fallback reply.
    Error(ProcessorError),
}

/// Receives Telegram updates and runs each through the [`Orchestrator`].
pub struct MessageProcessor {
    client: TelegramClient,
    orchestrator: Arc<Orchestrator>,
    config: ProcessorConfig,
}

impl MessageProcessor {
    pub fn new(
        client: TelegramClient,
        orchestrator: Arc<Orchestrator>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            client,
            orchestrator,
            config,
        }
    }

    /// Create a processor with default configuration.
    pub fn with_defaults(client: TelegramClient, orchestrator: Arc<Orchestrator>) -> Self {
        Self::new(client, orchestrator, ProcessorConfig::default())
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn client(&self) -> &TelegramClient {
        &self.client
    }

    /// Process a single update and return the result.
    pub async fn process_update(&self, update: &Update) -> ProcessResult {
        if let Some(ref query) = update.callback_query {
            if let Err(e) = self.client.answer_callback_query(&query.id, None).await {
                warn!("Failed to answer callback query {}: {}", query.id, e);
            }
        }

        let inbound = match to_inbound(update, self.config.private_only) {
            Ok(inbound) => inbound,
            Err(reason) => return ProcessResult::Skipped { reason },
        };

        let customer_id = inbound.customer_id.clone();
        info!(customer_id = %customer_id, "Processing: {}", inbound.content.as_text());

        match self.orchestrator.process(inbound).await {
            Ok(outcome) => ProcessResult::Handled {
                customer_id,
                outcome,
            },
            Err(e) => {
                error!(customer_id = %customer_id, "Engine error: {}", e);
                self.send_fallback(&customer_id).await;
                ProcessResult::Error(ProcessorError::Orchestrator(e))
            }
        }
    }

    /// The customer never sees a raw error or silence.
    async fn send_fallback(&self, customer_id: &str) {
        let chat_id = match telegram_client::parse_chat_id(customer_id) {
            Ok(id) => id,
            Err(e) => {
                warn!("Cannot send fallback: {}", e);
                return;
            }
        };
        if let Err(e) = self.client.send_text(chat_id, script::FALLBACK_REPLY).await {
            error!(customer_id = %customer_id, "Failed to send fallback reply: {}", e);
        }
    }

    /// Run the processor until the update stream ends.
    pub async fn run(self) -> Result<(), ProcessorError> {
        self.run_with_shutdown(futures::future::pending()).await
    }

    /// Run the processor with graceful shutdown support.
    ///
    /// Updates are handled concurrently (up to `max_in_flight`). When the
    /// shutdown signal completes, no new updates are taken and in-flight
    /// ones get `shutdown_grace` to finish.
    pub async fn run_with_shutdown<S>(self, shutdown_signal: S) -> Result<(), ProcessorError>
    where
        S: std::future::Future<Output = ()> + Send,
    {
        info!(
            "Starting message processor (max in flight: {})",
            self.config.max_in_flight
        );

        let grace = self.config.shutdown_grace;
        let permits = Arc::new(Semaphore::new(self.config.max_in_flight.max(1)));
        let mut stream = telegram_client::subscribe(&self.client);
        let processor = Arc::new(self);
        let mut tasks = JoinSet::new();

        tokio::pin!(shutdown_signal);

        let result = loop {
            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping message processor");
                    break Ok(());
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!("Message task panicked: {}", e);
                    }
                }

                next = stream.next() => {
                    match next {
                        Some(Ok(update)) => {
                            let permit = match permits.clone().acquire_owned().await {
                                Ok(permit) => permit,
                                Err(_) => break Ok(()),
                            };
                            let processor = Arc::clone(&processor);
                            tasks.spawn(async move {
                                let result = processor.process_update(&update).await;
                                log_result(&result);
                                drop(permit);
                            });
                        }
                        Some(Err(TelegramError::Poll(reason))) => {
                            error!("Update stream gave up: {}", reason);
                            break Err(ProcessorError::StreamEnded);
                        }
                        Some(Err(e)) => {
                            // Reconnection is handled by the stream.
                            warn!("Stream error: {}", e);
                        }
                        None => {
                            warn!("Update stream ended");
                            break Err(ProcessorError::StreamEnded);
                        }
                    }
                }
            }
        };

        if !tasks.is_empty() {
            info!("Waiting for {} in-flight messages", tasks.len());
            let drain = async { while tasks.join_next().await.is_some() {} };
            if tokio::time::timeout(grace, drain).await.is_err() {
                warn!("In-flight messages did not finish within {:?}", grace);
                tasks.abort_all();
            }
        }

        result
    }

    /// Run the processor until Ctrl+C is pressed.
    #[cfg(feature = "signal")]
    pub async fn run_until_stopped(self) -> Result<(), ProcessorError> {
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                futures::future::pending::<()>().await;
            }
        };
        self.run_with_shutdown(shutdown).await
    }
}

fn log_result(result: &ProcessResult) {
    match result {
        ProcessResult::Handled {
            customer_id,
            outcome,
        } => match outcome {
            Outcome::Replied {
                state, delivered, ..
            } => debug!(
                customer_id = %customer_id,
                "Replied (state: {}, delivered: {})", state, delivered
            ),
            Outcome::Swallowed => debug!(customer_id = %customer_id, "Paused; no reply"),
            Outcome::Command { .. } => debug!(customer_id = %customer_id, "Command handled"),
        },
        ProcessResult::Skipped { reason } => debug!("Skipped: {}", reason),
        ProcessResult::Error(e) => warn!("Error processing update: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProcessorConfig::default();
        assert!(config.private_only);
        assert_eq!(config.max_in_flight, 32);
        assert_eq!(config.shutdown_grace, Duration::from_secs(10));
    }

    #[test]
    fn test_error_display() {
        let err = ProcessorError::from(OrchestratorError::Delivery("blocked".into()));
        assert_eq!(err.to_string(), "engine error: delivery failed: blocked");
        assert_eq!(ProcessorError::StreamEnded.to_string(), "update stream ended");
    }
}
