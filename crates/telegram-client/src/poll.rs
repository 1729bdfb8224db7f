//! Long-polling update stream.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use futures::stream::{self, Stream};
use tracing::{debug, error, info, warn};

use crate::client::TelegramClient;
use crate::error::TelegramError;
use crate::types::Update;

/// Configuration for automatic reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive retries (None = infinite).
    pub max_retries: Option<u32>,
    /// Initial delay before first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier for each retry.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(delay_ms as u64).min(self.max_delay)
    }

    /// Check if we should retry after the given number of attempts.
    pub fn should_retry(&self, attempts: u32) -> bool {
        self.max_retries.map_or(true, |max| attempts < max)
    }
}

/// A stream of incoming updates.
///
/// Errors are yielded as they happen so the caller can log them; the stream
/// keeps polling until the retry budget is exhausted.
pub type UpdateStream = Pin<Box<dyn Stream<Item = Result<Update, TelegramError>> + Send>>;

struct PollState {
    client: TelegramClient,
    reconnect: ReconnectConfig,
    offset: i64,
    buffered: VecDeque<Update>,
    failures: u32,
    stopped: bool,
}

impl PollState {
    /// Remember a fetched batch and move the offset past it.
    fn accept(&mut self, updates: Vec<Update>) {
        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset = self.offset.max(last + 1);
        }
        self.buffered.extend(updates);
    }
}

/// Subscribe to updates with default reconnection behavior.
pub fn subscribe(client: &TelegramClient) -> UpdateStream {
    subscribe_with_reconnect(client, ReconnectConfig::default())
}

/// Subscribe to updates with custom reconnection configuration.
pub fn subscribe_with_reconnect(
    client: &TelegramClient,
    reconnect: ReconnectConfig,
) -> UpdateStream {
    info!("Starting long poll");

    let state = PollState {
        client: client.clone(),
        reconnect,
        offset: 0,
        buffered: VecDeque::new(),
        failures: 0,
        stopped: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(update) = state.buffered.pop_front() {
                return Some((Ok(update), state));
            }
            if state.stopped {
                return None;
            }

            let timeout = state.client.config().poll_timeout;
            match state.client.get_updates(state.offset, timeout).await {
                Ok(updates) => {
                    if state.failures > 0 {
                        info!("Long poll recovered after {} failures", state.failures);
                    }
                    state.failures = 0;
                    debug!("Fetched {} updates", updates.len());
                    state.accept(updates);
                }
                Err(e) => {
                    if !state.reconnect.should_retry(state.failures) {
                        error!("Giving up long poll after {} failures: {}", state.failures, e);
                        state.stopped = true;
                        return Some((Err(TelegramError::Poll(e.to_string())), state));
                    }

                    let delay = match &e {
                        TelegramError::Api {
                            retry_after: Some(secs),
                            ..
                        } => Duration::from_secs(*secs),
                        _ => state.reconnect.delay_for_attempt(state.failures),
                    };
                    state.failures += 1;
                    warn!("Long poll failed ({}), retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                    return Some((Err(e), state));
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_backoff_capped() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(20), Duration::from_secs(30));
    }

    #[test]
    fn test_should_retry() {
        let unlimited = ReconnectConfig::default();
        assert!(unlimited.should_retry(1_000));

        let limited = ReconnectConfig {
            max_retries: Some(2),
            ..Default::default()
        };
        assert!(limited.should_retry(1));
        assert!(!limited.should_retry(2));
    }
}
