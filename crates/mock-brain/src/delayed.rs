//! Delayed brain implementation - wraps another brain with artificial delay.

use std::time::Duration;

use brain_core::{
    async_trait, BrainError, Classification, HistoryMessage, IntentClassifier, PromptContext,
    ReplyGenerator,
};
use tokio::time::sleep;

/// A brain that wraps another brain and adds artificial delay.
///
/// Useful for testing timeout handling and simulating model latency.
pub struct DelayedBrain<B> {
    inner: B,
    delay: Duration,
}

impl<B> DelayedBrain<B> {
    /// Create a new DelayedBrain wrapping the given brain with the specified delay.
    pub fn new(inner: B, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a brain with a delay in milliseconds.
    pub fn with_millis(inner: B, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Create a brain with a delay in seconds.
    pub fn with_secs(inner: B, secs: u64) -> Self {
        Self::new(inner, Duration::from_secs(secs))
    }
}

#[async_trait]
impl<B: IntentClassifier> IntentClassifier for DelayedBrain<B> {
    async fn classify(
        &self,
        text: &str,
        history: &[HistoryMessage],
    ) -> Result<Classification, BrainError> {
        sleep(self.delay).await;
        self.inner.classify(text, history).await
    }

    fn name(&self) -> &str {
        "DelayedBrain"
    }
}

#[async_trait]
impl<B: ReplyGenerator> ReplyGenerator for DelayedBrain<B> {
    async fn generate(&self, context: &PromptContext) -> Result<String, BrainError> {
        sleep(self.delay).await;
        self.inner.generate(context).await
    }

    async fn summarize(&self, history: &[HistoryMessage]) -> Result<String, BrainError> {
        sleep(self.delay).await;
        self.inner.summarize(history).await
    }

    fn name(&self) -> &str {
        "DelayedBrain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeywordClassifier, TemplateGenerator};
    use std::time::Instant;

    #[tokio::test]
    async fn test_delayed_classifier() {
        let brain = DelayedBrain::with_millis(KeywordClassifier::new(), 100);

        let start = Instant::now();
        let result = brain.classify("hello there", &[]).await.unwrap();
        let elapsed = start.elapsed();

        assert!(result.has_tag(brain_core::tags::GREETING));
        assert!(elapsed >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_delayed_generator_times_out() {
        let brain = DelayedBrain::with_secs(TemplateGenerator::new(), 5);
        let context = PromptContext::default();

        let result =
            tokio::time::timeout(Duration::from_millis(50), brain.generate(&context)).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_brain_name() {
        let brain = DelayedBrain::with_millis(KeywordClassifier::new(), 0);
        assert_eq!(IntentClassifier::name(&brain), "DelayedBrain");
    }
}
