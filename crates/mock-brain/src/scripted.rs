//! Classifier that replays a queue of prepared results.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use brain_core::{async_trait, BrainError, Classification, HistoryMessage, IntentClassifier};
use tokio::sync::Mutex;

/// Returns queued classifications in order, then empty classifications.
///
/// A queued `None` makes that call fail, which is how tests exercise the
/// classifier-failure path.
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    queue: Mutex<VecDeque<Option<Classification>>>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier pre-loaded with `results`.
    pub fn with_results(results: impl IntoIterator<Item = Classification>) -> Self {
        Self {
            queue: Mutex::new(results.into_iter().map(Some).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub async fn push(&self, classification: Classification) {
        self.queue.lock().await.push_back(Some(classification));
    }

    pub async fn push_tags(&self, tags: &[&str]) {
        self.push(Classification::with_tags(tags.iter().copied())).await;
    }

    pub async fn push_failure(&self) {
        self.queue.lock().await.push_back(None);
    }

    /// Number of classify calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn classify(
        &self,
        _text: &str,
        _history: &[HistoryMessage],
    ) -> Result<Classification, BrainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.queue.lock().await.pop_front() {
            Some(Some(classification)) => Ok(classification),
            Some(None) => Err(BrainError::ProcessingFailed(
                "scripted classifier failure".to_string(),
            )),
            None => Ok(Classification::default()),
        }
    }

    fn name(&self) -> &str {
        "ScriptedClassifier"
    }
}
