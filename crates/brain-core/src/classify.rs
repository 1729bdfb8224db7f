//! Intent classification contract.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BrainError;
use crate::history::HistoryMessage;

/// Entities a classifier may pull out of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entities {
    pub name: Option<String>,
    pub farm_name: Option<String>,
    pub location: Option<String>,
    pub pivot_count: Option<u32>,
    pub pump_count: Option<u32>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Output of [`IntentClassifier::classify`].
///
/// An empty classification (no tags, no labels) is what the pipeline uses
/// when the classifier fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Classification {
    /// Semantic tags detected in this message.
    pub tags: BTreeSet<String>,
    /// Inferred customer profile label (e.g. "technical", "skeptical").
    pub profile: Option<String>,
    /// Free-form sentiment label.
    pub sentiment: Option<String>,
    /// Extracted entities.
    pub entities: Entities,
    /// Coarse journey phase (discovery / consideration / decision).
    pub journey_stage: Option<String>,
}

impl Classification {
    /// Classification carrying only the given tags.
    pub fn with_tags<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
            && self.profile.is_none()
            && self.sentiment.is_none()
            && self.journey_stage.is_none()
            && self.entities.is_empty()
    }
}

/// A backend that classifies free text into tags, entities and labels.
///
/// Model-backed and keyword-rule implementations are interchangeable; the
/// conversation engine never assumes which one it is talking to.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify `text`, using `history` (oldest first) as context.
    async fn classify(
        &self,
        text: &str,
        history: &[HistoryMessage],
    ) -> Result<Classification, BrainError>;

    /// Get a human-readable name for this classifier.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_classification() {
        let json = r#"{"tags": ["GREETING"], "entities": {"pivot_count": 3}}"#;
        let parsed: Classification = serde_json::from_str(json).unwrap();

        assert!(parsed.has_tag("GREETING"));
        assert_eq!(parsed.entities.pivot_count, Some(3));
        assert!(parsed.profile.is_none());
        assert!(!parsed.is_empty());
    }

    #[test]
    fn test_default_is_empty() {
        assert!(Classification::default().is_empty());
        assert!(!Classification::with_tags(["QUOTE_REQUEST"]).is_empty());
    }
}
