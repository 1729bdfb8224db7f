//! Lead scoring.
//!
//! A message moves the score only through tags the customer has not been
//! credited for before; repeating an objection does not re-inflate the
//! score. The result is floored at 0 and unbounded above.

use std::collections::BTreeSet;

use crate::config::EngineConfig;

/// Outcome of scoring one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub previous: i64,
    pub score: i64,
    pub delta: i64,
    /// Tags from this message that were not yet on the customer.
    pub new_tags: BTreeSet<String>,
}

impl ScoreOutcome {
    pub fn changed(&self) -> bool {
        self.score != self.previous
    }
}

/// Score the tags detected in one message.
pub fn score_message(
    current_score: i64,
    known_tags: &BTreeSet<String>,
    detected: &BTreeSet<String>,
    config: &EngineConfig,
) -> ScoreOutcome {
    let new_tags: BTreeSet<String> = detected.difference(known_tags).cloned().collect();
    let delta: i64 = new_tags.iter().map(|tag| config.weight(tag)).sum();

    ScoreOutcome {
        previous: current_score,
        score: (current_score + delta).max(0),
        delta,
        new_tags,
    }
}

/// Score after `days_idle` days at `rate_per_day`, floored at 0.
pub fn decay_score(current_score: i64, days_idle: i64, rate_per_day: i64) -> i64 {
    if days_idle <= 0 || current_score <= 0 {
        return current_score.max(0);
    }
    (current_score - days_idle.saturating_mul(rate_per_day)).max(0)
}
