//! The partial-update contract for customer records.
//!
//! Every mutation of a [`Customer`] goes through a [`CustomerUpdate`]. Each
//! field has a fixed merge rule:
//!
//! | field                    | rule                                               |
//! |--------------------------|----------------------------------------------------|
//! | scalars (name, state, …) | replace when set                                   |
//! | `tags`                   | union                                              |
//! | `conversation_history`   | append, then keep the newest [`MAX_HISTORY_MESSAGES`] |
//! | `lead_score`             | replace; a score-history entry is appended only when the value changes |
//! | `hot_lead_notified`, `video_sent` | latch (can only be set to `true`)         |
//! | `last_contact_at`        | refreshed unless the update opts out               |
//! | `decayed_through`        | replace when set                                   |

use std::collections::BTreeSet;

use brain_core::{push_bounded, HistoryMessage, MAX_HISTORY_MESSAGES};
use chrono::{DateTime, Utc};

use crate::models::{ConversationState, Customer, ScorePoint};

/// A set of field changes applied atomically to one customer.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub farm_name: Option<String>,
    pub location: Option<String>,
    pub profile: Option<String>,
    pub pain_point: Option<String>,
    pub state: Option<ConversationState>,
    /// `Some(None)` clears the stored previous state.
    pub previous_state: Option<Option<ConversationState>>,
    pub pivots: Option<u32>,
    pub pumps: Option<u32>,
    pub quote_total: Option<f64>,
    pub add_tags: BTreeSet<String>,
    pub lead_score: Option<i64>,
    pub append_history: Vec<HistoryMessage>,
    pub follow_up_level: Option<u8>,
    pub mark_hot_lead_notified: bool,
    pub mark_video_sent: bool,
    pub decayed_through: Option<DateTime<Utc>>,
    pub touch_contact: bool,
}

impl Default for CustomerUpdate {
    fn default() -> Self {
        Self {
            name: None,
            farm_name: None,
            location: None,
            profile: None,
            pain_point: None,
            state: None,
            previous_state: None,
            pivots: None,
            pumps: None,
            quote_total: None,
            add_tags: BTreeSet::new(),
            lead_score: None,
            append_history: Vec::new(),
            follow_up_level: None,
            mark_hot_lead_notified: false,
            mark_video_sent: false,
            decayed_through: None,
            touch_contact: true,
        }
    }
}

impl CustomerUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn farm_name(mut self, farm_name: impl Into<String>) -> Self {
        self.farm_name = Some(farm_name.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn pain_point(mut self, pain_point: impl Into<String>) -> Self {
        self.pain_point = Some(pain_point.into());
        self
    }

    pub fn state(mut self, state: ConversationState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn previous_state(mut self, state: Option<ConversationState>) -> Self {
        self.previous_state = Some(state);
        self
    }

    pub fn equipment(mut self, pivots: u32, pumps: u32) -> Self {
        self.pivots = Some(pivots);
        self.pumps = Some(pumps);
        self
    }

    pub fn pivots(mut self, pivots: u32) -> Self {
        self.pivots = Some(pivots);
        self
    }

    pub fn pumps(mut self, pumps: u32) -> Self {
        self.pumps = Some(pumps);
        self
    }

    pub fn quote_total(mut self, total: f64) -> Self {
        self.quote_total = Some(total.max(0.0));
        self
    }

    pub fn add_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.add_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn lead_score(mut self, score: i64) -> Self {
        self.lead_score = Some(score);
        self
    }

    pub fn append_history(mut self, message: HistoryMessage) -> Self {
        self.append_history.push(message);
        self
    }

    pub fn follow_up_level(mut self, level: u8) -> Self {
        self.follow_up_level = Some(level.min(2));
        self
    }

    pub fn mark_hot_lead_notified(mut self) -> Self {
        self.mark_hot_lead_notified = true;
        self
    }

    pub fn mark_video_sent(mut self) -> Self {
        self.mark_video_sent = true;
        self
    }

    /// Record that idle time up to `at` has been charged against the score.
    pub fn decayed_through(mut self, at: DateTime<Utc>) -> Self {
        self.decayed_through = Some(at);
        self
    }

    /// Leave `last_contact_at` untouched so idle time keeps accumulating.
    pub fn without_touch(mut self) -> Self {
        self.touch_contact = false;
        self
    }

    /// Fold `other` into this update; `other` wins where both set a scalar.
    pub fn merge(mut self, other: CustomerUpdate) -> Self {
        self.name = other.name.or(self.name);
        self.farm_name = other.farm_name.or(self.farm_name);
        self.location = other.location.or(self.location);
        self.profile = other.profile.or(self.profile);
        self.pain_point = other.pain_point.or(self.pain_point);
        self.state = other.state.or(self.state);
        self.previous_state = other.previous_state.or(self.previous_state);
        self.pivots = other.pivots.or(self.pivots);
        self.pumps = other.pumps.or(self.pumps);
        self.quote_total = other.quote_total.or(self.quote_total);
        self.add_tags.extend(other.add_tags);
        self.lead_score = other.lead_score.or(self.lead_score);
        self.append_history.extend(other.append_history);
        self.follow_up_level = other.follow_up_level.or(self.follow_up_level);
        self.mark_hot_lead_notified |= other.mark_hot_lead_notified;
        self.mark_video_sent |= other.mark_video_sent;
        self.decayed_through = other.decayed_through.or(self.decayed_through);
        self.touch_contact &= other.touch_contact;
        self
    }

    /// Apply this update to `customer` in place.
    pub fn apply(&self, customer: &mut Customer, now: DateTime<Utc>) {
        if let Some(ref name) = self.name {
            customer.name = name.clone();
        }
        if let Some(ref farm_name) = self.farm_name {
            customer.farm_name = Some(farm_name.clone());
        }
        if let Some(ref location) = self.location {
            customer.location = Some(location.clone());
        }
        if let Some(ref profile) = self.profile {
            customer.profile = profile.clone();
        }
        if let Some(ref pain_point) = self.pain_point {
            customer.pain_point = Some(pain_point.clone());
        }
        if let Some(state) = self.state {
            customer.state = state;
        }
        if let Some(previous) = self.previous_state {
            customer.previous_state = previous;
        }
        if let Some(pivots) = self.pivots {
            customer.equipment.pivots = pivots;
        }
        if let Some(pumps) = self.pumps {
            customer.equipment.pumps = pumps;
        }
        if let Some(total) = self.quote_total {
            customer.quote_total = total;
        }

        customer.tags.extend(self.add_tags.iter().cloned());

        if let Some(score) = self.lead_score {
            let score = score.max(0);
            if score != customer.lead_score {
                customer.lead_score = score;
                customer.score_history.push(ScorePoint { score, at: now });
            }
        }

        if !self.append_history.is_empty() {
            push_bounded(
                &mut customer.conversation_history,
                self.append_history.iter().cloned(),
                MAX_HISTORY_MESSAGES,
            );
        }

        if let Some(level) = self.follow_up_level {
            customer.follow_up_level = level;
        }

        customer.hot_lead_notified |= self.mark_hot_lead_notified;
        customer.video_sent |= self.mark_video_sent;

        if let Some(at) = self.decayed_through {
            customer.decayed_through = Some(at);
        }

        if self.touch_contact {
            customer.last_contact_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn customer() -> Customer {
        let created = Utc::now() - Duration::days(2);
        let mut customer = Customer::new("42", "Ana", created);
        customer.tags.insert("GREETING".to_string());
        customer
    }

    #[test]
    fn test_tags_union() {
        let mut c = customer();
        CustomerUpdate::new()
            .add_tags(["QUOTE_REQUEST"])
            .apply(&mut c, Utc::now());

        assert!(c.tags.contains("GREETING"));
        assert!(c.tags.contains("QUOTE_REQUEST"));
    }

    #[test]
    fn test_score_history_appended_only_on_change() {
        let mut c = customer();
        let now = Utc::now();

        CustomerUpdate::new().lead_score(0).apply(&mut c, now);
        assert!(c.score_history.is_empty());

        CustomerUpdate::new().lead_score(25).apply(&mut c, now);
        assert_eq!(c.lead_score, 25);
        assert_eq!(c.score_history.last().map(|p| p.score), Some(25));

        CustomerUpdate::new().lead_score(25).apply(&mut c, now);
        assert_eq!(c.score_history.len(), 1);
    }

    #[test]
    fn test_negative_score_clamped() {
        let mut c = customer();
        c.lead_score = 10;
        CustomerUpdate::new().lead_score(-7).apply(&mut c, Utc::now());

        assert_eq!(c.lead_score, 0);
        assert_eq!(c.score_history.last().map(|p| p.score), Some(0));
    }

    #[test]
    fn test_history_bounded() {
        let mut c = customer();
        for i in 0..40 {
            CustomerUpdate::new()
                .append_history(HistoryMessage::user(format!("msg {}", i)))
                .apply(&mut c, Utc::now());
            assert!(c.conversation_history.len() <= MAX_HISTORY_MESSAGES);
        }
        assert_eq!(c.conversation_history[0].content, "msg 10");
    }

    #[test]
    fn test_touch_contact() {
        let mut c = customer();
        let before = c.last_contact_at;
        let now = Utc::now();

        CustomerUpdate::new()
            .lead_score(3)
            .without_touch()
            .apply(&mut c, now);
        assert_eq!(c.last_contact_at, before);

        CustomerUpdate::new().apply(&mut c, now);
        assert_eq!(c.last_contact_at, now);
    }

    #[test]
    fn test_decayed_through_without_touch() {
        let mut c = customer();
        let before = c.last_contact_at;
        let charged = before + Duration::days(1);

        CustomerUpdate::new()
            .lead_score(4)
            .decayed_through(charged)
            .without_touch()
            .apply(&mut c, Utc::now());

        assert_eq!(c.decayed_through, Some(charged));
        assert_eq!(c.last_contact_at, before);
        assert_eq!(c.decay_anchor(), charged);
    }

    #[test]
    fn test_latches_never_unset() {
        let mut c = customer();
        CustomerUpdate::new()
            .mark_hot_lead_notified()
            .mark_video_sent()
            .apply(&mut c, Utc::now());
        CustomerUpdate::new().apply(&mut c, Utc::now());

        assert!(c.hot_lead_notified);
        assert!(c.video_sent);
    }

    #[test]
    fn test_merge_rules() {
        let merged = CustomerUpdate::new()
            .state(ConversationState::AwaitingName)
            .add_tags(["A"])
            .append_history(HistoryMessage::user("hi"))
            .merge(
                CustomerUpdate::new()
                    .state(ConversationState::AwaitingLocation)
                    .add_tags(["B"])
                    .append_history(HistoryMessage::assistant("hello"))
                    .without_touch(),
            );

        assert_eq!(merged.state, Some(ConversationState::AwaitingLocation));
        assert_eq!(merged.add_tags.len(), 2);
        assert_eq!(merged.append_history.len(), 2);
        assert!(!merged.touch_contact);
    }

    #[test]
    fn test_previous_state_cleared() {
        let mut c = customer();
        c.previous_state = Some(ConversationState::Closing);
        CustomerUpdate::new()
            .previous_state(None)
            .apply(&mut c, Utc::now());
        assert_eq!(c.previous_state, None);
    }
}
