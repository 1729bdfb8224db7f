//! Database models.

use std::collections::BTreeSet;
use std::fmt;

use brain_core::HistoryMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile assigned to customers the classifier has not labelled yet.
pub const DEFAULT_PROFILE: &str = "neutral";

/// Where a customer is in the qualification conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    Initial,
    AwaitingName,
    AwaitingLocation,
    AwaitingPainPoint,
    AwaitingPain,
    ConfirmingInterest,
    PresentingSolution,
    AwaitingQuoteQuantity,
    AwaitingPivotCount,
    AwaitingPumpCount,
    QuotePresented,
    GeneralConversation,
    ObjectionHandling,
    Closing,
    DeliveryTimelineQuestion,
    PausedByOperator,
    FollowUpFinalized,
}

impl ConversationState {
    /// Every state, in flow order.
    pub const ALL: [ConversationState; 17] = [
        ConversationState::Initial,
        ConversationState::AwaitingName,
        ConversationState::AwaitingLocation,
        ConversationState::AwaitingPainPoint,
        ConversationState::AwaitingPain,
        ConversationState::ConfirmingInterest,
        ConversationState::PresentingSolution,
        ConversationState::AwaitingQuoteQuantity,
        ConversationState::AwaitingPivotCount,
        ConversationState::AwaitingPumpCount,
        ConversationState::QuotePresented,
        ConversationState::GeneralConversation,
        ConversationState::ObjectionHandling,
        ConversationState::Closing,
        ConversationState::DeliveryTimelineQuestion,
        ConversationState::PausedByOperator,
        ConversationState::FollowUpFinalized,
    ];

    /// Get the stored representation of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Initial => "INITIAL",
            ConversationState::AwaitingName => "AWAITING_NAME",
            ConversationState::AwaitingLocation => "AWAITING_LOCATION",
            ConversationState::AwaitingPainPoint => "AWAITING_PAIN_POINT",
            ConversationState::AwaitingPain => "AWAITING_PAIN",
            ConversationState::ConfirmingInterest => "CONFIRMING_INTEREST",
            ConversationState::PresentingSolution => "PRESENTING_SOLUTION",
            ConversationState::AwaitingQuoteQuantity => "AWAITING_QUOTE_QUANTITY",
            ConversationState::AwaitingPivotCount => "AWAITING_PIVOT_COUNT",
            ConversationState::AwaitingPumpCount => "AWAITING_PUMP_COUNT",
            ConversationState::QuotePresented => "QUOTE_PRESENTED",
            ConversationState::GeneralConversation => "GENERAL_CONVERSATION",
            ConversationState::ObjectionHandling => "OBJECTION_HANDLING",
            ConversationState::Closing => "CLOSING",
            ConversationState::DeliveryTimelineQuestion => "DELIVERY_TIMELINE_QUESTION",
            ConversationState::PausedByOperator => "PAUSED_BY_OPERATOR",
            ConversationState::FollowUpFinalized => "FOLLOW_UP_FINALIZED",
        }
    }

    /// Parse a stored state name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|state| state.as_str() == s)
    }

    /// Parse a stored state name, treating unknown values as the generic
    /// conversation state.
    pub fn from_stored(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|| {
            tracing::warn!(
                "Unknown conversation state '{}', treating as {}",
                s,
                ConversationState::GeneralConversation
            );
            ConversationState::GeneralConversation
        })
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a customer's score history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub score: i64,
    pub at: DateTime<Utc>,
}

/// Equipment the customer wants protected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentCounts {
    pub pivots: u32,
    pub pumps: u32,
}

impl EquipmentCounts {
    pub fn total(&self) -> u64 {
        u64::from(self.pivots) + u64::from(self.pumps)
    }
}

/// A customer record, one per chat participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Opaque stable identifier (the chat id).
    pub id: String,
    pub name: String,
    pub farm_name: Option<String>,
    pub location: Option<String>,
    pub profile: String,
    pub pain_point: Option<String>,
    pub state: ConversationState,
    /// Set only while paused, for resume.
    pub previous_state: Option<ConversationState>,
    pub equipment: EquipmentCounts,
    /// 0 means no quote has been issued.
    pub quote_total: f64,
    pub tags: BTreeSet<String>,
    pub lead_score: i64,
    pub score_history: Vec<ScorePoint>,
    pub conversation_history: Vec<HistoryMessage>,
    /// Which follow-up message (0..=2) has been sent.
    pub follow_up_level: u8,
    pub hot_lead_notified: bool,
    pub video_sent: bool,
    pub created_at: DateTime<Utc>,
    pub last_contact_at: DateTime<Utc>,
    /// How far idle time has been charged against the score. Only
    /// meaningful while it is later than `last_contact_at`.
    #[serde(default)]
    pub decayed_through: Option<DateTime<Utc>>,
}

impl Customer {
    /// A fresh record in the `INITIAL` state.
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            farm_name: None,
            location: None,
            profile: DEFAULT_PROFILE.to_string(),
            pain_point: None,
            state: ConversationState::Initial,
            previous_state: None,
            equipment: EquipmentCounts::default(),
            quote_total: 0.0,
            tags: BTreeSet::new(),
            lead_score: 0,
            score_history: Vec::new(),
            conversation_history: Vec::new(),
            follow_up_level: 0,
            hot_lead_notified: false,
            video_sent: false,
            created_at: now,
            last_contact_at: now,
            decayed_through: None,
        }
    }

    /// Whole days elapsed since the last contact, never negative.
    pub fn days_idle(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_contact_at).num_days().max(0)
    }

    /// Start of the idle stretch not yet charged by score decay.
    pub fn decay_anchor(&self) -> DateTime<Utc> {
        match self.decayed_through {
            Some(at) if at > self.last_contact_at => at,
            _ => self.last_contact_at,
        }
    }

    /// Whole idle days not yet charged by score decay.
    pub fn undecayed_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.decay_anchor()).num_days().max(0)
    }

    pub fn is_paused(&self) -> bool {
        self.state == ConversationState::PausedByOperator
    }

    pub fn has_quote(&self) -> bool {
        self.quote_total > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_state_round_trip_names() {
        for state in ConversationState::ALL {
            assert_eq!(ConversationState::parse(state.as_str()), Some(state));
        }
    }

    #[test]
    fn test_unknown_state_falls_through() {
        assert_eq!(ConversationState::parse("AGUARDANDO_FOO"), None);
        assert_eq!(
            ConversationState::from_stored("AGUARDANDO_FOO"),
            ConversationState::GeneralConversation
        );
    }

    #[test]
    fn test_days_idle_whole_days() {
        let now = Utc::now();
        let mut customer = Customer::new("1", "Ana", now);

        customer.last_contact_at = now - Duration::hours(95);
        assert_eq!(customer.days_idle(now), 3);

        customer.last_contact_at = now + Duration::hours(5);
        assert_eq!(customer.days_idle(now), 0);
    }

    #[test]
    fn test_equipment_total_does_not_wrap() {
        let equipment = EquipmentCounts {
            pivots: u32::MAX,
            pumps: 1,
        };
        assert_eq!(equipment.total(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn test_undecayed_days_start_after_charged_stretch() {
        let now = Utc::now();
        let mut customer = Customer::new("1", "Ana", now - Duration::days(10));
        assert_eq!(customer.undecayed_days(now), 10);

        customer.decayed_through = Some(now - Duration::days(4));
        assert_eq!(customer.undecayed_days(now), 4);
        assert_eq!(customer.days_idle(now), 10);

        // Contact after the charged stretch starts a new one.
        customer.last_contact_at = now - Duration::days(1);
        assert_eq!(customer.decay_anchor(), customer.last_contact_at);
        assert_eq!(customer.undecayed_days(now), 1);
    }
}
