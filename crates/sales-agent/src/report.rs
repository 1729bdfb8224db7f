//! Plain-text rendering of customer records and sweep results.

use std::fmt::Write;

use brain_core::format_transcript;
use database::Customer;
use orchestrator::{format_money, DecayReport};

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

/// Render one customer record for the terminal.
pub fn render_customer(customer: &Customer) -> String {
    let mut out = String::new();
    let tags = if customer.tags.is_empty() {
        "none".to_string()
    } else {
        customer.tags.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    let quote = if customer.has_quote() {
        format_money(customer.quote_total)
    } else {
        "none".to_string()
    };

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Customer {} ({})", customer.id, customer.name);
    let _ = writeln!(out, "  profile:        {}", customer.profile);
    let _ = writeln!(out, "  state:          {}", customer.state);
    if let Some(previous) = customer.previous_state {
        let _ = writeln!(out, "  paused from:    {}", previous);
    }
    let _ = writeln!(out, "  lead score:     {}", customer.lead_score);
    let _ = writeln!(out, "  farm:           {}", or_na(&customer.farm_name));
    let _ = writeln!(out, "  location:       {}", or_na(&customer.location));
    let _ = writeln!(out, "  pain point:     {}", or_na(&customer.pain_point));
    let _ = writeln!(
        out,
        "  equipment:      {} pivots, {} pumps",
        customer.equipment.pivots, customer.equipment.pumps
    );
    let _ = writeln!(out, "  quote:          {}", quote);
    let _ = writeln!(out, "  hot lead sent:  {}", customer.hot_lead_notified);
    let _ = writeln!(out, "  follow-ups:     {}", customer.follow_up_level);
    let _ = writeln!(out, "  tags:           {}", tags);
    let _ = writeln!(
        out,
        "  last contact:   {}",
        customer.last_contact_at.format("%Y-%m-%d %H:%M UTC")
    );

    out.push_str("\nTranscript:\n");
    if customer.conversation_history.is_empty() {
        out.push_str("  (empty)\n");
    } else {
        out.push_str(&format_transcript(&customer.conversation_history));
        out.push('\n');
    }
    out
}

/// One-line summary of a decay sweep.
pub fn summarize_sweep(report: &DecayReport) -> String {
    format!(
        "scanned {}, decayed {}, follow-ups sent {}, finalized {}, failures {}",
        report.scanned, report.decayed, report.follow_ups_sent, report.finalized, report.failures
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::HistoryMessage;
    use chrono::Utc;
    use database::ConversationState;

    #[test]
    fn test_render_fresh_customer() {
        let customer = Customer::new("1001", "Ana", Utc::now());
        let text = render_customer(&customer);

        assert!(text.starts_with("Customer 1001 (Ana)"));
        assert!(text.contains("state:          INITIAL"));
        assert!(text.contains("farm:           N/A"));
        assert!(text.contains("quote:          none"));
        assert!(text.contains("tags:           none"));
        assert!(text.contains("(empty)"));
        assert!(!text.contains("paused from"));
    }

    #[test]
    fn test_render_qualified_customer() {
        let mut customer = Customer::new("1001", "Ana", Utc::now());
        customer.farm_name = Some("Boa Vista".into());
        customer.state = ConversationState::PausedByOperator;
        customer.previous_state = Some(ConversationState::QuotePresented);
        customer.quote_total = 43_200.0;
        customer.tags.insert("OWN_THEFT".into());
        customer.tags.insert("QUOTE_REQUEST".into());
        customer.conversation_history = vec![
            HistoryMessage::user("how much?"),
            HistoryMessage::assistant("Here is your quote"),
        ];

        let text = render_customer(&customer);
        assert!(text.contains("farm:           Boa Vista"));
        assert!(text.contains("paused from:    QUOTE_PRESENTED"));
        assert!(text.contains("R$ 43,200.00"));
        assert!(text.contains("OWN_THEFT, QUOTE_REQUEST"));
        assert!(text.contains("Customer: how much?\nAssistant: Here is your quote"));
    }

    #[test]
    fn test_summarize_sweep() {
        let report = DecayReport {
            scanned: 4,
            decayed: 2,
            follow_ups_sent: 1,
            finalized: 0,
            failures: 1,
        };
        assert_eq!(
            summarize_sweep(&report),
            "scanned 4, decayed 2, follow-ups sent 1, finalized 0, failures 1"
        );
    }
}
