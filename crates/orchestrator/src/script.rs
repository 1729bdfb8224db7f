//! Fixed customer-facing texts and per-state reply directives.

use database::ConversationState;

use crate::sender::ChoiceOption;

pub const GREETING: &str = "Hello! I'm Sarah, the farm security specialist at Irricontrol. \
Happy to help. To get started, what should I call you?";

pub const LOCATION_QUESTION: &str =
    "Nice to meet you, {name}! Where is your farm located (town and state)?";

pub const PAIN_QUESTION: &str =
    "Thanks! What worries you most about security on the farm today?";

pub const QUANTITY_QUESTION: &str = "Sure, {name}! To put the quote together, \
how many pivots or pump houses would you like to protect?";

pub const PIVOT_QUESTION: &str =
    "Sure, {name}! How many irrigation pivots would you like to protect?";

pub const PUMP_QUESTION: &str = "And how many pump houses?";

pub const QUANTITY_REPROMPT: &str =
    "Sorry, I didn't catch the number. How many pivots or pump houses should the quote cover?";

/// Sent whenever a reply could not be produced.
pub const FALLBACK_REPLY: &str =
    "Sorry, I had a problem on my side just now. Could you send that again in a moment?";

pub const DEMO_CAPTION: &str = "Here's the system in action, so you can see how sturdy it is!";

/// Recorded in the conversation history when the demo video goes out.
pub const DEMO_HISTORY_NOTE: &str = "[DEMO VIDEO SENT]";

pub const FOLLOW_UP_FIRST: &str = "Hi {name}! How are things?\n\n\
This is Sarah from Irricontrol. I wanted to check whether you had a chance to look at \
the anti-theft system proposal I sent you.\n\n\
Any questions I can help clear up? I'm here for you!";

pub const FOLLOW_UP_SECOND: &str = "Hi {name}, I hope all is well.\n\n\
You came to mind because we are closing the installation schedule for the coming weeks \
in your region. Many growers have already secured that peace of mind so they can focus \
fully on production.\n\n\
Does this security investment still make sense for you?";

/// Prefix of history entries written by the follow-up job.
pub const FOLLOW_UP_HISTORY_PREFIX: &str = "[AUTOMATED FOLLOW-UP]";

pub const RESET_DONE: &str =
    "All done! I've forgotten our history. We can start over from scratch.";

pub const RESET_NOTHING: &str = "I couldn't find any record of yours to forget.";

pub const OPERATOR_HELP: &str = "Operator commands:\n\
/pause <customerId> - stop answering a customer\n\
/resume <customerId> - hand the customer back to the bot\n\
/reset <customerId> - delete a customer record\n\
/status <customerId> - show state, score and tags";

/// Pain-point menu shown at the end of onboarding.
pub const PAIN_MENU: &[(&str, &str, &str)] = &[
    ("theft", "I've had equipment stolen", brain_core::tags::OWN_THEFT),
    (
        "regional",
        "Thefts are happening in my region",
        brain_core::tags::REGIONAL_INSECURITY,
    ),
    (
        "downtime",
        "Irrigation downtime is costing me",
        brain_core::tags::OPERATIONAL_LOSS,
    ),
    ("prevention", "I just want to prevent problems", brain_core::tags::PREVENTION),
];

/// Menu options as sendable choices.
pub fn pain_menu() -> Vec<ChoiceOption> {
    PAIN_MENU
        .iter()
        .map(|(id, label, _)| ChoiceOption::new(*id, *label))
        .collect()
}

/// `(label, tag)` of a pain menu option.
pub fn pain_option(id: &str) -> Option<(&'static str, &'static str)> {
    PAIN_MENU
        .iter()
        .find(|(option, _, _)| *option == id)
        .map(|(_, label, tag)| (*label, *tag))
}

/// Substitute `{name}`, falling back to a neutral address for blank names.
pub fn personalize(template: &str, name: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { "there" } else { name };
    template.replace("{name}", name)
}

/// Instruction for the reply generator when answering in `state`.
pub fn directive_for(state: ConversationState, delivery_lead_time: &str) -> String {
    match state {
        ConversationState::ConfirmingInterest => {
            "Acknowledge the pain the customer described, connect it to what an unprotected \
             pivot or pump house costs, and ask whether they would like to see how the \
             anti-theft system works."
                .to_string()
        }
        ConversationState::PresentingSolution => {
            "Present the satellite anti-theft system: jammer-proof communication, local siren, \
             instant alerts to the 24h monitoring center and the customer's phone, solar \
             powered. Tie it to the customer's pain and offer a quote."
                .to_string()
        }
        ConversationState::QuotePresented => {
            "The quote was just sent. Anchor its value against the loss of a single theft, \
             never offer discounts, and ask what the customer thinks."
                .to_string()
        }
        ConversationState::ObjectionHandling => {
            "The customer raised a price or timing objection. Validate it, anchor on value \
             and the cost of doing nothing, never offer discounts, and keep the conversation \
             open with a question."
                .to_string()
        }
        ConversationState::Closing => {
            "The customer wants to buy. Confirm enthusiastically, tell them a specialist will \
             contact them shortly to finalize, and ask for the best time to reach them."
                .to_string()
        }
        ConversationState::DeliveryTimelineQuestion => format!(
            "Answer the delivery question: manufacturing and installation take about {}. \
             Reassure the customer and ask if they want to reserve a slot.",
            delivery_lead_time
        ),
        _ => "Answer the customer's message as a consultative farm security specialist, \
              focusing on their pain, and end with an open question."
            .to_string(),
    }
}
