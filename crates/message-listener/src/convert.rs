//! Conversion from Telegram updates to engine messages.

use chrono::{DateTime, Utc};
use orchestrator::InboundMessage;
use telegram_client::{Message, Update};

/// Why an update is not handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither a message nor a button press.
    Unsupported,
    /// Sent by a bot (including ourselves).
    FromBot,
    /// Group or channel traffic while only private chats are served.
    NotPrivate,
    /// A message without text or caption, e.g. a sticker.
    NoText,
    /// A button press without callback data.
    NoChoice,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SkipReason::Unsupported => "unsupported update kind",
            SkipReason::FromBot => "message from a bot",
            SkipReason::NotPrivate => "not a private chat",
            SkipReason::NoText => "no text content",
            SkipReason::NoChoice => "button press without data",
        };
        f.write_str(reason)
    }
}

/// Turn an update into an [`InboundMessage`] keyed by chat id.
///
/// Button presses become structured choices; everything else must carry text.
pub fn to_inbound(update: &Update, private_only: bool) -> Result<InboundMessage, SkipReason> {
    if let Some(ref query) = update.callback_query {
        if query.from.is_bot {
            return Err(SkipReason::FromBot);
        }
        if private_only && query.message.as_ref().is_some_and(|m| !m.chat.is_private()) {
            return Err(SkipReason::NotPrivate);
        }
        let data = query
            .data
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(SkipReason::NoChoice)?;
        let chat_id = update.chat_id().ok_or(SkipReason::Unsupported)?;

        return Ok(InboundMessage::choice(chat_id.to_string(), data)
            .with_display_name(query.from.full_name())
            .at(Utc::now()));
    }

    let message = update.message.as_ref().ok_or(SkipReason::Unsupported)?;
    if message.from.as_ref().is_some_and(|u| u.is_bot) {
        return Err(SkipReason::FromBot);
    }
    if private_only && !message.chat.is_private() {
        return Err(SkipReason::NotPrivate);
    }
    let text = message.content().ok_or(SkipReason::NoText)?;

    let mut inbound = InboundMessage::text(message.chat.id.to_string(), text).at(sent_at(message));
    if let Some(ref from) = message.from {
        inbound = inbound.with_display_name(from.full_name());
    }
    Ok(inbound)
}

fn sent_at(message: &Message) -> DateTime<Utc> {
    DateTime::from_timestamp(message.date, 0).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestrator::MessageContent;
    use telegram_client::{CallbackQuery, Chat, User};

    fn user(id: i64, is_bot: bool) -> User {
        User {
            id,
            is_bot,
            first_name: "John".to_string(),
            last_name: None,
            username: None,
        }
    }

    fn message(chat_type: &str, text: Option<&str>, from_bot: bool) -> Message {
        Message {
            message_id: 1,
            from: Some(user(42, from_bot)),
            chat: Chat {
                id: 42,
                chat_type: chat_type.to_string(),
            },
            date: 1_700_000_000,
            text: text.map(str::to_string),
            caption: None,
        }
    }

    fn text_update(msg: Message) -> Update {
        Update {
            update_id: 1,
            message: Some(msg),
            callback_query: None,
        }
    }

    #[test]
    fn test_text_message() {
        let update = text_update(message("private", Some("Hi"), false));
        let inbound = to_inbound(&update, true).unwrap();

        assert_eq!(inbound.customer_id, "42");
        assert_eq!(inbound.content, MessageContent::Text("Hi".to_string()));
        assert_eq!(inbound.display_name.as_deref(), Some("John"));
        assert_eq!(inbound.received_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_button_press() {
        let update = Update {
            update_id: 2,
            message: None,
            callback_query: Some(CallbackQuery {
                id: "cb".to_string(),
                from: user(42, false),
                message: Some(message("private", Some("menu"), true)),
                data: Some("theft".to_string()),
            }),
        };
        let inbound = to_inbound(&update, true).unwrap();

        assert_eq!(inbound.customer_id, "42");
        assert!(inbound.content.is_choice());
        assert_eq!(inbound.content.as_text(), "theft");
    }

    #[test]
    fn test_skips() {
        let group = text_update(message("group", Some("Hi"), false));
        assert_eq!(to_inbound(&group, true), Err(SkipReason::NotPrivate));
        assert!(to_inbound(&group, false).is_ok());

        let bot = text_update(message("private", Some("Hi"), true));
        assert_eq!(to_inbound(&bot, true), Err(SkipReason::FromBot));

        let sticker = text_update(message("private", None, false));
        assert_eq!(to_inbound(&sticker, true), Err(SkipReason::NoText));

        let empty = Update {
            update_id: 3,
            message: None,
            callback_query: None,
        };
        assert_eq!(to_inbound(&empty, true), Err(SkipReason::Unsupported));
    }
}
