//! Incoming update types.

use serde::{Deserialize, Serialize};

/// One item returned by `getUpdates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Chat the update belongs to, for messages and button presses.
    pub fn chat_id(&self) -> Option<i64> {
        if let Some(ref message) = self.message {
            return Some(message.chat.id);
        }
        self.callback_query
            .as_ref()
            .and_then(|q| q.message.as_ref())
            .map(|m| m.chat.id)
            .or_else(|| self.callback_query.as_ref().map(|q| q.from.id))
    }

    /// The user behind the update.
    pub fn sender(&self) -> Option<&User> {
        if let Some(ref query) = self.callback_query {
            return Some(&query.from);
        }
        self.message.as_ref().and_then(|m| m.from.as_ref())
    }
}

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    /// Unix timestamp in seconds.
    pub date: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl Message {
    /// Text or media caption, trimmed; None when empty.
    pub fn content(&self) -> Option<&str> {
        self.text
            .as_deref()
            .or(self.caption.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// First and last name joined.
    pub fn full_name(&self) -> String {
        match self.last_name {
            Some(ref last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    /// "private", "group", "supergroup" or "channel".
    #[serde(rename = "type")]
    pub chat_type: String,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.chat_type == "private"
    }
}

/// A press on an inline keyboard button.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    /// The pressed button's `callback_data`.
    #[serde(default)]
    pub data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_update() {
        let json = r#"{
            "update_id": 10,
            "message": {
                "message_id": 5,
                "from": {"id": 42, "is_bot": false, "first_name": "John", "last_name": "Silva"},
                "chat": {"id": 42, "type": "private"},
                "date": 1700000000,
                "text": "  Hi  "
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();

        assert_eq!(update.chat_id(), Some(42));
        assert_eq!(update.sender().map(User::full_name).as_deref(), Some("John Silva"));
        let message = update.message.unwrap();
        assert_eq!(message.content(), Some("Hi"));
        assert!(message.chat.is_private());
    }

    #[test]
    fn test_callback_update() {
        let json = r#"{
            "update_id": 11,
            "callback_query": {
                "id": "cb-1",
                "from": {"id": 42, "first_name": "John"},
                "message": {"message_id": 6, "chat": {"id": 42, "type": "private"}, "date": 1700000001, "text": "What worries you most?"},
                "data": "theft"
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();

        assert_eq!(update.chat_id(), Some(42));
        assert_eq!(update.sender().map(|u| u.id), Some(42));
        assert_eq!(update.callback_query.unwrap().data.as_deref(), Some("theft"));
    }

    #[test]
    fn test_unsupported_update_kind() {
        let update: Update =
            serde_json::from_str(r#"{"update_id": 12, "edited_message": {}}"#).unwrap();
        assert_eq!(update.chat_id(), None);
        assert!(update.sender().is_none());
    }

    #[test]
    fn test_empty_text_is_none() {
        let json = r#"{"message_id": 1, "chat": {"id": 1, "type": "private"}, "date": 0, "text": "   "}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.content(), None);
    }
}
