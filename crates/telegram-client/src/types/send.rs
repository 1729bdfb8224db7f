//! Parameter types for Bot API send methods.

use serde::Serialize;

/// Parameters for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl SendMessageParams {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_markup: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(keyboard);
        self
    }
}

/// Inline keyboard attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// One button per row.
    pub fn single_column<I>(buttons: I) -> Self
    where
        I: IntoIterator<Item = InlineKeyboardButton>,
    {
        Self {
            inline_keyboard: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    /// Sent back in the callback query; at most 64 bytes.
    pub callback_data: String,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: data.into(),
        }
    }
}

/// Parameters for `sendVideo` with an already uploaded file.
#[derive(Debug, Clone, Serialize)]
pub struct SendVideoParams {
    pub chat_id: i64,
    /// Telegram `file_id` of a previously uploaded video.
    pub video: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Status shown to the user while the bot works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Typing,
    UploadVideo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatActionParams {
    pub chat_id: i64,
    pub action: ChatAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackParams {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesParams {
    pub offset: i64,
    /// Long-poll timeout in seconds.
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

impl GetUpdatesParams {
    pub fn new(offset: i64, timeout: u64) -> Self {
        Self {
            offset,
            timeout,
            allowed_updates: vec!["message", "callback_query"],
        }
    }
}
