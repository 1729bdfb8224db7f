//! Bot API HTTP client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TelegramConfig;
use crate::error::TelegramError;
use crate::types::{
    AnswerCallbackParams, ApiResponse, ChatAction, ChatActionParams, GetUpdatesParams,
    InlineKeyboardButton, InlineKeyboardMarkup, Message, SendMessageParams, SendVideoParams,
    Update, User,
};

/// Extra time granted to a long-poll request beyond the poll timeout itself.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Parse a chat id kept as a string elsewhere in the system.
pub fn parse_chat_id(chat_id: &str) -> Result<i64, TelegramError> {
    chat_id
        .trim()
        .parse()
        .map_err(|_| TelegramError::InvalidChatId(chat_id.to_string()))
}

/// Client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    config: TelegramConfig,
    me: Arc<User>,
    connected: Arc<AtomicBool>,
}

impl TelegramClient {
    /// Connect to the Bot API, verifying the token with `getMe`.
    pub async fn connect(config: TelegramConfig) -> Result<Self, TelegramError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(TelegramError::Http)?;

        let me: User = match call(&http, &config, "getMe", &serde_json::json!({}), None).await {
            Ok(me) => me,
            Err(TelegramError::Api { code: 401, .. }) => return Err(TelegramError::Unauthorized),
            Err(e) => return Err(e),
        };

        info!(
            "Connected to Bot API as @{}",
            me.username.as_deref().unwrap_or(&me.first_name)
        );

        Ok(Self {
            http,
            config,
            me: Arc::new(me),
            connected: Arc::new(AtomicBool::new(true)),
        })
    }

    /// The bot's own account.
    pub fn me(&self) -> &User {
        &self.me
    }

    /// Whether the last request reached the API.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// Send a plain text message.
    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        self.send(SendMessageParams::text(chat_id, text)).await
    }

    /// Send a message with one inline button per `(label, callback_data)` pair.
    pub async fn send_with_choices(
        &self,
        chat_id: i64,
        text: &str,
        choices: &[(String, String)],
    ) -> Result<Message, TelegramError> {
        let keyboard = InlineKeyboardMarkup::single_column(
            choices
                .iter()
                .map(|(label, data)| InlineKeyboardButton::callback(label, data)),
        );
        self.send(SendMessageParams::text(chat_id, text).with_keyboard(keyboard))
            .await
    }

    pub async fn send(&self, params: SendMessageParams) -> Result<Message, TelegramError> {
        self.call("sendMessage", &params).await
    }

    /// Send an already uploaded video by its `file_id`.
    pub async fn send_video(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<Message, TelegramError> {
        let params = SendVideoParams {
            chat_id,
            video: file_id.to_string(),
            caption: caption.map(str::to_string),
        };
        self.call("sendVideo", &params).await
    }

    /// Show a chat action such as "typing..." for a few seconds.
    pub async fn send_chat_action(
        &self,
        chat_id: i64,
        action: ChatAction,
    ) -> Result<(), TelegramError> {
        let _: bool = self
            .call("sendChatAction", &ChatActionParams { chat_id, action })
            .await?;
        Ok(())
    }

    /// Acknowledge a button press so the client stops its spinner.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<(), TelegramError> {
        let params = AnswerCallbackParams {
            callback_query_id: callback_query_id.to_string(),
            text: text.map(str::to_string),
        };
        let _: bool = self.call("answerCallbackQuery", &params).await?;
        Ok(())
    }

    /// Long-poll for updates with `update_id >= offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdatesParams::new(offset, timeout.as_secs());
        let result = call(
            &self.http,
            &self.config,
            "getUpdates",
            &params,
            Some(timeout + POLL_GRACE),
        )
        .await;
        self.track(&result);
        result
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, TelegramError> {
        let result = call(&self.http, &self.config, method, params, None).await;
        self.track(&result);
        result
    }

    fn track<T>(&self, result: &Result<T, TelegramError>) {
        let reachable = !matches!(result, Err(TelegramError::Http(_)));
        let was = self.connected.swap(reachable, Ordering::SeqCst);
        if was && !reachable {
            warn!("Bot API unreachable");
        } else if !was && reachable {
            info!("Bot API connection restored");
        }
    }
}

async fn call<P: Serialize, R: DeserializeOwned>(
    http: &Client,
    config: &TelegramConfig,
    method: &str,
    params: &P,
    timeout: Option<Duration>,
) -> Result<R, TelegramError> {
    debug!("Bot API call: {}", method);

    let mut request = http.post(config.method_url(method)).json(params);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    // Error responses carry a JSON body too, so the status is not checked
    // before decoding.
    let body = request.send().await?.text().await?;
    decode(method, &body)
}

fn decode<R: DeserializeOwned>(method: &str, body: &str) -> Result<R, TelegramError> {
    let response: ApiResponse<R> = serde_json::from_str(body)?;

    if !response.ok {
        return Err(TelegramError::Api {
            code: response.error_code.unwrap_or(-1),
            description: response
                .description
                .unwrap_or_else(|| format!("{} failed", method)),
            retry_after: response.parameters.and_then(|p| p.retry_after),
        });
    }

    response.result.ok_or_else(|| TelegramError::Api {
        code: -1,
        description: format!("{} returned no result", method),
        retry_after: None,
    })
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("config", &self.config)
            .field("bot_id", &self.me.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
