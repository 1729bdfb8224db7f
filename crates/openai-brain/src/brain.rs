//! OpenAiBrain implementation using the chat-completions API.

use brain_core::{
    async_trait, hash_prompt, BrainError, Classification, HistoryMessage, IntentClassifier,
    PromptContext, ReplyGenerator,
};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseFormat,
};
use crate::config::OpenAiConfig;
use crate::json::parse_classification;
use crate::prompts::{self, DEFAULT_PERSONA};

const CLASSIFY_MAX_TOKENS: u32 = 300;
const SUMMARY_MAX_TOKENS: u32 = 200;

/// Classifier and reply generator backed by an OpenAI-compatible API.
///
/// Replies use [`OpenAiConfig::model`]; classification and operator
/// summaries use the cheaper [`OpenAiConfig::analysis_model`].
pub struct OpenAiBrain {
    client: Client,
    config: OpenAiConfig,
    persona_hash: String,
}

impl OpenAiBrain {
    /// Create a new OpenAiBrain with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self, BrainError> {
        if config.api_key.is_empty() {
            return Err(BrainError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BrainError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let persona_hash = hash_prompt(config.persona_prompt.as_deref().unwrap_or(DEFAULT_PERSONA));
        info!(
            "OpenAiBrain initialized with model: {}, analysis model: {}, persona fingerprint: {}",
            config.model, config.analysis_model, persona_hash
        );

        Ok(Self {
            client,
            config,
            persona_hash,
        })
    }

    /// Create an OpenAiBrain from environment variables.
    ///
    /// See [`OpenAiConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, BrainError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// SHA-256 fingerprint of the persona prompt in use.
    pub fn persona_hash(&self) -> &str {
        &self.persona_hash
    }

    fn persona(&self) -> &str {
        self.config.persona_prompt.as_deref().unwrap_or(DEFAULT_PERSONA)
    }

    fn reply_request(&self, context: &PromptContext) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(prompts::reply_system_prompt(self.persona(), context)),
                ChatMessage::user(prompts::reply_user_prompt(
                    context,
                    self.config.history_window,
                )),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            response_format: None,
        }
    }

    fn classify_request(&self, text: &str, history: &[HistoryMessage]) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.analysis_model.clone(),
            messages: vec![
                ChatMessage::system(prompts::classification_system_prompt()),
                ChatMessage::user(prompts::classification_user_prompt(
                    text,
                    history,
                    self.config.history_window,
                )),
            ],
            max_tokens: Some(CLASSIFY_MAX_TOKENS),
            temperature: Some(0.0),
            response_format: Some(ResponseFormat::json_object()),
        }
    }

    /// Send a chat completion request and return the first choice's text.
    async fn chat_completion(&self, request: ChatCompletionRequest) -> Result<String, BrainError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);
        debug!("Sending request to {} with model {}", url, request.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrainError::Timeout
                } else {
                    BrainError::Network(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);

            return Err(if status.is_server_error() || status.as_u16() == 429 {
                BrainError::Unavailable(format!("API error ({}): {}", status.as_u16(), detail))
            } else {
                BrainError::ProcessingFailed(format!("API error ({}): {}", status.as_u16(), detail))
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BrainError::ProcessingFailed(format!("Failed to parse response: {}", e)))?;

        if let Some(ref usage) = completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        completion.first_text().map(str::to_string).ok_or_else(|| {
            warn!("No content in response from {}", completion.model);
            BrainError::ProcessingFailed("empty completion".to_string())
        })
    }
}

#[async_trait]
impl IntentClassifier for OpenAiBrain {
    async fn classify(
        &self,
        text: &str,
        history: &[HistoryMessage],
    ) -> Result<Classification, BrainError> {
        let raw = self.chat_completion(self.classify_request(text, history)).await?;
        let classification = parse_classification(&raw)?;
        debug!("Classified message with tags {:?}", classification.tags);
        Ok(classification)
    }

    fn name(&self) -> &str {
        "OpenAiBrain"
    }
}

#[async_trait]
impl ReplyGenerator for OpenAiBrain {
    async fn generate(&self, context: &PromptContext) -> Result<String, BrainError> {
        self.chat_completion(self.reply_request(context)).await
    }

    async fn summarize(&self, history: &[HistoryMessage]) -> Result<String, BrainError> {
        if history.is_empty() {
            return Err(BrainError::ProcessingFailed(
                "nothing to summarize".to_string(),
            ));
        }

        let request = ChatCompletionRequest {
            model: self.config.analysis_model.clone(),
            messages: vec![
                ChatMessage::system(prompts::SUMMARY_SYSTEM_PROMPT),
                ChatMessage::user(brain_core::format_transcript(history)),
            ],
            max_tokens: Some(SUMMARY_MAX_TOKENS),
            temperature: Some(0.3),
            response_format: None,
        };
        self.chat_completion(request).await
    }

    fn name(&self) -> &str {
        "OpenAiBrain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brain() -> OpenAiBrain {
        let config = OpenAiConfig::builder()
            .api_key("test-key")
            .model("reply-model")
            .analysis_model("analysis-model")
            .history_window(2)
            .build();
        OpenAiBrain::new(config).unwrap()
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = OpenAiBrain::new(OpenAiConfig::default());
        assert!(matches!(result, Err(BrainError::Configuration(_))));
    }

    #[test]
    fn test_persona_override_changes_fingerprint() {
        let default = brain();
        let custom = OpenAiBrain::new(
            OpenAiConfig::builder()
                .api_key("test-key")
                .persona_prompt("You sell alarms.")
                .build(),
        )
        .unwrap();

        assert_eq!(default.persona_hash(), hash_prompt(DEFAULT_PERSONA));
        assert_ne!(default.persona_hash(), custom.persona_hash());
        assert_eq!(custom.persona(), "You sell alarms.");
    }

    #[test]
    fn test_classify_request_uses_analysis_model() {
        let history = vec![
            HistoryMessage::user("one"),
            HistoryMessage::assistant("two"),
            HistoryMessage::user("three"),
        ];
        let request = brain().classify_request("four", &history);

        assert_eq!(request.model, "analysis-model");
        assert_eq!(request.temperature, Some(0.0));
        assert!(request.response_format.is_some());
        assert_eq!(request.messages.len(), 2);
        assert!(!request.messages[1].content.contains("one"));
        assert!(request.messages[1].content.contains("Customer: three"));
    }

    #[test]
    fn test_reply_request_uses_reply_model() {
        let context = PromptContext {
            user_text: "hello".to_string(),
            directive: "Greet.".to_string(),
            ..Default::default()
        };
        let request = brain().reply_request(&context);

        assert_eq!(request.model, "reply-model");
        assert_eq!(request.max_tokens, Some(400));
        assert!(request.response_format.is_none());
        assert_eq!(request.messages[0].role, "system");
        assert!(request.messages[0].content.contains("Greet."));
    }

    #[tokio::test]
    async fn test_summarize_empty_history() {
        let result = brain().summarize(&[]).await;
        assert!(matches!(result, Err(BrainError::ProcessingFailed(_))));
    }

    #[test]
    fn test_names() {
        let brain = brain();
        assert_eq!(IntentClassifier::name(&brain), "OpenAiBrain");
        assert_eq!(ReplyGenerator::name(&brain), "OpenAiBrain");
    }
}
