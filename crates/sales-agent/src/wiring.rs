//! Assembles the engine from environment configuration.

use std::sync::Arc;

use brain_core::{IntentClassifier, ReplyGenerator};
use database::Database;
use message_listener::{TelegramNotifier, TelegramSender};
use mock_brain::KeywordClassifier;
use openai_brain::OpenAiBrain;
use orchestrator::{
    CustomerStore, DecayJob, EngineConfig, LoggingNotifier, OperatorNotifier, Orchestrator,
};
use telegram_client::{parse_chat_id, TelegramClient, TelegramConfig};
use tracing::{info, warn};

use crate::config::{AgentConfig, ClassifierBackend};
use crate::error::AgentError;

/// Connect to the customer database and bring the schema up to date.
pub async fn open_database(config: &AgentConfig) -> Result<Database, AgentError> {
    let db = Database::connect(&config.sqlite_url).await?;
    db.migrate().await?;
    Ok(db)
}

/// Verify the bot token and return a connected client.
pub async fn connect_telegram() -> Result<TelegramClient, AgentError> {
    let client = TelegramClient::connect(TelegramConfig::from_env()?).await?;
    info!(
        "Connected to Telegram as @{}",
        client.me().username.as_deref().unwrap_or("unknown")
    );
    Ok(client)
}

/// Pick the classifier and generator implementations.
pub fn build_brains(
    config: &AgentConfig,
) -> Result<(Arc<dyn IntentClassifier>, Arc<dyn ReplyGenerator>), AgentError> {
    let model = Arc::new(OpenAiBrain::from_env()?);
    let generator: Arc<dyn ReplyGenerator> = model.clone();
    let classifier: Arc<dyn IntentClassifier> = match config.classifier {
        ClassifierBackend::OpenAi => model.clone(),
        ClassifierBackend::Keyword => Arc::new(KeywordClassifier::new()),
    };
    info!(
        "Classifier: {}, generator: {} ({})",
        classifier.name(),
        generator.name(),
        model.config().model
    );
    Ok((classifier, generator))
}

fn build_notifier(
    config: &AgentConfig,
    client: &TelegramClient,
) -> Result<Arc<dyn OperatorNotifier>, AgentError> {
    match config.operator_chat_id {
        Some(ref id) => {
            let chat_id = parse_chat_id(id)?;
            Ok(Arc::new(TelegramNotifier::new(client.clone(), chat_id)))
        }
        None => {
            warn!("OPERATOR_CHAT_ID is not set; alerts will only be logged");
            Ok(Arc::new(LoggingNotifier))
        }
    }
}

/// Build the live engine: SQLite store, model brains, Telegram delivery.
pub async fn build_orchestrator(
    config: &AgentConfig,
    engine: EngineConfig,
    client: &TelegramClient,
) -> Result<Orchestrator, AgentError> {
    let store: Arc<dyn CustomerStore> = Arc::new(open_database(config).await?);
    let (classifier, generator) = build_brains(config)?;
    let notifier = build_notifier(config, client)?;

    let mut builder = Orchestrator::builder()
        .store(store)
        .classifier(classifier)
        .generator(generator)
        .sender(Arc::new(TelegramSender::new(client.clone())))
        .notifier(notifier)
        .config(engine);
    if let Some(ref operator) = config.operator_chat_id {
        builder = builder.operator_id(operator.clone());
    }

    Ok(builder.build()?)
}

/// Build the follow-up job without the language-model collaborators.
pub async fn build_decay_job(
    config: &AgentConfig,
    engine: EngineConfig,
    client: &TelegramClient,
) -> Result<DecayJob, AgentError> {
    let store: Arc<dyn CustomerStore> = Arc::new(open_database(config).await?);
    Ok(DecayJob::new(
        store,
        Arc::new(TelegramSender::new(client.clone())),
        Arc::new(engine),
    ))
}
