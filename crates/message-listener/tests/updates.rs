//! Raw Bot API updates driven through conversion and the engine.

use std::sync::Arc;

use message_listener::{to_inbound, SkipReason};
use mock_brain::{KeywordClassifier, TemplateGenerator};
use orchestrator::{
    ConversationState, CustomerStore, InMemoryStore, Orchestrator, Outcome, RecordingNotifier,
    RecordingSender, Sent,
};
use telegram_client::Update;

struct Bot {
    orchestrator: Orchestrator,
    store: Arc<InMemoryStore>,
    sender: Arc<RecordingSender>,
}

fn bot() -> Bot {
    let store = Arc::new(InMemoryStore::new());
    let sender = Arc::new(RecordingSender::new());
    let orchestrator = Orchestrator::builder()
        .store(store.clone())
        .classifier(Arc::new(KeywordClassifier::new()))
        .generator(Arc::new(TemplateGenerator::new()))
        .sender(sender.clone())
        .notifier(Arc::new(RecordingNotifier::new()))
        .operator_id("9000")
        .build()
        .expect("complete builder");
    Bot {
        orchestrator,
        store,
        sender,
    }
}

fn text_update(id: i64, text: &str) -> Update {
    serde_json::from_value(serde_json::json!({
        "update_id": id,
        "message": {
            "message_id": id,
            "from": {"id": 42, "is_bot": false, "first_name": "John", "last_name": "Silva"},
            "chat": {"id": 42, "type": "private"},
            "date": 1_700_000_000 + id,
            "text": text
        }
    }))
    .expect("valid update")
}

fn button_update(id: i64, data: &str) -> Update {
    serde_json::from_value(serde_json::json!({
        "update_id": id,
        "callback_query": {
            "id": format!("cb-{}", id),
            "from": {"id": 42, "first_name": "John"},
            "message": {"message_id": 99, "chat": {"id": 42, "type": "private"}, "date": 1_700_000_000},
            "data": data
        }
    }))
    .expect("valid update")
}

impl Bot {
    async fn handle(&self, update: &Update) -> Outcome {
        let inbound = to_inbound(update, true).expect("update is for the engine");
        self.orchestrator
            .process(inbound)
            .await
            .expect("pipeline succeeds")
    }
}

#[tokio::test]
async fn test_onboarding_through_updates() {
    let bot = bot();

    bot.handle(&text_update(1, "Hi")).await;
    let customer = bot.store.get("42").await.unwrap().unwrap();
    assert_eq!(customer.state, ConversationState::AwaitingName);
    // The record starts from the Telegram display name.
    assert_eq!(customer.name, "John Silva");

    bot.handle(&text_update(2, "john")).await;
    bot.handle(&text_update(3, "Rio Verde, Goiás")).await;

    let customer = bot.store.get("42").await.unwrap().unwrap();
    assert_eq!(customer.name, "John");
    assert_eq!(customer.state, ConversationState::AwaitingPainPoint);

    let menu = bot.sender.sent_to("42").await;
    match menu.last() {
        Some(Sent::Choices { choices, .. }) => {
            assert!(choices.iter().any(|c| c.id == "theft"));
        }
        other => panic!("expected the pain menu, got {:?}", other),
    }

    let outcome = bot.handle(&button_update(4, "theft")).await;
    assert!(matches!(
        outcome,
        Outcome::Replied {
            state: ConversationState::ConfirmingInterest,
            ..
        }
    ));

    let customer = bot.store.get("42").await.unwrap().unwrap();
    assert!(customer.tags.contains("OWN_THEFT"));
    assert_eq!(
        customer.pain_point.as_deref(),
        Some("I've had equipment stolen")
    );
}

#[tokio::test]
async fn test_group_messages_never_reach_the_engine() {
    let update: Update = serde_json::from_value(serde_json::json!({
        "update_id": 1,
        "message": {
            "message_id": 1,
            "from": {"id": 42, "first_name": "John"},
            "chat": {"id": -100, "type": "supergroup"},
            "date": 1_700_000_000,
            "text": "Hi"
        }
    }))
    .unwrap();

    assert_eq!(to_inbound(&update, true).unwrap_err(), SkipReason::NotPrivate);
}

#[tokio::test]
async fn test_reset_command_through_updates() {
    let bot = bot();
    bot.handle(&text_update(1, "Hi")).await;

    let outcome = bot.handle(&text_update(2, "/reset")).await;
    assert!(matches!(outcome, Outcome::Command { .. }));
    assert!(bot.store.get("42").await.unwrap().is_none());
}
