//! Classify a message and write a reply with the live API.
//!
//! Run with: cargo run -p openai-brain --example classify_message -- "How much for 3 pivots?"
//!
//! Requires OPENAI_API_KEY in the environment or in .env.

use std::env;

use openai_brain::{IntentClassifier, OpenAiBrain, PromptContext, ReplyGenerator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let text = if args.is_empty() {
        "Hi, my neighbor's pivot cables were stolen last week. How much does it cost?".to_string()
    } else {
        args.join(" ")
    };

    let brain = OpenAiBrain::from_env()?;
    println!("Reply model: {}", brain.config().model);
    println!("Analysis model: {}", brain.config().analysis_model);
    println!();

    let classification = brain.classify(&text, &[]).await?;
    println!("=== Classification ===");
    println!("{:#?}", classification);

    let context = PromptContext {
        target_state: "GENERAL_CONVERSATION".to_string(),
        new_tags: classification.tags.iter().cloned().collect(),
        tags: classification.tags.iter().cloned().collect(),
        user_text: text,
        directive: "Answer as a consultative farm security specialist.".to_string(),
        ..Default::default()
    };
    let reply = brain.generate(&context).await?;
    println!("=== Reply ===");
    println!("{}", reply);

    Ok(())
}
