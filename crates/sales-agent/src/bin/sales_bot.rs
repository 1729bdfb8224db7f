use std::sync::Arc;

use message_listener::{MessageProcessor, ProcessorConfig};
use orchestrator::EngineConfig;
use sales_agent::{build_orchestrator, connect_telegram, init_tracing, AgentConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = AgentConfig::from_env()?;
    let _guard = init_tracing(&config)?;

    let engine = EngineConfig::from_env()?;
    info!(
        "Hot-lead threshold {}, decay {}/day, quote flow {:?}",
        engine.hot_lead_threshold, engine.decay_rate_per_day, engine.quote_flow
    );

    let client = connect_telegram().await?;
    let orchestrator = Arc::new(build_orchestrator(&config, engine, &client).await?);

    let processor = MessageProcessor::new(client, orchestrator, ProcessorConfig::default());
    info!("Sales bot running; press Ctrl+C to stop");
    processor.run_until_stopped().await?;

    info!("Sales bot stopped");
    Ok(())
}
