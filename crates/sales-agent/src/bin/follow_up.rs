use std::time::Duration;

use clap::Parser;
use orchestrator::EngineConfig;
use sales_agent::{build_decay_job, connect_telegram, init_tracing, summarize_sweep, AgentConfig};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "follow-up", about = "Decay idle lead scores and send follow-up messages")]
struct Args {
    /// Repeat the sweep every N hours instead of running once.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    every_hours: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    let config = AgentConfig::from_env()?;
    let _guard = init_tracing(&config)?;

    let client = connect_telegram().await?;
    let job = build_decay_job(&config, EngineConfig::from_env()?, &client).await?;

    let Some(hours) = args.every_hours else {
        let report = job.run().await?;
        info!("Follow-up sweep done: {}", summarize_sweep(&report));
        return Ok(());
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(hours * 3600));
    info!("Running follow-up sweep every {} hours", hours);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match job.run().await {
                    Ok(report) => info!("Follow-up sweep done: {}", summarize_sweep(&report)),
                    Err(e) => error!("Follow-up sweep failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping follow-up runner");
                return Ok(());
            }
        }
    }
}
