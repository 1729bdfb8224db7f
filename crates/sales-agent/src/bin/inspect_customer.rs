use clap::Parser;
use database::customer;
use sales_agent::{open_database, render_customer, AgentConfig};

#[derive(Debug, Parser)]
#[command(name = "inspect-customer", about = "Print one stored customer record")]
struct Args {
    /// Customer id (the Telegram chat id).
    id: String,

    /// SQLite path or URL; overrides SQLITE_PATH.
    #[arg(long)]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = match args.db {
        Some(path) => AgentConfig::from_sqlite_path(path),
        None => AgentConfig::from_env()?,
    };

    let db = open_database(&config).await?;
    let found = customer::get_customer(db.pool(), &args.id).await?;
    db.close().await;

    match found {
        Some(record) => {
            print!("{}", render_customer(&record));
            Ok(())
        }
        None => Err(format!("no customer with id {}", args.id).into()),
    }
}
