//! SQLite persistence layer for customer records.
//!
//! This crate stores one [`Customer`] per chat participant using SQLx with
//! SQLite. List-valued attributes (tags, score history, conversation history)
//! are stored as JSON text; callers only ever see structured fields.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use database::{customer, CustomerUpdate, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:data/sales.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let now = Utc::now();
//!     customer::get_or_create_customer(db.pool(), "1001", "Ana", now).await?;
//!     let update = CustomerUpdate::new().add_tags(["GREETING"]).lead_score(1);
//!     customer::update_customer(db.pool(), "1001", &update, now).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod customer;
pub mod error;
pub mod models;
pub mod update;

pub use customer::CustomerQuery;
pub use error::{DatabaseError, Result};
pub use models::{ConversationState, Customer, EquipmentCounts, ScorePoint, DEFAULT_PROFILE};
pub use update::CustomerUpdate;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    ///
    /// In-memory databases are per-connection, so tests use a pool size of 1.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Turn a plain file path into a SQLite URL; URLs pass through unchanged.
pub fn sqlite_url_from_path(path: &str) -> String {
    if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite:{}?mode=rwc", path)
    }
}
