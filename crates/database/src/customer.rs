//! Customer CRUD operations.

use std::collections::BTreeSet;

use brain_core::HistoryMessage;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{ConversationState, Customer, EquipmentCounts, ScorePoint};
use crate::update::CustomerUpdate;

const ENTITY: &str = "Customer";

const SELECT_COLUMNS: &str = r#"
    SELECT id, name, farm_name, location, profile, pain_point,
           conversation_state, previous_conversation_state,
           pivot_count, pump_count, quote_total, tags, lead_score,
           score_history, conversation_history, follow_up_level,
           hot_lead_notified, video_sent, created_at, last_contact_at,
           decayed_through
    FROM customers
"#;

/// Predicates used for bulk queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerQuery {
    /// Every customer.
    All,
    /// Customers whose score decays: neither paused nor finalized.
    Active,
    /// Customers with an issued quote and follow-ups still pending.
    AwaitingFollowUp,
}

impl CustomerQuery {
    fn where_clause(&self) -> &'static str {
        match self {
            CustomerQuery::All => "",
            CustomerQuery::Active => {
                "WHERE conversation_state NOT IN ('PAUSED_BY_OPERATOR', 'FOLLOW_UP_FINALIZED')"
            }
            CustomerQuery::AwaitingFollowUp => "WHERE quote_total > 0 AND follow_up_level < 2",
        }
    }

    /// Evaluate the predicate against an in-memory record.
    pub fn matches(&self, customer: &Customer) -> bool {
        match self {
            CustomerQuery::All => true,
            CustomerQuery::Active => !matches!(
                customer.state,
                ConversationState::PausedByOperator | ConversationState::FollowUpFinalized
            ),
            CustomerQuery::AwaitingFollowUp => {
                customer.has_quote() && customer.follow_up_level < 2
            }
        }
    }
}

/// Raw row as stored; JSON and timestamp columns are still text.
#[derive(Debug, FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    farm_name: Option<String>,
    location: Option<String>,
    profile: String,
    pain_point: Option<String>,
    conversation_state: String,
    previous_conversation_state: Option<String>,
    pivot_count: i64,
    pump_count: i64,
    quote_total: f64,
    tags: String,
    lead_score: i64,
    score_history: String,
    conversation_history: String,
    follow_up_level: i64,
    hot_lead_notified: bool,
    video_sent: bool,
    created_at: String,
    last_contact_at: String,
    decayed_through: Option<String>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DatabaseError;

    fn try_from(row: CustomerRow) -> Result<Self> {
        let corrupt = |reason: String| DatabaseError::Corrupt {
            entity: ENTITY,
            id: row.id.clone(),
            reason,
        };

        let pivots = u32::try_from(row.pivot_count)
            .map_err(|_| corrupt(format!("pivot_count {}", row.pivot_count)))?;
        let pumps = u32::try_from(row.pump_count)
            .map_err(|_| corrupt(format!("pump_count {}", row.pump_count)))?;
        let follow_up_level = u8::try_from(row.follow_up_level)
            .map_err(|_| corrupt(format!("follow_up_level {}", row.follow_up_level)))?;
        let created_at = parse_timestamp(&row.created_at).map_err(&corrupt)?;
        let last_contact_at = parse_timestamp(&row.last_contact_at).map_err(&corrupt)?;
        let decayed_through = row
            .decayed_through
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(&corrupt)?;

        let tags: BTreeSet<String> = serde_json::from_str(&row.tags)?;
        let score_history: Vec<ScorePoint> = serde_json::from_str(&row.score_history)?;
        let conversation_history: Vec<HistoryMessage> =
            serde_json::from_str(&row.conversation_history)?;

        Ok(Customer {
            state: ConversationState::from_stored(&row.conversation_state),
            previous_state: row
                .previous_conversation_state
                .as_deref()
                .map(ConversationState::from_stored),
            id: row.id,
            name: row.name,
            farm_name: row.farm_name,
            location: row.location,
            profile: row.profile,
            pain_point: row.pain_point,
            equipment: EquipmentCounts { pivots, pumps },
            quote_total: row.quote_total,
            tags,
            lead_score: row.lead_score,
            score_history,
            conversation_history,
            follow_up_level,
            hot_lead_notified: row.hot_lead_notified,
            video_sent: row.video_sent,
            created_at,
            last_contact_at,
            decayed_through,
        })
    }
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| format!("timestamp '{}': {}", raw, e))
}

async fn fetch_row(conn: &mut SqliteConnection, id: &str) -> Result<Option<Customer>> {
    let query = format!("{} WHERE id = ?", SELECT_COLUMNS);
    let row = sqlx::query_as::<_, CustomerRow>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(Customer::try_from).transpose()
}

async fn insert_row(conn: &mut SqliteConnection, customer: &Customer) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO customers (
            id, name, farm_name, location, profile, pain_point,
            conversation_state, previous_conversation_state,
            pivot_count, pump_count, quote_total, tags, lead_score,
            score_history, conversation_history, follow_up_level,
            hot_lead_notified, video_sent, created_at, last_contact_at,
            decayed_through
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.name)
    .bind(&customer.farm_name)
    .bind(&customer.location)
    .bind(&customer.profile)
    .bind(&customer.pain_point)
    .bind(customer.state.as_str())
    .bind(customer.previous_state.map(|s| s.as_str()))
    .bind(i64::from(customer.equipment.pivots))
    .bind(i64::from(customer.equipment.pumps))
    .bind(customer.quote_total)
    .bind(serde_json::to_string(&customer.tags)?)
    .bind(customer.lead_score)
    .bind(serde_json::to_string(&customer.score_history)?)
    .bind(serde_json::to_string(&customer.conversation_history)?)
    .bind(i64::from(customer.follow_up_level))
    .bind(customer.hot_lead_notified)
    .bind(customer.video_sent)
    .bind(format_timestamp(&customer.created_at))
    .bind(format_timestamp(&customer.last_contact_at))
    .bind(customer.decayed_through.as_ref().map(format_timestamp))
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: ENTITY,
                    id: customer.id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

async fn store_row(conn: &mut SqliteConnection, customer: &Customer) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE customers
        SET name = ?, farm_name = ?, location = ?, profile = ?, pain_point = ?,
            conversation_state = ?, previous_conversation_state = ?,
            pivot_count = ?, pump_count = ?, quote_total = ?, tags = ?,
            lead_score = ?, score_history = ?, conversation_history = ?,
            follow_up_level = ?, hot_lead_notified = ?, video_sent = ?,
            last_contact_at = ?, decayed_through = ?
        WHERE id = ?
        "#,
    )
    .bind(&customer.name)
    .bind(&customer.farm_name)
    .bind(&customer.location)
    .bind(&customer.profile)
    .bind(&customer.pain_point)
    .bind(customer.state.as_str())
    .bind(customer.previous_state.map(|s| s.as_str()))
    .bind(i64::from(customer.equipment.pivots))
    .bind(i64::from(customer.equipment.pumps))
    .bind(customer.quote_total)
    .bind(serde_json::to_string(&customer.tags)?)
    .bind(customer.lead_score)
    .bind(serde_json::to_string(&customer.score_history)?)
    .bind(serde_json::to_string(&customer.conversation_history)?)
    .bind(i64::from(customer.follow_up_level))
    .bind(customer.hot_lead_notified)
    .bind(customer.video_sent)
    .bind(format_timestamp(&customer.last_contact_at))
    .bind(customer.decayed_through.as_ref().map(format_timestamp))
    .bind(&customer.id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: ENTITY,
            id: customer.id.clone(),
        });
    }

    Ok(())
}

/// Insert a complete customer record.
pub async fn create_customer(pool: &SqlitePool, customer: &Customer) -> Result<()> {
    let mut conn = pool.acquire().await?;
    insert_row(&mut conn, customer).await
}

/// Get a customer by ID.
pub async fn get_customer(pool: &SqlitePool, id: &str) -> Result<Option<Customer>> {
    let mut conn = pool.acquire().await?;
    fetch_row(&mut conn, id).await
}

/// Get a customer, creating a fresh `INITIAL` record if none exists.
pub async fn get_or_create_customer(
    pool: &SqlitePool,
    id: &str,
    display_name: &str,
    now: DateTime<Utc>,
) -> Result<Customer> {
    let mut conn = pool.acquire().await?;
    if let Some(existing) = fetch_row(&mut conn, id).await? {
        return Ok(existing);
    }

    let customer = Customer::new(id, display_name, now);
    match insert_row(&mut conn, &customer).await {
        Ok(()) => {
            tracing::info!("Created customer record {}", id);
            Ok(customer)
        }
        // Lost a creation race; the other writer's record wins.
        Err(DatabaseError::AlreadyExists { .. }) => fetch_row(&mut conn, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: ENTITY,
                id: id.to_string(),
            }),
        Err(e) => Err(e),
    }
}

/// Apply a partial update atomically and return the stored result.
///
/// The read, merge and write happen inside one transaction: either the whole
/// update lands or none of it does.
pub async fn update_customer(
    pool: &SqlitePool,
    id: &str,
    update: &CustomerUpdate,
    now: DateTime<Utc>,
) -> Result<Customer> {
    let mut tx = pool.begin().await?;

    let mut customer = fetch_row(&mut tx, id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: ENTITY,
            id: id.to_string(),
        })?;

    update.apply(&mut customer, now);
    store_row(&mut tx, &customer).await?;
    tx.commit().await?;

    Ok(customer)
}

/// Delete a customer by ID. Returns whether a record existed.
pub async fn delete_customer(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM customers
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List customers matching a predicate, oldest first.
pub async fn query_customers(pool: &SqlitePool, query: CustomerQuery) -> Result<Vec<Customer>> {
    let sql = format!(
        "{} {} ORDER BY created_at, id",
        SELECT_COLUMNS,
        query.where_clause()
    );
    let rows = sqlx::query_as::<_, CustomerRow>(&sql).fetch_all(pool).await?;

    rows.into_iter().map(Customer::try_from).collect()
}

/// Count total customers.
pub async fn count_customers(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM customers
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
