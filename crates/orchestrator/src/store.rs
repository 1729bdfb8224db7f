//! The customer store seam.
//!
//! The engine only needs five operations from persistence. [`Database`] is
//! the production implementation; [`InMemoryStore`] backs tests and dry runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::{customer, Customer, CustomerQuery, CustomerUpdate, Database, DatabaseError};
use tokio::sync::Mutex;

/// Per-record atomic access to customer records.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Customer>, DatabaseError>;

    /// Fetch a record, creating a fresh `INITIAL` one for unseen ids.
    async fn get_or_create(
        &self,
        id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Customer, DatabaseError>;

    /// Apply a partial update all-or-nothing and return the stored record.
    async fn update(
        &self,
        id: &str,
        update: &CustomerUpdate,
        now: DateTime<Utc>,
    ) -> Result<Customer, DatabaseError>;

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError>;

    async fn query(&self, query: CustomerQuery) -> Result<Vec<Customer>, DatabaseError>;
}

#[async_trait]
impl CustomerStore for Database {
    async fn get(&self, id: &str) -> Result<Option<Customer>, DatabaseError> {
        customer::get_customer(self.pool(), id).await
    }

    async fn get_or_create(
        &self,
        id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Customer, DatabaseError> {
        customer::get_or_create_customer(self.pool(), id, display_name, now).await
    }

    async fn update(
        &self,
        id: &str,
        update: &CustomerUpdate,
        now: DateTime<Utc>,
    ) -> Result<Customer, DatabaseError> {
        customer::update_customer(self.pool(), id, update, now).await
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        customer::delete_customer(self.pool(), id).await
    }

    async fn query(&self, query: CustomerQuery) -> Result<Vec<Customer>, DatabaseError> {
        customer::query_customers(self.pool(), query).await
    }
}

/// A map-backed store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<HashMap<String, Customer>>,
    fail_updates: Mutex<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record as-is.
    pub async fn insert(&self, customer: Customer) {
        self.records
            .lock()
            .await
            .insert(customer.id.clone(), customer);
    }

    /// Make updates fail with a storage error, leaving records untouched.
    pub async fn set_fail_updates(&self, fail: bool) {
        *self.fail_updates.lock().await = fail;
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Customer>, DatabaseError> {
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn get_or_create(
        &self,
        id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Customer, DatabaseError> {
        let mut records = self.records.lock().await;
        let customer = records
            .entry(id.to_string())
            .or_insert_with(|| Customer::new(id, display_name, now));
        Ok(customer.clone())
    }

    async fn update(
        &self,
        id: &str,
        update: &CustomerUpdate,
        now: DateTime<Utc>,
    ) -> Result<Customer, DatabaseError> {
        if *self.fail_updates.lock().await {
            return Err(DatabaseError::Corrupt {
                entity: "customer",
                id: id.to_string(),
                reason: "store unavailable".to_string(),
            });
        }

        let mut records = self.records.lock().await;
        let customer = records.get_mut(id).ok_or_else(|| DatabaseError::NotFound {
            entity: "customer",
            id: id.to_string(),
        })?;
        update.apply(customer, now);
        Ok(customer.clone())
    }

    async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        Ok(self.records.lock().await.remove(id).is_some())
    }

    async fn query(&self, query: CustomerQuery) -> Result<Vec<Customer>, DatabaseError> {
        let mut matched: Vec<Customer> = self
            .records
            .lock()
            .await
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matched)
    }
}
