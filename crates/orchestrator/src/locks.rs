//! Per-customer serialization.
//!
//! Messages from one customer are handled one at a time; different customers
//! proceed concurrently. The lock table is bounded with LRU eviction
//! (IndexMap keeps insertion order) and never evicts a lock that is held or
//! awaited.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Default number of idle customer locks kept around.
pub const DEFAULT_MAX_LOCKS: usize = 1024;

/// Keyed async mutexes.
#[derive(Debug)]
pub struct CustomerLocks {
    locks: Mutex<IndexMap<String, Arc<Mutex<()>>>>,
    max_entries: usize,
}

impl Default for CustomerLocks {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOCKS)
    }
}

impl CustomerLocks {
    pub fn new(max_entries: usize) -> Self {
        Self {
            locks: Mutex::new(IndexMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Wait for exclusive access to `customer_id`.
    pub async fn acquire(&self, customer_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            let lock = locks
                .shift_remove(customer_id)
                .unwrap_or_else(|| Arc::new(Mutex::new(())));
            locks.insert(customer_id.to_string(), lock.clone());
            Self::evict(&mut locks, self.max_entries);
            lock
        };

        lock.lock_owned().await
    }

    /// Number of tracked customers.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }

    fn evict(locks: &mut IndexMap<String, Arc<Mutex<()>>>, max_entries: usize) {
        let mut index = 0;
        while locks.len() > max_entries && index < locks.len() {
            // Only the table holds an idle lock.
            let idle = locks
                .get_index(index)
                .is_some_and(|(_, lock)| Arc::strong_count(lock) == 1);
            if idle {
                locks.shift_remove_index(index);
            } else {
                index += 1;
            }
        }
    }
}
