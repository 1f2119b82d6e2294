//! Keyed record storage used by the posting engine.
//!
//! The engine only needs insert, lookup by key, and an exclusive
//! "lock for update" on the record being changed. [`InMemoryStore`] is the
//! map-backed implementation used for batch runs and tests; a database-backed
//! store can stand in behind the same trait.

use crate::error::{PostingError, Result};
use std::collections::{HashMap, HashSet};

/// Insert/lookup-by-key storage for one record type.
pub trait RecordStore<V> {
    /// Inserts or replaces the record stored under `key`.
    fn insert(&mut self, key: String, record: V) -> Option<V>;

    fn get(&self, key: &str) -> Option<&V>;

    fn get_mut(&mut self, key: &str) -> Option<&mut V>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records, in no particular order.
    fn values(&self) -> Vec<&V>;

    /// Takes the update lock on `key`.
    ///
    /// Fails with `AccountLocked` if the lock is already held and with
    /// `UnknownAccount` if no record exists under `key`.
    fn lock_for_update(&mut self, key: &str) -> Result<()>;

    /// Releases the update lock; releasing an unlocked key is a no-op.
    fn release(&mut self, key: &str);
}

/// `HashMap`-backed store.
#[derive(Debug, Clone)]
pub struct InMemoryStore<V> {
    records: HashMap<String, V>,
    locked: HashSet<String>,
}

impl<V> InMemoryStore<V> {
    pub fn new() -> Self {
        InMemoryStore {
            records: HashMap::new(),
            locked: HashSet::new(),
        }
    }
}

impl<V> Default for InMemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RecordStore<V> for InMemoryStore<V> {
    fn insert(&mut self, key: String, record: V) -> Option<V> {
        self.records.insert(key, record)
    }

    fn get(&self, key: &str) -> Option<&V> {
        self.records.get(key)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.records.get_mut(key)
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn values(&self) -> Vec<&V> {
        self.records.values().collect()
    }

    fn lock_for_update(&mut self, key: &str) -> Result<()> {
        if !self.records.contains_key(key) {
            return Err(PostingError::UnknownAccount(key.to_string()));
        }
        if !self.locked.insert(key.to_string()) {
            return Err(PostingError::AccountLocked(key.to_string()));
        }
        Ok(())
    }

    fn release(&mut self, key: &str) {
        self.locked.remove(key);
    }
}
