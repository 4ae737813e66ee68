//! Volatile storage backend

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};
use tracing::debug;

use super::{EditBatch, KeyValueStorage};
use crate::error::StoreError;

/// In-memory storage, lost when the process exits.
///
/// Writes can be made to fail on demand to exercise persistence failure
/// handling.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, i64>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        let values = values
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        Self {
            values: Mutex::new(values),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every following commit fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_int(&self, key: &str) -> Option<i64> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).copied()
    }

    fn commit(&self, batch: EditBatch) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected("memory storage is read-only".to_string()));
        }

        let mut values = self.values.lock().map_err(|_| StoreError::LockPoisoned)?;
        for (key, value) in batch.entries() {
            values.insert(key.clone(), *value);
        }
        debug!("Committed {} values to memory storage", batch.entries().len());
        Ok(())
    }
}
