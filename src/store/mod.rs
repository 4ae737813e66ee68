//! Persistent counter storage
//!
//! A storage backend is a flat map of integer values with an atomic edit
//! batch. `CounterStore` layers the three step-counter keys on top of it.

pub mod file;
pub mod memory;

use std::sync::Arc;

use crate::{error::StoreError, state::StepCounterState};

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Key holding the day key of the last midnight reset
pub const KEY_CUR_DAY: &str = "CurDay";
/// Key holding the last raw cumulative count reported by the sensor
pub const KEY_LAST_STEPS: &str = "LastStepCount";
/// Key holding the raw count captured at the last midnight reset
pub const KEY_MIDNIGHT_STEPS: &str = "MidnightStepCount";

/// A group of writes that become visible together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBatch {
    entries: Vec<(String, i64)>,
}

impl EditBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_int(mut self, key: &str, value: i64) -> Self {
        self.entries.push((key.to_string(), value));
        self
    }

    pub fn entries(&self) -> &[(String, i64)] {
        &self.entries
    }
}

/// Integer key-value storage that survives restarts
pub trait KeyValueStorage: Send + Sync {
    fn get_int(&self, key: &str) -> Option<i64>;

    /// Apply every entry of `batch` at once
    fn commit(&self, batch: EditBatch) -> Result<(), StoreError>;
}

/// Typed view over the three persisted step-counter keys.
///
/// `CounterStore` does no locking of its own; the step state machine owns
/// it behind a mutex that covers each read-modify-write.
#[derive(Clone)]
pub struct CounterStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl CounterStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Read the persisted state, missing keys read as zero
    pub fn get(&self) -> StepCounterState {
        StepCounterState {
            last_step_count: self.storage.get_int(KEY_LAST_STEPS).unwrap_or(0),
            midnight_step_count: self.storage.get_int(KEY_MIDNIGHT_STEPS).unwrap_or(0),
            current_day: self
                .storage
                .get_int(KEY_CUR_DAY)
                .and_then(|day| i32::try_from(day).ok())
                .unwrap_or(0),
        }
    }

    pub fn set(&self, state: &StepCounterState) -> Result<(), StoreError> {
        let batch = EditBatch::new()
            .put_int(KEY_CUR_DAY, i64::from(state.current_day))
            .put_int(KEY_LAST_STEPS, state.last_step_count)
            .put_int(KEY_MIDNIGHT_STEPS, state.midnight_step_count);
        self.storage.commit(batch)
    }
}

impl std::fmt::Debug for CounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterStore").field("state", &self.get()).finish()
    }
}
