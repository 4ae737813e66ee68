//! Error taxonomy and the error sink capability

use thiserror::Error;
use tracing::{error, warn};

/// Failures raised by a key-value storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend refused the edit batch
    #[error("storage rejected write: {0}")]
    WriteRejected(String),

    /// Reading or writing the backing file failed
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be encoded or decoded
    #[error("storage encoding error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A previous holder of the storage lock panicked
    #[error("storage lock poisoned")]
    LockPoisoned,
}

/// Anomalies the core absorbs and reports instead of propagating
#[derive(Debug, Error)]
pub enum FaceError {
    #[error("failed to persist step state: {0}")]
    PersistenceWriteFailure(#[from] StoreError),

    #[error("corrupt persisted step state (last={last}, midnight={midnight}): {detail}")]
    CorruptPersistedState {
        last: i64,
        midnight: i64,
        detail: String,
    },

    #[error("no step counter sensor present, steps will read zero")]
    SensorUnavailable,
}

/// Destination for anomalies detected by the core.
///
/// Implementations must not block: reports arrive from sensor callbacks
/// and timer ticks.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &FaceError);
}

/// Default sink that writes every report to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, error: &FaceError) {
        match error {
            FaceError::SensorUnavailable => warn!("{}", error),
            _ => error!("{}", error),
        }
    }
}
