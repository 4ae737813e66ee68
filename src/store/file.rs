//! JSON file storage backend with a write-behind flusher

use std::{
    collections::BTreeMap,
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tracing::{debug, info, warn};

use super::{EditBatch, KeyValueStorage};
use crate::error::{ErrorSink, FaceError, StoreError};

/// Committed values, stored on disk as one flat JSON object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(skip)]
    revision: u64,
    #[serde(flatten)]
    values: BTreeMap<String, i64>,
}

/// Storage backed by a JSON object on disk.
///
/// Commits are visible to readers immediately. The file itself is written
/// by a background task in revision order, so a slow disk never stalls the
/// caller and an older snapshot never overwrites a newer one.
pub struct FileStorage {
    path: PathBuf,
    current: Mutex<Snapshot>,
    pending: watch::Sender<Snapshot>,
    written: Arc<AsyncMutex<u64>>,
}

impl FileStorage {
    /// Load `path` (if it exists) and start the background flusher.
    ///
    /// Must be called from within a tokio runtime. A file that cannot be
    /// parsed is reported to `sink` and the storage starts out empty.
    pub async fn open(
        path: impl AsRef<Path>,
        sink: Arc<dyn ErrorSink>,
    ) -> Result<Arc<Self>, StoreError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Snapshot>(&bytes) {
                Ok(snapshot) => {
                    info!("Loaded {} values from {}", snapshot.values.len(), path.display());
                    snapshot
                }
                Err(e) => {
                    sink.report(&FaceError::CorruptPersistedState {
                        last: 0,
                        midnight: 0,
                        detail: format!("unreadable state file {}: {}", path.display(), e),
                    });
                    Snapshot::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No state file at {}, starting empty", path.display());
                Snapshot::default()
            }
            Err(e) => return Err(e.into()),
        };

        let (pending, pending_rx) = watch::channel(snapshot.clone());
        let written = Arc::new(AsyncMutex::new(0));

        tokio::spawn(flush_task(
            path.clone(),
            pending_rx,
            Arc::clone(&written),
            sink,
        ));

        Ok(Arc::new(Self {
            path,
            current: Mutex::new(snapshot),
            pending,
            written,
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the latest committed values to disk and wait for completion
    pub async fn flush(&self) -> Result<(), StoreError> {
        let snapshot = self
            .current
            .lock()
            .map_err(|_| StoreError::LockPoisoned)?
            .clone();
        write_snapshot(&self.path, &self.written, &snapshot).await
    }
}

impl KeyValueStorage for FileStorage {
    fn get_int(&self, key: &str) -> Option<i64> {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.values.get(key).copied()
    }

    fn commit(&self, batch: EditBatch) -> Result<(), StoreError> {
        let mut current = self.current.lock().map_err(|_| StoreError::LockPoisoned)?;
        for (key, value) in batch.entries() {
            current.values.insert(key.clone(), *value);
        }
        current.revision += 1;
        self.pending.send_replace(current.clone());
        Ok(())
    }
}

impl std::fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage").field("path", &self.path).finish()
    }
}

/// Background task persisting the newest snapshot after every commit
async fn flush_task(
    path: PathBuf,
    mut pending_rx: watch::Receiver<Snapshot>,
    written: Arc<AsyncMutex<u64>>,
    sink: Arc<dyn ErrorSink>,
) {
    debug!("Starting state file flusher for {}", path.display());

    while pending_rx.changed().await.is_ok() {
        let snapshot = pending_rx.borrow_and_update().clone();
        if let Err(e) = write_snapshot(&path, &written, &snapshot).await {
            sink.report(&FaceError::PersistenceWriteFailure(e));
        }
    }

    debug!("State file flusher for {} stopped", path.display());
}

async fn write_snapshot(
    path: &Path,
    written: &AsyncMutex<u64>,
    snapshot: &Snapshot,
) -> Result<(), StoreError> {
    let mut last_written = written.lock().await;
    if snapshot.revision <= *last_written && *last_written != 0 {
        debug!(
            "Skipping stale snapshot r{} (already wrote r{})",
            snapshot.revision, *last_written
        );
        return Ok(());
    }

    let bytes = serde_json::to_vec_pretty(snapshot)?;
    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        warn!("Failed to move {} into place: {}", tmp.display(), e);
        return Err(e.into());
    }

    *last_written = snapshot.revision;
    debug!("Wrote state file {} at r{}", path.display(), snapshot.revision);
    Ok(())
}
