//! Extension-local key-value storage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::types::StorageError;

/// Key-value store scoped to the extension and shared by all of its pages.
///
/// Writes are last-write-wins; there is no locking across pages.
#[async_trait::async_trait]
pub trait ExtensionStorage: Send + Sync + 'static {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
}

/// A write observed by [`MemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageWrite {
    pub key: String,
    pub value: String,
    pub at: DateTime<Utc>,
}

/// In-memory storage that records every accepted write.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
    writes: Mutex<Vec<StorageWrite>>,
    invalidated: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All accepted writes, oldest first.
    pub fn writes(&self) -> Vec<StorageWrite> {
        self.writes.lock().clone()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Fail every subsequent call, like a reloaded extension.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.invalidated.load(Ordering::SeqCst) {
            return Err(StorageError::ContextInvalidated);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ExtensionStorage for MemoryStorage {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries.write().insert(key.to_owned(), value.to_owned());
        self.writes.lock().push(StorageWrite {
            key: key.to_owned(),
            value: value.to_owned(),
            at: Utc::now(),
        });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.value(key))
    }
}

/// Storage persisted to `<state_dir>/storage/local.json`.
///
/// The whole map is rewritten on every `set`.  Writers are serialized so
/// the file always holds the latest map.
pub struct JsonFileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
    write_lock: Mutex<()>,
}

impl JsonFileStorage {
    /// Load or create the store under `state_dir`.
    pub fn open(state_dir: &Path) -> Result<Self, StorageError> {
        let dir = state_dir.join("storage");
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::Io(e.to_string()))?;

        let path = dir.join("local.json");
        let entries: BTreeMap<String, String> = if path.exists() {
            let raw =
                std::fs::read_to_string(&path).map_err(|e| StorageError::Io(e.to_string()))?;
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "corrupt storage file, starting empty");
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        tracing::info!(
            entries = entries.len(),
            path = %path.display(),
            "extension storage loaded"
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json =
            serde_json::to_string_pretty(entries).map_err(|e| StorageError::Encode(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| StorageError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StorageError::Io(e.to_string()))
    }
}

#[async_trait::async_trait]
impl ExtensionStorage for JsonFileStorage {
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Held across update and flush: a stale snapshot must not overwrite
        // a newer one.
        let _guard = self.write_lock.lock();
        let snapshot = {
            let mut entries = self.entries.write();
            entries.insert(key.to_owned(), value.to_owned());
            entries.clone()
        };
        self.flush(&snapshot)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_storage_last_write_wins() {
        let storage = MemoryStorage::new();
        storage.set("currentSpreadsheetId", "A").await.unwrap();
        storage.set("currentSpreadsheetId", "B").await.unwrap();
        assert_eq!(
            storage.get("currentSpreadsheetId").await.unwrap().as_deref(),
            Some("B")
        );
        assert_eq!(storage.writes().len(), 2);
    }

    #[tokio::test]
    async fn invalidated_memory_storage_rejects_writes() {
        let storage = MemoryStorage::new();
        storage.invalidate();
        assert_eq!(
            storage.set("k", "v").await,
            Err(StorageError::ContextInvalidated)
        );
        assert!(storage.writes().is_empty());
    }

    #[tokio::test]
    async fn file_storage_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = JsonFileStorage::open(dir.path()).unwrap();
            storage.set("currentSpreadsheetId", "1A2B3C").await.unwrap();
        }
        let reopened = JsonFileStorage::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("currentSpreadsheetId").await.unwrap().as_deref(),
            Some("1A2B3C")
        );
    }

    #[test]
    fn file_storage_lives_under_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path()).unwrap();
        assert_eq!(storage.path(), dir.path().join("storage").join("local.json"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_all_reach_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = std::sync::Arc::new(JsonFileStorage::open(dir.path()).unwrap());

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage.set(&format!("key{i}"), &format!("value{i}")).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let reopened = JsonFileStorage::open(dir.path()).unwrap();
        for i in 0..32 {
            assert_eq!(
                reopened.get(&format!("key{i}")).await.unwrap(),
                Some(format!("value{i}"))
            );
        }
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("storage")).unwrap();
        std::fs::write(dir.path().join("storage/local.json"), "{not json").unwrap();
        let storage = JsonFileStorage::open(dir.path()).unwrap();
        assert_eq!(storage.get("anything").await.unwrap(), None);
    }
}
