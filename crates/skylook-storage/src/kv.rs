//! String key-value storage backends.
//!
//! The `KeyValueStore` trait is the only thing the higher-level stores see, so
//! tests can swap the file-backed store for an in-memory one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use skylook_core::StorageError;

/// Result type for key-value operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable string-keyed storage. Each `set` replaces the whole value for its
/// key (last write wins).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// JSON-object file holding every key, rewritten atomically on each `set`.
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Open the store at `path`. The file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::WriteFailed(format!("{}: {}", parent.display(), e)))?;
        }

        tracing::debug!("Opened key-value store at {:?}", path);
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> StorageResult<BTreeMap<String, String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::ReadFailed(e.to_string())),
        };

        serde_json::from_str(&contents).map_err(|e| StorageError::Corruption(e.to_string()))
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock();

        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StorageError::Corruption(e)) => {
                tracing::warn!("Discarding unreadable store {:?}: {}", self.path, e);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };

        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)?;

        tracing::debug!("Stored key {}", key);
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
