use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use super::{Persistence, StorageError};

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

/// JSON-file backed store.
///
/// All keys live in one pretty-printed JSON object. Writes rewrite the whole
/// file; the mutex serializes read-modify-write cycles within the process.
pub struct FileStore {
    data_dir: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE)
    }

    fn read_map(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Like `read_map`, but a corrupt file is replaced rather than blocking writes.
    fn read_map_for_write(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
        match Self::read_map(path) {
            Err(StorageError::Corrupt(e)) => {
                warn!(error = %e, path = %path.display(), "Discarding corrupt storage file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(map).map_err(StorageError::Encode)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

impl Persistence for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let map = Self::read_map(&self.path())?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = Self::read_map_for_write(&self.path())?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)?;
        debug!(key, "Stored value");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self.path();
        if !path.exists() {
            return Ok(());
        }
        let mut map = Self::read_map_for_write(&path)?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
            debug!(key, "Deleted value");
        }
        Ok(())
    }
}
