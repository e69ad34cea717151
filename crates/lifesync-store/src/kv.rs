//! `KeyValueStore` implementations.
//!
//! `MemoryStore` keeps values in a map and is used by tests and the
//! simulated scenarios. `FileStore` keeps one JSON text file per key under a
//! data directory so values survive restarts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use lifesync_contracts::error::{LifeSyncError, LifeSyncResult};
use lifesync_core::traits::KeyValueStore;

fn poisoned(e: impl std::fmt::Display) -> LifeSyncError {
    LifeSyncError::StorageFailed {
        reason: format!("store lock poisoned: {}", e),
    }
}

// ── Memory ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> LifeSyncResult<Option<String>> {
        Ok(self.values.lock().map_err(poisoned)?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> LifeSyncResult<()> {
        self.values
            .lock()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> LifeSyncResult<()> {
        self.values.lock().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> LifeSyncResult<String>,
    ) -> LifeSyncResult<String> {
        let mut values = self.values.lock().map_err(poisoned)?;
        let next = f(values.get(key).cloned())?;
        values.insert(key.to_string(), next.clone());
        Ok(next)
    }
}

// ── File ──────────────────────────────────────────────────────────────────────

/// One `<key>.json` file per key under `data_dir`.
///
/// Writes go to a temporary sibling and are renamed into place, so a reader
/// sees either the old or the new value. `update` is serialized within this
/// process by an internal lock.
#[derive(Debug)]
pub struct FileStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> LifeSyncResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|e| LifeSyncError::StorageFailed {
            reason: format!("cannot create data dir '{}': {}", data_dir.display(), e),
        })?;
        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: &str) -> LifeSyncResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(LifeSyncError::StorageFailed {
                reason: format!("invalid store key '{}'", key),
            });
        }
        Ok(self.data_dir.join(format!("{}.json", key)))
    }

    fn read_path(path: &Path) -> LifeSyncResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LifeSyncError::StorageFailed {
                reason: format!("cannot read '{}': {}", path.display(), e),
            }),
        }
    }

    fn write_path(path: &Path, value: &str) -> LifeSyncResult<()> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, path))
            .map_err(|e| LifeSyncError::StorageFailed {
                reason: format!("cannot write '{}': {}", path.display(), e),
            })?;
        debug!(path = %path.display(), bytes = value.len(), "store value written");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> LifeSyncResult<Option<String>> {
        Self::read_path(&self.path_for(key)?)
    }

    fn write(&self, key: &str, value: &str) -> LifeSyncResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().map_err(poisoned)?;
        Self::write_path(&path, value)
    }

    fn remove(&self, key: &str) -> LifeSyncResult<()> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().map_err(poisoned)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LifeSyncError::StorageFailed {
                reason: format!("cannot remove '{}': {}", path.display(), e),
            }),
        }
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> LifeSyncResult<String>,
    ) -> LifeSyncResult<String> {
        let path = self.path_for(key)?;
        let _guard = self.write_lock.lock().map_err(poisoned)?;
        let next = f(Self::read_path(&path)?)?;
        Self::write_path(&path, &next)?;
        Ok(next)
    }
}
