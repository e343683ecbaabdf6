//! # Key-Value Slots
//!
//! Durable string storage addressed by a fixed key, the equivalent of a
//! browser's local storage.
//!
//! ```text
//! ┌──────────────────────┐      ┌─────────────────────────────────────────┐
//! │ KeyValueSlot (trait) │      │ FileSlot                                │
//! │  read / write /      │ ◄─── │  <data_dir>/storefront-cart.json        │
//! │  remove              │      │  <data_dir>/storefront-favorites.json   │
//! └──────────────────────┘      └─────────────────────────────────────────┘
//!            ▲
//!            │                  ┌─────────────────────────────────────────┐
//!            └───────────────── │ MemorySlot (clones share one map)       │
//!                               └─────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use crate::error::{StoreError, StoreResult};

/// Durable string storage.
///
/// Writes are last-writer-wins; there is no atomicity across keys.
pub trait KeyValueSlot: Send + Sync {
    /// Returns the stored value, or `None` when the key was never written.
    fn read(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Deletes the value (no-op when absent).
    fn remove(&self, key: &str) -> StoreResult<()>;
}

// =============================================================================
// Memory Slot
// =============================================================================

/// In-process slot. Clones share the same map, so a test can drop a store and
/// load a new one from the same slot to simulate a restart.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueSlot for MemorySlot {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

// =============================================================================
// File Slot
// =============================================================================

/// One JSON file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    /// Creates a slot rooted at `dir` (created lazily on first write).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSlot { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueSlot for FileSlot {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(&path, value).map_err(io_err)?;

        trace!(path = %path.display(), bytes = value.len(), "Slot written");
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_slot_clones_share_state() {
        let slot = MemorySlot::new();
        let other = slot.clone();

        slot.write("storefront-cart", "[]").unwrap();
        assert_eq!(other.read("storefront-cart").unwrap().as_deref(), Some("[]"));

        other.remove("storefront-cart").unwrap();
        assert!(slot.read("storefront-cart").unwrap().is_none());
    }

    #[test]
    fn test_file_slot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("data"));

        assert!(slot.read("storefront-favorites").unwrap().is_none());

        slot.write("storefront-favorites", r#"["p1"]"#).unwrap();
        assert_eq!(
            slot.read("storefront-favorites").unwrap().as_deref(),
            Some(r#"["p1"]"#)
        );
        assert!(dir.path().join("data/storefront-favorites.json").exists());

        slot.remove("storefront-favorites").unwrap();
        slot.remove("storefront-favorites").unwrap();
        assert!(slot.read("storefront-favorites").unwrap().is_none());
    }

    #[test]
    fn test_file_slot_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path());

        assert!(matches!(
            slot.write("../escape", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(slot.read(""), Err(StoreError::InvalidKey(_))));
    }
}
