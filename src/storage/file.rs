//! File Storage Backend
//!
//! Durable medium keeping one JSON file per slot inside a directory.
//! Out-of-space errors surface as quota conditions so the store's eviction
//! loop can react.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::StorageError;
use crate::storage::DurableStorage;

// == File Storage ==
/// Slot-per-file storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    // == Constructor ==
    /// Creates a storage rooted at `dir`. The directory is created lazily on
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }
}

impl DurableStorage for FileStorage {
    fn read_slot(&self, slot: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_slot(&self, slot: &str, payload: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.slot_path(slot), payload)?;
        Ok(())
    }
}
