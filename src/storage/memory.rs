//! In-Memory Storage Backend
//!
//! Durable-medium stand-in with an optional per-slot byte quota. Handles are
//! cheap clones sharing the same slots, so a test can keep one while the
//! store owns another.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StorageError;
use crate::storage::DurableStorage;

// == Memory Storage ==
/// Process-local slot map with an optional byte quota.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    // == Constructors ==
    /// Creates an unbounded storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage that rejects any slot payload larger than
    /// `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            quota_bytes: Some(quota_bytes),
        }
    }
}

impl DurableStorage for MemoryStorage {
    fn read_slot(&self, slot: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.lock().get(slot).cloned())
    }

    fn write_slot(&self, slot: &str, payload: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            if payload.len() > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        self.slots.lock().insert(slot.to_string(), payload.to_string());
        Ok(())
    }
}
