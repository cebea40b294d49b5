//! Durable Storage Module
//!
//! Abstracts the durable key-value medium the cache mirrors into.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;

// == Durable Storage Trait ==
/// Named-slot key-value medium.
///
/// Implementations report capacity rejections through errors whose
/// [`StorageError::is_quota`] is true; the store reacts to those by shedding
/// entries and retrying.
pub trait DurableStorage: Send + Sync {
    /// Reads the raw payload stored under `slot`, None when absent.
    fn read_slot(&self, slot: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the payload stored under `slot`.
    fn write_slot(&self, slot: &str, payload: &str) -> Result<(), StorageError>;
}
