//! Cache Module
//!
//! The cache engine: entries, expiry policy, key derivation, eviction
//! prioritization and the durable-mirrored store.

mod clock;
mod entry;
mod evict;
pub mod key;
pub mod policy;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, Expiry};
pub use evict::{EvictionCmp, EvictionPrioritizer, InsertOrder};
pub use policy::{compute_expiry, is_expired, Expires, DEFAULT_EXPIRES_SECS};
pub use stats::CacheStats;
pub use store::{Lookup, Store, CACHE_SLOT};
