//! Fetch Cache - a client-side response cache for record and collection fetches
//!
//! Intercepts data-fetch operations and serves previously retrieved results
//! while still valid, avoiding redundant network round-trips. Provides key
//! derivation, TTL expiry, priority-based eviction under storage-quota
//! pressure, a write-through durable mirror, and the prefill pattern: a
//! stale cached value is applied synchronously while a fresh fetch proceeds
//! in the background.
//!
//! The entity framework stays external; it plugs in through the
//! [`Entity`] and [`Backend`] traits. Caching is an optimization layer:
//! every cache-subsystem failure is recovered internally and degrades to an
//! uncached fetch, and only network failures reach the caller.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod storage;
pub mod tasks;

pub use cache::{
    CacheEntry, CacheStats, Clock, Expires, Expiry, Lookup, ManualClock, Store, SystemClock,
    CACHE_SLOT,
};
pub use config::Config;
pub use error::{FetchError, StorageError};
pub use fetch::{
    Backend, CacheEvent, Entity, FetchCache, FetchHandle, FetchOptions, FetchOrigin, FetchResult,
    KeySource, MergeOptions, SyncVerb,
};
pub use storage::{DurableStorage, FileStorage, MemoryStorage};
pub use tasks::spawn_sweep_task;
