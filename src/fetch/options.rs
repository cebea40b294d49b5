//! Fetch Options Module
//!
//! Structured per-call configuration for fetch and sync operations.

use serde_json::Value;

use crate::cache::Expires;

// == Callback ==
/// Callback receiving the entity and a payload (cached attributes or the raw
/// network response).
pub type Callback<E> = Box<dyn FnMut(&E, &Value)>;

// == Merge Options ==
/// How fetched or cached attributes are merged into a collection.
///
/// Forwarded untouched to [`Entity::apply_value`](crate::fetch::Entity), so
/// the cache path applies data with the same semantics as the network path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Append fetched records instead of resetting the collection
    pub add: bool,
    /// Allow removal of records missing from the payload
    pub remove: bool,
    /// Force a full reset
    pub reset: bool,
}

// == Key Source ==
/// Per-call cache key override.
pub enum KeySource<E> {
    /// Use this key verbatim
    Fixed(String),
    /// Derive the key from the entity at call time
    Derive(Box<dyn Fn(&E) -> Option<String>>),
}

// == Sync Verb ==
/// Verb carried by a sync delegation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncVerb {
    Create,
    Read,
    Update,
    Patch,
    Delete,
}

impl SyncVerb {
    /// Read verbs never invalidate cache entries.
    pub fn is_read(self) -> bool {
        matches!(self, SyncVerb::Read)
    }
}

// == Cache Event ==
/// Synchronization event emitted on an entity when attributes change.
///
/// `CacheSync` marks a cache-origin update, distinct from the standard
/// `Sync` emitted after a network-origin update, so observers can tell the
/// two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    CacheSync,
    Sync,
}

// == Fetch Options ==
/// Options recognized by the fetch interceptor.
pub struct FetchOptions<E> {
    /// Permit a fresh cache entry to short-circuit the network fetch
    pub cache: bool,
    /// Entry lifetime applied when the result is cached; None uses the
    /// configured default (300 seconds out of the box)
    pub expires: Option<Expires>,
    /// Apply any cached value synchronously, then fetch regardless
    pub prefill: bool,
    /// Collection merge hints
    pub merge: MergeOptions,
    /// Per-call cache key override
    pub cache_key: Option<KeySource<E>>,
    /// Invoked once the authoritative value is applied
    pub success: Option<Callback<E>>,
    /// Invoked synchronously when a prefill preview is applied
    pub prefill_success: Option<Callback<E>>,
}

impl<E> FetchOptions<E> {
    // == Constructor ==
    /// Creates options with the defaults: no cache hit short-circuit, no
    /// prefill, default expiry.
    pub fn new() -> Self {
        Self {
            cache: false,
            expires: None,
            prefill: false,
            merge: MergeOptions::default(),
            cache_key: None,
            success: None,
            prefill_success: None,
        }
    }

    // == Builders ==
    /// Permits cache hits.
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Sets the entry lifetime for the eventual cache write.
    pub fn with_expires(mut self, expires: Expires) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Enables the prefill pattern.
    pub fn with_prefill(mut self, prefill: bool) -> Self {
        self.prefill = prefill;
        self
    }

    /// Sets collection merge hints.
    pub fn with_merge(mut self, merge: MergeOptions) -> Self {
        self.merge = merge;
        self
    }

    /// Overrides key derivation for this call.
    pub fn with_cache_key(mut self, source: KeySource<E>) -> Self {
        self.cache_key = Some(source);
        self
    }

    /// Registers the success callback.
    pub fn on_success(mut self, callback: impl FnMut(&E, &Value) + 'static) -> Self {
        self.success = Some(Box::new(callback));
        self
    }

    /// Registers the prefill preview callback.
    pub fn on_prefill_success(mut self, callback: impl FnMut(&E, &Value) + 'static) -> Self {
        self.prefill_success = Some(Box::new(callback));
        self
    }
}

impl<E> Default for FetchOptions<E> {
    fn default() -> Self {
        Self::new()
    }
}
