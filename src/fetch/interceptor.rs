//! Fetch Interceptor Module
//!
//! Wraps the base fetch operation: decides cache-hit vs cache-miss vs
//! prefill and orchestrates result delivery. The cache-check phase runs
//! synchronously before the returned handle exists, so a prefill preview is
//! always applied (and its progress payload exposed) before the network leg
//! is even initiated.

use std::sync::Arc;

use futures::future::LocalBoxFuture;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::cache::{
    key, policy, CacheEntry, CacheStats, Clock, Expires, Lookup, Store, SystemClock,
    DEFAULT_EXPIRES_SECS,
};
use crate::config::Config;
use crate::error::FetchError;
use crate::fetch::{Backend, CacheEvent, Entity, FetchOptions};
use crate::storage::DurableStorage;

// == Fetch Origin ==
/// Where the authoritative payload of a resolved fetch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    Cache,
    Network,
}

// == Fetch Result ==
/// Terminal value of a fetch call.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Whether the cache or the network produced the payload
    pub origin: FetchOrigin,
    /// Cached attributes on a hit, raw response on a network resolution
    pub response: Value,
}

// == Fetch Handle ==
/// Asynchronous handle returned by [`FetchCache::fetch`].
///
/// A cache hit resolves immediately; otherwise the handle carries the
/// pending network leg, plus the prefill preview payload when one was
/// applied.
pub enum FetchHandle<'a> {
    /// Served synchronously from cache; no network call was made
    Cached(FetchResult),
    /// Network leg pending
    Pending {
        /// Progress payload: the prefill preview applied before the network
        /// leg, if any
        preview: Option<Value>,
        fut: LocalBoxFuture<'a, Result<FetchResult, FetchError>>,
    },
}

impl<'a> FetchHandle<'a> {
    // == Preview ==
    /// Progress payload available before the network leg resolves.
    pub fn preview(&self) -> Option<&Value> {
        match self {
            FetchHandle::Cached(_) => None,
            FetchHandle::Pending { preview, .. } => preview.as_ref(),
        }
    }

    // == Is Cached ==
    /// True when the fetch already resolved from cache.
    pub fn is_cached(&self) -> bool {
        matches!(self, FetchHandle::Cached(_))
    }

    // == Resolve ==
    /// Drives the handle to its terminal state.
    pub async fn resolve(self) -> Result<FetchResult, FetchError> {
        match self {
            FetchHandle::Cached(result) => Ok(result),
            FetchHandle::Pending { fut, .. } => fut.await,
        }
    }
}

// == Fetch Cache ==
/// The cache engine: store, clock and the fetch/sync wrappers.
///
/// Construct one per process at startup and inject it wherever fetches are
/// issued; separate instances are fully isolated, which is what tests want.
pub struct FetchCache {
    store: Arc<RwLock<Store>>,
    clock: Arc<dyn Clock>,
    default_expires_secs: u64,
}

impl FetchCache {
    // == Constructors ==
    /// Wraps a store with the system clock.
    pub fn new(store: Store) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Wraps a store with an explicit clock.
    pub fn with_clock(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            clock,
            default_expires_secs: DEFAULT_EXPIRES_SECS,
        }
    }

    /// Builds the cache from configuration, priming it from the durable
    /// medium when one is given.
    pub fn from_config(config: &Config, storage: Option<Box<dyn DurableStorage>>) -> Self {
        let mut store = match storage {
            Some(storage) => Store::with_storage(storage),
            None => Store::new(),
        };
        store.set_persistent(config.persistent);
        store.load();
        let mut cache = Self::new(store);
        cache.default_expires_secs = config.default_expires;
        cache
    }

    // == Store Access ==
    /// Shared handle to the underlying store (sweeper, direct invalidation).
    pub fn store(&self) -> Arc<RwLock<Store>> {
        Arc::clone(&self.store)
    }

    // == Stats ==
    /// Snapshot of cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.store.read().stats()
    }

    // == Fetch ==
    /// Intercepts a fetch for `entity`.
    ///
    /// The cache-check phase completes before this returns:
    /// - fresh entry and `opts.cache`: applied, `success` invoked,
    ///   `CacheSync` emitted once, resolved handle returned, no network;
    /// - `opts.prefill` and any entry: applied, `prefill_success` invoked,
    ///   `CacheSync` emitted once, then the network leg still runs with the
    ///   preview exposed on the handle;
    /// - otherwise the handle just carries the network leg.
    ///
    /// Resolving the network leg writes the freshly serialized entity into
    /// the store under the same key, invokes `success` with the raw
    /// response, and emits `Sync`. A rejected leg propagates untouched and
    /// writes nothing. Concurrent fetches for one key are not deduplicated;
    /// the last network response to complete wins the cache write.
    pub fn fetch<'a, E, B>(
        &'a self,
        entity: &'a mut E,
        mut opts: FetchOptions<E>,
        backend: &'a B,
    ) -> FetchHandle<'a>
    where
        E: Entity,
        B: Backend<E>,
    {
        let now = self.clock.now_ms();
        let derived = key::derive_key(entity, &opts);

        // A missing key means the entity is not cacheable yet; the fetch
        // still runs, just uncached.
        let lookup = match &derived {
            Some(key) => self.store.write().lookup(key, now),
            None => Lookup::Absent,
        };

        if opts.cache {
            if let Lookup::Fresh(entry) = &lookup {
                entity.apply_value(&entry.value, opts.merge);
                if let Some(success) = opts.success.as_mut() {
                    success(entity, &entry.value);
                }
                entity.emit(CacheEvent::CacheSync);
                debug!(key = derived.as_deref().unwrap_or(""), "fetch served from cache");
                return FetchHandle::Cached(FetchResult {
                    origin: FetchOrigin::Cache,
                    response: entry.value.clone(),
                });
            }
        }

        // Prefill applies even a stale entry as an optimistic preview; the
        // network leg runs regardless.
        let mut preview = None;
        if opts.prefill {
            if let Some(entry) = lookup.entry() {
                entity.apply_value(&entry.value, opts.merge);
                if let Some(prefill_success) = opts.prefill_success.as_mut() {
                    prefill_success(entity, &entry.value);
                }
                entity.emit(CacheEvent::CacheSync);
                preview = Some(entry.value.clone());
            }
        }

        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        let default_expires = Expires::After(self.default_expires_secs);
        let fut = async move {
            let response = backend.fetch(entity, &opts).await?;

            // The base fetch applied the response; cache the entity's
            // serialized state under the same key.
            if let Some(key) = derived {
                let expires = opts.expires.unwrap_or(default_expires);
                let expiry = policy::compute_expiry(expires, clock.now_ms());
                let entry = CacheEntry::new(entity.serialize(), expiry);
                store.write().set(key, entry);
            }

            if let Some(success) = opts.success.as_mut() {
                success(entity, &response);
            }
            entity.emit(CacheEvent::Sync);

            Ok(FetchResult {
                origin: FetchOrigin::Network,
                response,
            })
        };

        FetchHandle::Pending {
            preview,
            fut: Box::pin(fut),
        }
    }
}
