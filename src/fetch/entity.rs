//! Entity Collaborator Traits
//!
//! The cache consumes the entity framework only through these seams: a
//! stable identity, a serialize step, a value-application step, an event
//! hook, and the base fetch/sync transport. The interceptor composes with an
//! injected [`Backend`] instead of patching any shared method table.

use futures::future::LocalBoxFuture;
use serde_json::Value;

use crate::error::FetchError;
use crate::fetch::{CacheEvent, FetchOptions, MergeOptions, SyncVerb};

// == Entity Trait ==
/// Data-bearing record or collection, as seen by the cache.
pub trait Entity {
    /// Stable identity used as the default cache key.
    ///
    /// None when the entity is not yet addressable (e.g. unsaved), which
    /// disables caching for the call without failing it.
    fn locator(&self) -> Option<String>;

    /// Plain serialized attributes, as stored in the cache.
    fn serialize(&self) -> Value;

    /// Applies attributes through the same parse/normalize step the network
    /// path uses. `merge` carries collection merge hints.
    fn apply_value(&mut self, value: &Value, merge: MergeOptions);

    /// Change-notification hook.
    fn emit(&mut self, event: CacheEvent);

    /// Locator of the parent collection, when the entity belongs to one.
    ///
    /// Mutations on the entity also invalidate the parent's cache entry.
    fn collection_locator(&self) -> Option<String> {
        None
    }
}

// == Backend Trait ==
/// The base fetch/sync transport the interceptor wraps.
///
/// Futures are local: all cache operations run on one logical thread and
/// interleave only at task-queue granularity.
pub trait Backend<E: Entity> {
    /// Performs the real fetch: network I/O plus application of the response
    /// to the entity. Resolves with the raw response payload.
    fn fetch<'a>(
        &'a self,
        entity: &'a mut E,
        opts: &'a FetchOptions<E>,
    ) -> LocalBoxFuture<'a, Result<Value, FetchError>>;

    /// Performs the real write for `verb`. Resolves with the raw response.
    fn sync<'a>(
        &'a self,
        verb: SyncVerb,
        entity: &'a mut E,
        opts: &'a FetchOptions<E>,
    ) -> LocalBoxFuture<'a, Result<Value, FetchError>>;
}
