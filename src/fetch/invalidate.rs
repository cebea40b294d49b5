//! Mutation Invalidator Module
//!
//! Wraps the base sync operation for write verbs: purges the cache entries a
//! mutation makes stale, then always delegates. Invalidation is a side
//! effect, never a substitute for the real write.

use futures::future::LocalBoxFuture;
use serde_json::Value;
use tracing::debug;

use crate::cache::key;
use crate::error::FetchError;
use crate::fetch::{Backend, Entity, FetchCache, FetchOptions, SyncVerb};

impl FetchCache {
    // == Sync ==
    /// Intercepts a sync for `entity`.
    ///
    /// For `create`, `update`, `patch` and `delete`, the entity's own cache
    /// entry and its parent collection's entry (when one exists) are removed
    /// before the base operation runs. `read` passes through untouched. The
    /// base operation's result is returned as-is.
    pub fn sync<'a, E, B>(
        &'a self,
        verb: SyncVerb,
        entity: &'a mut E,
        opts: FetchOptions<E>,
        backend: &'a B,
    ) -> LocalBoxFuture<'a, Result<Value, FetchError>>
    where
        E: Entity,
        B: Backend<E>,
    {
        if !verb.is_read() {
            let own = key::derive_key(entity, &opts);
            let parent = entity.collection_locator().filter(|k| !k.is_empty());

            let store = self.store();
            let mut store = store.write();
            if let Some(key) = &own {
                if store.remove(key) {
                    debug!(%key, ?verb, "invalidated cache entry on mutation");
                }
            }
            if let Some(key) = &parent {
                if store.remove(key) {
                    debug!(%key, ?verb, "invalidated parent collection entry on mutation");
                }
            }
        }

        Box::pin(async move { backend.sync(verb, entity, &opts).await })
    }
}
