//! Key Derivation Module
//!
//! Computes the cache key for an entity/options pair.

use crate::fetch::{Entity, FetchOptions, KeySource};

// == Derive Key ==
/// Resolves the cache key for a fetch or sync call.
///
/// A per-call override (fixed string or derivation function) wins; otherwise
/// the entity's own locator is used. Returns None when no non-empty key can
/// be obtained, which callers must treat as "do not cache" — an entity
/// without a locator is a legitimate transient state, not an error.
pub fn derive_key<E: Entity>(entity: &E, opts: &FetchOptions<E>) -> Option<String> {
    let key = match &opts.cache_key {
        Some(KeySource::Fixed(key)) => Some(key.clone()),
        Some(KeySource::Derive(derive)) => derive(entity),
        None => entity.locator(),
    };
    key.filter(|k| !k.is_empty())
}
