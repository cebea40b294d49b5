//! Fetch Module
//!
//! The fetch interceptor, the mutation invalidator, and the collaborator
//! seams they consume from the entity framework.

mod entity;
mod interceptor;
mod invalidate;
mod options;

// Re-export public types
pub use entity::{Backend, Entity};
pub use interceptor::{FetchCache, FetchHandle, FetchOrigin, FetchResult};
pub use options::{Callback, CacheEvent, FetchOptions, KeySource, MergeOptions, SyncVerb};
