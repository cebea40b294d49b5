//! Integration tests for the fetch interceptor and mutation invalidator
//!
//! Exercises the cache end to end against a scripted backend standing in
//! for the entity framework's network transport.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use serde_json::{json, Value};

use fetch_cache::{
    Backend, CacheEntry, CacheEvent, Config, Entity, Expires, Expiry, FetchCache, FetchError,
    FetchOptions, FetchOrigin, FileStorage, KeySource, ManualClock, MergeOptions, Store, SyncVerb,
};
use futures::future::LocalBoxFuture;

// == Test Entity ==
/// Minimal record/collection stand-in: attributes plus a locator.
struct TestEntity {
    url: Option<String>,
    parent_url: Option<String>,
    attrs: Value,
    events: Vec<CacheEvent>,
    applied: Vec<Value>,
}

impl TestEntity {
    fn at(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            parent_url: None,
            attrs: Value::Null,
            events: Vec::new(),
            applied: Vec::new(),
        }
    }

    fn unsaved() -> Self {
        Self {
            url: None,
            parent_url: None,
            attrs: Value::Null,
            events: Vec::new(),
            applied: Vec::new(),
        }
    }

    fn in_collection(url: &str, parent_url: &str) -> Self {
        Self {
            parent_url: Some(parent_url.to_string()),
            ..Self::at(url)
        }
    }
}

impl Entity for TestEntity {
    fn locator(&self) -> Option<String> {
        self.url.clone()
    }

    fn serialize(&self) -> Value {
        self.attrs.clone()
    }

    fn apply_value(&mut self, value: &Value, _merge: MergeOptions) {
        self.attrs = value.clone();
        self.applied.push(value.clone());
    }

    fn emit(&mut self, event: CacheEvent) {
        self.events.push(event);
    }

    fn collection_locator(&self) -> Option<String> {
        self.parent_url.clone()
    }
}

// == Scripted Backend ==
/// Base fetch/sync transport returning a fixed payload (or failing).
struct ScriptedBackend {
    response: Value,
    fail: bool,
    fetch_calls: Cell<usize>,
    sync_calls: RefCell<Vec<SyncVerb>>,
}

impl ScriptedBackend {
    fn returning(response: Value) -> Self {
        Self {
            response,
            fail: false,
            fetch_calls: Cell::new(0),
            sync_calls: RefCell::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::returning(Value::Null)
        }
    }
}

impl Backend<TestEntity> for ScriptedBackend {
    fn fetch<'a>(
        &'a self,
        entity: &'a mut TestEntity,
        _opts: &'a FetchOptions<TestEntity>,
    ) -> LocalBoxFuture<'a, Result<Value, FetchError>> {
        Box::pin(async move {
            self.fetch_calls.set(self.fetch_calls.get() + 1);
            if self.fail {
                return Err(FetchError::from(anyhow::anyhow!("connection refused")));
            }
            // The base fetch applies the response to the entity itself.
            entity.attrs = self.response.clone();
            Ok(self.response.clone())
        })
    }

    fn sync<'a>(
        &'a self,
        verb: SyncVerb,
        entity: &'a mut TestEntity,
        _opts: &'a FetchOptions<TestEntity>,
    ) -> LocalBoxFuture<'a, Result<Value, FetchError>> {
        Box::pin(async move {
            self.sync_calls.borrow_mut().push(verb);
            if self.fail {
                return Err(FetchError::from(anyhow::anyhow!("connection refused")));
            }
            entity.attrs = self.response.clone();
            Ok(self.response.clone())
        })
    }
}

// == Helpers ==
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fetch_cache=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

fn cache_with_clock(start_ms: u64) -> (FetchCache, Arc<ManualClock>) {
    init_tracing();
    let clock = Arc::new(ManualClock::new(start_ms));
    let cache = FetchCache::with_clock(Store::new(), clock.clone());
    (cache, clock)
}

fn seed(cache: &FetchCache, key: &str, value: Value, expiry: Expiry) {
    cache.store().write().set(key.to_string(), CacheEntry::new(value, expiry));
}

// == Fetch Scenarios ==

#[tokio::test]
async fn model_fetch_caches_then_expires() {
    let (cache, clock) = cache_with_clock(0);
    let backend = ScriptedBackend::returning(json!({"sausages": "bacon"}));
    let mut model = TestEntity::at("/models/1");

    // t=0: miss, network fetch, entry cached with a 1000 s lifetime.
    let opts = FetchOptions::new()
        .with_cache(true)
        .with_expires(Expires::After(1_000));
    let result = cache.fetch(&mut model, opts, &backend).resolve().await.unwrap();
    assert_eq!(result.origin, FetchOrigin::Network);
    assert_eq!(backend.fetch_calls.get(), 1);

    let store = cache.store();
    let expires = store.read().peek("/models/1").unwrap().expires;
    assert_eq!(expires, Expiry::At(1_000_000));
    drop(store);

    // t=500 000 ms: fresh hit, no network call.
    clock.set(500_000);
    let opts = FetchOptions::new().with_cache(true);
    let handle = cache.fetch(&mut model, opts, &backend);
    assert!(handle.is_cached());
    let result = handle.resolve().await.unwrap();
    assert_eq!(result.origin, FetchOrigin::Cache);
    assert_eq!(result.response, json!({"sausages": "bacon"}));
    assert_eq!(backend.fetch_calls.get(), 1);

    // t=1 500 000 ms: expired, back to the network.
    clock.set(1_500_000);
    let opts = FetchOptions::new().with_cache(true);
    let handle = cache.fetch(&mut model, opts, &backend);
    assert!(!handle.is_cached());
    let result = handle.resolve().await.unwrap();
    assert_eq!(result.origin, FetchOrigin::Network);
    assert_eq!(backend.fetch_calls.get(), 2);
}

#[tokio::test]
async fn cache_hit_applies_value_and_emits_cache_sync_once() {
    let (cache, _clock) = cache_with_clock(0);
    let backend = ScriptedBackend::returning(json!({"fresh": true}));
    let mut model = TestEntity::at("/models/1");
    seed(&cache, "/models/1", json!({"cheese": "pickle"}), Expiry::At(10_000));

    let successes: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
    let recorded = successes.clone();
    let opts = FetchOptions::new()
        .with_cache(true)
        .on_success(move |_entity: &TestEntity, value: &Value| {
            recorded.borrow_mut().push(value.clone());
        });

    let result = cache.fetch(&mut model, opts, &backend).resolve().await.unwrap();

    assert_eq!(result.origin, FetchOrigin::Cache);
    assert_eq!(model.attrs, json!({"cheese": "pickle"}));
    assert_eq!(*successes.borrow(), vec![json!({"cheese": "pickle"})]);
    assert_eq!(model.events, vec![CacheEvent::CacheSync]);
    assert_eq!(backend.fetch_calls.get(), 0);
}

#[tokio::test]
async fn fetch_without_cache_option_ignores_fresh_entry() {
    let (cache, _clock) = cache_with_clock(0);
    let backend = ScriptedBackend::returning(json!({"fresh": true}));
    let mut model = TestEntity::at("/models/1");
    seed(&cache, "/models/1", json!({"stale": true}), Expiry::At(10_000));

    let result = cache
        .fetch(&mut model, FetchOptions::new(), &backend)
        .resolve()
        .await
        .unwrap();

    assert_eq!(result.origin, FetchOrigin::Network);
    assert_eq!(model.attrs, json!({"fresh": true}));
    assert_eq!(backend.fetch_calls.get(), 1);
}

#[tokio::test]
async fn prefill_previews_then_fetches_and_overwrites() {
    let (cache, _clock) = cache_with_clock(0);
    let backend = ScriptedBackend::returning(json!([{"id": 1}, {"id": 2}]));
    let mut list = TestEntity::at("/list");
    seed(&cache, "/list", json!([{"id": 1}]), Expiry::At(10_000));

    let previews: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
    let successes: Rc<RefCell<Vec<Value>>> = Rc::new(RefCell::new(Vec::new()));
    let recorded_previews = previews.clone();
    let recorded_successes = successes.clone();

    let opts = FetchOptions::new()
        .with_prefill(true)
        .on_prefill_success(move |_entity: &TestEntity, value: &Value| {
            recorded_previews.borrow_mut().push(value.clone());
        })
        .on_success(move |_entity: &TestEntity, value: &Value| {
            recorded_successes.borrow_mut().push(value.clone());
        });

    let handle = cache.fetch(&mut list, opts, &backend);

    // The preview fired synchronously, before the network leg resolves.
    assert!(!handle.is_cached());
    assert_eq!(handle.preview(), Some(&json!([{"id": 1}])));
    assert_eq!(*previews.borrow(), vec![json!([{"id": 1}])]);
    assert!(successes.borrow().is_empty());

    let result = handle.resolve().await.unwrap();

    assert_eq!(result.origin, FetchOrigin::Network);
    assert_eq!(backend.fetch_calls.get(), 1);
    assert_eq!(*successes.borrow(), vec![json!([{"id": 1}, {"id": 2}])]);
    assert_eq!(list.events, vec![CacheEvent::CacheSync, CacheEvent::Sync]);

    // The cache entry was overwritten by the network payload.
    let store = cache.store();
    let cached = store.read().peek("/list").unwrap().value.clone();
    assert_eq!(cached, json!([{"id": 1}, {"id": 2}]));
}

#[tokio::test]
async fn prefill_applies_even_a_stale_entry() {
    let (cache, clock) = cache_with_clock(0);
    let backend = ScriptedBackend::returning(json!({"fresh": true}));
    let mut model = TestEntity::at("/models/1");
    seed(&cache, "/models/1", json!({"old": true}), Expiry::At(1_000));

    clock.set(5_000);
    let handle = cache.fetch(&mut model, FetchOptions::new().with_prefill(true), &backend);

    assert_eq!(handle.preview(), Some(&json!({"old": true})));
    let result = handle.resolve().await.unwrap();
    assert_eq!(result.origin, FetchOrigin::Network);
    assert_eq!(model.attrs, json!({"fresh": true}));
}

#[tokio::test]
async fn prefill_without_entry_has_no_preview() {
    let (cache, _clock) = cache_with_clock(0);
    let backend = ScriptedBackend::returning(json!({"fresh": true}));
    let mut model = TestEntity::at("/models/1");

    let fired = Rc::new(Cell::new(false));
    let fired_flag = fired.clone();
    let opts = FetchOptions::new()
        .with_prefill(true)
        .on_prefill_success(move |_: &TestEntity, _: &Value| fired_flag.set(true));

    let handle = cache.fetch(&mut model, opts, &backend);
    assert!(handle.preview().is_none());

    handle.resolve().await.unwrap();
    assert!(!fired.get());
    assert_eq!(backend.fetch_calls.get(), 1);
}

#[tokio::test]
async fn network_failure_propagates_and_writes_nothing() {
    let (cache, _clock) = cache_with_clock(0);
    let backend = ScriptedBackend::failing();
    let mut model = TestEntity::at("/models/1");

    let err = cache
        .fetch(&mut model, FetchOptions::new().with_cache(true), &backend)
        .resolve()
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Network(_)));
    assert!(cache.store().read().is_empty());
    assert!(model.events.is_empty());
}

#[tokio::test]
async fn missing_locator_fetches_uncached() {
    let (cache, _clock) = cache_with_clock(0);
    let backend = ScriptedBackend::returning(json!({"a": 1}));
    let mut model = TestEntity::unsaved();

    let result = cache
        .fetch(&mut model, FetchOptions::new().with_cache(true), &backend)
        .resolve()
        .await
        .unwrap();

    assert_eq!(result.origin, FetchOrigin::Network);
    assert!(cache.store().read().is_empty());
}

#[tokio::test]
async fn cache_key_override_is_honored() {
    let (cache, _clock) = cache_with_clock(0);
    let backend = ScriptedBackend::returning(json!({"fresh": true}));
    let mut model = TestEntity::at("/models/1");
    seed(&cache, "search:rust", json!({"hit": true}), Expiry::Never);

    let opts = FetchOptions::new()
        .with_cache(true)
        .with_cache_key(KeySource::Fixed("search:rust".to_string()));
    let handle = cache.fetch(&mut model, opts, &backend);

    assert!(handle.is_cached());
    drop(handle);
    assert_eq!(model.attrs, json!({"hit": true}));
}

// == Mutation Invalidation ==

#[tokio::test]
async fn create_sync_invalidates_record_and_parent_collection() {
    let (cache, _clock) = cache_with_clock(0);
    let backend = ScriptedBackend::returning(json!({"id": 1}));
    let mut model = TestEntity::in_collection("/models/1", "/models");
    seed(&cache, "/models/1", json!({"id": 1}), Expiry::Never);
    seed(&cache, "/models", json!([{"id": 1}]), Expiry::Never);
    seed(&cache, "/other", json!({"keep": true}), Expiry::Never);

    let response = cache
        .sync(SyncVerb::Create, &mut model, FetchOptions::new(), &backend)
        .await
        .unwrap();

    assert_eq!(response, json!({"id": 1}));
    assert_eq!(*backend.sync_calls.borrow(), vec![SyncVerb::Create]);

    let store = cache.store();
    let store = store.read();
    assert!(store.peek("/models/1").is_none());
    assert!(store.peek("/models").is_none());
    assert!(store.peek("/other").is_some());
}

#[tokio::test]
async fn read_sync_passes_through_without_invalidation() {
    let (cache, _clock) = cache_with_clock(0);
    let backend = ScriptedBackend::returning(json!({"id": 1}));
    let mut model = TestEntity::in_collection("/models/1", "/models");
    seed(&cache, "/models/1", json!({"id": 1}), Expiry::Never);
    seed(&cache, "/models", json!([{"id": 1}]), Expiry::Never);

    cache
        .sync(SyncVerb::Read, &mut model, FetchOptions::new(), &backend)
        .await
        .unwrap();

    assert_eq!(*backend.sync_calls.borrow(), vec![SyncVerb::Read]);

    let store = cache.store();
    let store = store.read();
    assert!(store.peek("/models/1").is_some());
    assert!(store.peek("/models").is_some());
}

#[tokio::test]
async fn delete_sync_still_delegates_after_invalidation() {
    let (cache, _clock) = cache_with_clock(0);
    let backend = ScriptedBackend::returning(Value::Null);
    let mut model = TestEntity::at("/models/1");
    seed(&cache, "/models/1", json!({"id": 1}), Expiry::Never);

    cache
        .sync(SyncVerb::Delete, &mut model, FetchOptions::new(), &backend)
        .await
        .unwrap();

    assert_eq!(*backend.sync_calls.borrow(), vec![SyncVerb::Delete]);
    assert!(cache.store().read().is_empty());
}

// == Durable Persistence ==

#[tokio::test]
async fn cache_survives_a_restart_through_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let backend = ScriptedBackend::returning(json!({"sausages": "bacon"}));

    // First process: fetch over the network, mirroring durably.
    {
        let cache = FetchCache::from_config(
            &config,
            Some(Box::new(FileStorage::new(dir.path()))),
        );
        let mut model = TestEntity::at("/models/1");
        cache
            .fetch(&mut model, FetchOptions::new().with_cache(true), &backend)
            .resolve()
            .await
            .unwrap();
    }
    assert_eq!(backend.fetch_calls.get(), 1);

    // Second process: primed from the durable slot, serves the hit without
    // touching the network.
    let cache = FetchCache::from_config(
        &config,
        Some(Box::new(FileStorage::new(dir.path()))),
    );
    let mut model = TestEntity::at("/models/1");
    let handle = cache.fetch(&mut model, FetchOptions::new().with_cache(true), &backend);

    assert!(handle.is_cached());
    drop(handle);
    assert_eq!(model.attrs, json!({"sausages": "bacon"}));
    assert_eq!(backend.fetch_calls.get(), 1);
}

#[tokio::test]
async fn persistence_disabled_keeps_cache_memory_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        persistent: false,
        ..Config::default()
    };
    let backend = ScriptedBackend::returning(json!({"a": 1}));

    {
        let cache = FetchCache::from_config(
            &config,
            Some(Box::new(FileStorage::new(dir.path()))),
        );
        let mut model = TestEntity::at("/models/1");
        cache
            .fetch(&mut model, FetchOptions::new(), &backend)
            .resolve()
            .await
            .unwrap();
    }

    // Nothing was mirrored, so a fresh cache starts cold.
    let cache = FetchCache::from_config(
        &config,
        Some(Box::new(FileStorage::new(dir.path()))),
    );
    assert!(cache.store().read().is_empty());
}
