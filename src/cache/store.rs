//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with an insertion-order
//! tracker, expiry checks and a write-through durable mirror. Durable
//! caching is best-effort: every storage failure is recovered here and the
//! in-memory mapping stays canonical.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::cache::{policy, CacheEntry, CacheStats, EvictionCmp, EvictionPrioritizer, InsertOrder};
use crate::storage::DurableStorage;

// == Public Constants ==
/// Name of the durable slot shared by record and collection entries.
pub const CACHE_SLOT: &str = "fetch_cache";

// == Lookup ==
/// Result of a cache probe.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Entry present and not past its deadline
    Fresh(CacheEntry),
    /// Entry present but stale; still usable as a prefill preview
    Stale(CacheEntry),
    /// No entry under this key
    Absent,
}

impl Lookup {
    /// The entry, fresh or stale.
    pub fn entry(&self) -> Option<&CacheEntry> {
        match self {
            Lookup::Fresh(entry) | Lookup::Stale(entry) => Some(entry),
            Lookup::Absent => None,
        }
    }
}

// == Cache Store ==
/// Cache mapping plus its durable mirror.
pub struct Store {
    /// Key-entry mapping
    entries: HashMap<String, CacheEntry>,
    /// Insertion-order tracker for eviction tie breaking
    order: InsertOrder,
    /// Eviction policy
    prioritizer: EvictionPrioritizer,
    /// Performance statistics
    stats: CacheStats,
    /// Durable medium, when the host provides one
    storage: Option<Box<dyn DurableStorage>>,
    /// Global persistence switch
    persistent: bool,
}

impl Store {
    // == Constructors ==
    /// Creates an in-memory-only store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertOrder::new(),
            prioritizer: EvictionPrioritizer::new(),
            stats: CacheStats::new(),
            storage: None,
            persistent: true,
        }
    }

    /// Creates a store mirrored into the given durable medium.
    pub fn with_storage(storage: Box<dyn DurableStorage>) -> Self {
        let mut store = Self::new();
        store.storage = Some(storage);
        store
    }

    // == Configuration ==
    /// Enables or disables the durable mirror.
    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    /// Installs a custom eviction comparator.
    pub fn set_eviction_cmp(&mut self, cmp: Box<EvictionCmp>) {
        self.prioritizer.set_cmp(cmp);
    }

    // == Load ==
    /// Populates the mapping from the durable slot at startup.
    ///
    /// Absent or malformed data resolves to an empty mapping, never a
    /// failure.
    pub fn load(&mut self) {
        let Some(storage) = &self.storage else {
            return;
        };
        if !self.persistent {
            return;
        }

        let raw = match storage.read_slot(CACHE_SLOT) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(err) => {
                debug!(error = %err, "durable cache slot unreadable; starting empty");
                return;
            }
        };

        match serde_json::from_str::<HashMap<String, CacheEntry>>(&raw) {
            Ok(entries) => {
                self.order.clear();
                for key in entries.keys() {
                    self.order.record(key);
                }
                self.entries = entries;
                self.stats.set_total_entries(self.entries.len());
                info!(entries = self.entries.len(), "cache primed from durable storage");
            }
            Err(err) => {
                warn!(error = %err, "malformed durable cache payload; starting empty");
            }
        }
    }

    // == Lookup ==
    /// Probes the cache, classifying the entry against `now_ms`.
    ///
    /// Only a fresh entry counts as a hit; stale and absent both count as
    /// misses.
    pub fn lookup(&mut self, key: &str, now_ms: u64) -> Lookup {
        match self.entries.get(key) {
            Some(entry) if !policy::is_expired(entry, now_ms) => {
                self.stats.record_hit();
                Lookup::Fresh(entry.clone())
            }
            Some(entry) => {
                self.stats.record_miss();
                Lookup::Stale(entry.clone())
            }
            None => {
                self.stats.record_miss();
                Lookup::Absent
            }
        }
    }

    // == Peek ==
    /// Reads an entry without touching statistics or expiry state.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Set ==
    /// Inserts or fully replaces the entry at `key`, then mirrors the
    /// mapping durably.
    ///
    /// On a capacity rejection, lower-priority entries are shed one at a
    /// time and the write retried. The entry being written is exempt from
    /// that shedding: if nothing else is left to evict the write is
    /// abandoned and the entry stays in memory only.
    pub fn set(&mut self, key: String, entry: CacheEntry) {
        self.order.record(&key);
        self.entries.insert(key.clone(), entry);
        self.stats.set_total_entries(self.entries.len());
        self.persist_exempting(Some(&key));
    }

    // == Remove ==
    /// Deletes one entry, then mirrors the mapping durably.
    ///
    /// Returns true when an entry was present.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        self.order.remove(key);
        self.stats.set_total_entries(self.entries.len());
        self.persist();
        true
    }

    // == Persist ==
    /// Serializes the full mapping into the durable slot.
    ///
    /// No-op when persistence is disabled or the host has no durable
    /// medium. All failures are swallowed here.
    pub fn persist(&mut self) {
        self.persist_exempting(None);
    }

    fn persist_exempting(&mut self, exempt: Option<&str>) {
        let Some(storage) = &self.storage else {
            return;
        };
        if !self.persistent {
            return;
        }

        loop {
            let payload = match serde_json::to_string(&self.entries) {
                Ok(payload) => payload,
                Err(err) => {
                    debug!(error = %err, "cache payload not serializable; skipping mirror");
                    self.stats.record_persist_failure();
                    return;
                }
            };

            match storage.write_slot(CACHE_SLOT, &payload) {
                Ok(()) => return,
                Err(err) if err.is_quota() => {
                    match self
                        .prioritizer
                        .evict_one(&mut self.entries, &mut self.order, exempt)
                    {
                        Some(evicted) => {
                            debug!(key = %evicted, "evicted entry to satisfy storage quota");
                            self.stats.record_eviction();
                            self.stats.set_total_entries(self.entries.len());
                        }
                        None => {
                            // Cache exhausted; the in-memory mapping stays
                            // ahead of the mirror.
                            warn!("storage quota still exceeded with nothing left to evict");
                            self.stats.record_persist_failure();
                            return;
                        }
                    }
                }
                Err(err) => {
                    debug!(error = %err, "durable write failed; keeping in-memory cache only");
                    self.stats.record_persist_failure();
                    return;
                }
            }
        }
    }

    // == Purge Expired ==
    /// Removes all entries past their deadline, then mirrors once.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self, now_ms: u64) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| policy::is_expired(entry, now_ms))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in &expired_keys {
            self.entries.remove(key);
            self.order.remove(key);
        }

        if count > 0 {
            self.stats.set_total_entries(self.entries.len());
            self.persist();
        }
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
