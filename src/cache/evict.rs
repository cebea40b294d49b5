//! Eviction Module
//!
//! Orders cache entries for removal when the durable medium rejects a write
//! due to capacity.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use crate::cache::CacheEntry;

// == Eviction Comparator ==
/// Comparator over two entries; `Less` means the left entry is evicted first.
pub type EvictionCmp = dyn Fn(&CacheEntry, &CacheEntry) -> Ordering + Send + Sync;

// == Insert Order ==
/// Tracks insertion order of cache keys.
///
/// Front = oldest inserted. Breaks eviction-priority ties, and decides alone
/// once every remaining entry is non-expiring. Overwriting a key keeps its
/// original slot; only a genuinely new key appends.
#[derive(Debug, Default)]
pub struct InsertOrder {
    order: VecDeque<String>,
}

impl InsertOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record ==
    /// Registers a key at the newest position unless it is already tracked.
    pub fn record(&mut self, key: &str) {
        if !self.order.iter().any(|k| k == key) {
            self.order.push_back(key.to_string());
        }
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Clear ==
    /// Drops all tracked keys.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Position ==
    /// Insertion rank of a key; untracked keys sort after everything else.
    pub fn position(&self, key: &str) -> usize {
        self.order
            .iter()
            .position(|k| k == key)
            .unwrap_or(usize::MAX)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// == Eviction Prioritizer ==
/// Selects which entry to shed when durable storage is over capacity.
///
/// The default policy evicts the entry with the earliest deadline, treating
/// non-expiring entries as having an infinitely late deadline, so they go
/// last. Ties fall back to oldest-inserted-first. A custom comparator
/// replaces the deadline ordering but not the insertion-order tie break.
#[derive(Default)]
pub struct EvictionPrioritizer {
    cmp: Option<Box<EvictionCmp>>,
}

impl EvictionPrioritizer {
    // == Constructor ==
    /// Creates a prioritizer using the default deadline policy.
    pub fn new() -> Self {
        Self { cmp: None }
    }

    // == Set Comparator ==
    /// Installs a custom entry comparator.
    pub fn set_cmp(&mut self, cmp: Box<EvictionCmp>) {
        self.cmp = Some(cmp);
    }

    // == Select Candidate ==
    /// Picks the lowest-priority key, skipping `exempt` when given.
    ///
    /// Returns None when no evictable entry remains.
    pub fn select_candidate(
        &self,
        entries: &HashMap<String, CacheEntry>,
        order: &InsertOrder,
        exempt: Option<&str>,
    ) -> Option<String> {
        entries
            .iter()
            .filter(|(key, _)| exempt != Some(key.as_str()))
            .min_by(|(key_a, entry_a), (key_b, entry_b)| {
                self.compare(entry_a, entry_b)
                    .then_with(|| order.position(key_a).cmp(&order.position(key_b)))
            })
            .map(|(key, _)| key.clone())
    }

    // == Evict One ==
    /// Removes the lowest-priority entry from the mapping.
    ///
    /// No persistence side effect; the caller drives the subsequent durable
    /// write attempt.
    pub fn evict_one(
        &self,
        entries: &mut HashMap<String, CacheEntry>,
        order: &mut InsertOrder,
        exempt: Option<&str>,
    ) -> Option<String> {
        let key = self.select_candidate(entries, order, exempt)?;
        entries.remove(&key);
        order.remove(&key);
        Some(key)
    }

    fn compare(&self, a: &CacheEntry, b: &CacheEntry) -> Ordering {
        match &self.cmp {
            Some(cmp) => cmp(a, b),
            None => a
                .expires
                .deadline_or_max()
                .cmp(&b.expires.deadline_or_max()),
        }
    }
}
