//! Expiry Policy Module
//!
//! Computes expiration deadlines for cache writes and validates entries
//! against the current time.

use crate::cache::{CacheEntry, Expiry};

// == Public Constants ==
/// Default entry lifetime in seconds when no explicit expiry is requested.
pub const DEFAULT_EXPIRES_SECS: u64 = 5 * 60;

// == Expires ==
/// Relative expiry requested for a cache write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expires {
    /// Entry lives until evicted or invalidated
    Never,
    /// Entry expires this many seconds after insertion
    After(u64),
}

impl Default for Expires {
    fn default() -> Self {
        Expires::After(DEFAULT_EXPIRES_SECS)
    }
}

// == Compute Expiry ==
/// Resolves a requested expiry into an absolute deadline at insertion time.
pub fn compute_expiry(expires: Expires, now_ms: u64) -> Expiry {
    match expires {
        Expires::Never => Expiry::Never,
        Expires::After(secs) => Expiry::At(now_ms.saturating_add(secs.saturating_mul(1000))),
    }
}

// == Is Expired ==
/// Whether an entry is past its deadline.
///
/// An entry is stale only when its deadline is strictly earlier than the
/// current time; non-expiring entries are never stale.
pub fn is_expired(entry: &CacheEntry, now_ms: u64) -> bool {
    match entry.expires {
        Expiry::Never => false,
        Expiry::At(deadline) => deadline < now_ms,
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compute_expiry_default() {
        let expiry = compute_expiry(Expires::default(), 10_000);
        assert_eq!(expiry, Expiry::At(10_000 + 300 * 1000));
    }

    #[test]
    fn test_compute_expiry_explicit_seconds() {
        let expiry = compute_expiry(Expires::After(1_000), 0);
        assert_eq!(expiry, Expiry::At(1_000_000));
    }

    #[test]
    fn test_compute_expiry_never() {
        assert_eq!(compute_expiry(Expires::Never, 123), Expiry::Never);
    }

    #[test]
    fn test_compute_expiry_saturates() {
        let expiry = compute_expiry(Expires::After(u64::MAX), 1);
        assert_eq!(expiry, Expiry::At(u64::MAX));
    }

    #[test]
    fn test_never_entries_are_never_expired() {
        let entry = CacheEntry::new(json!(1), Expiry::Never);
        assert!(!is_expired(&entry, u64::MAX));
    }

    #[test]
    fn test_dated_entry_expiry_boundary() {
        let entry = CacheEntry::new(json!(1), Expiry::At(1_000));

        // Fresh strictly before and exactly at the deadline.
        assert!(!is_expired(&entry, 999));
        assert!(!is_expired(&entry, 1_000));
        // Stale once the deadline has passed.
        assert!(is_expired(&entry, 1_001));
    }
}
