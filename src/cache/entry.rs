//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and their expiry
//! deadline, including the legacy-tolerant durable form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// == Expiry ==
/// Expiration deadline for a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The entry does not expire by time
    Never,
    /// Unix-millisecond deadline after which the entry is stale
    At(u64),
}

impl Expiry {
    // == Sort Key ==
    /// Deadline usable as an ordering key, with `Never` after every dated
    /// deadline.
    pub fn deadline_or_max(self) -> u64 {
        match self {
            Expiry::Never => u64::MAX,
            Expiry::At(ms) => ms,
        }
    }
}

impl Default for Expiry {
    fn default() -> Self {
        Expiry::Never
    }
}

// Durable form: `false` for Never, a millisecond timestamp otherwise.
impl Serialize for Expiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expiry::Never => serializer.serialize_bool(false),
            Expiry::At(ms) => serializer.serialize_u64(*ms),
        }
    }
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Legacy payloads may carry `false`, `null`, `0` or no field at all;
        // every falsy form means "no deadline", never "already expired".
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0) | None => Expiry::Never,
                Some(ms) => Expiry::At(ms),
            },
            _ => Expiry::Never,
        })
    }
}

// == Cache Entry ==
/// Stored expiry/value pair for one cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Expiration deadline, `false` in the durable form when absent
    #[serde(default)]
    pub expires: Expiry,
    /// Serialized record or collection attributes
    pub value: Value,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry.
    pub fn new(value: Value, expires: Expiry) -> Self {
        Self { expires, value }
    }
}
