//! Error types for the fetch cache
//!
//! Provides unified error handling using thiserror.
//!
//! Cache-subsystem failures (`StorageError`) are always recovered locally and
//! degrade to "caching disabled"; only network-layer failures (`FetchError`)
//! surface to callers.

use thiserror::Error;

// == Storage Error Enum ==
/// Failures reported by the durable key-value medium.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The medium rejected a write due to capacity
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// The medium is disabled or unsupported on this host
    #[error("durable storage unavailable")]
    Unavailable,

    /// I/O failure from a file-backed medium
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache payload could not be serialized
    #[error("storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    /// `ENOSPC`: device out of space.
    const ENOSPC: i32 = 28;
    /// `EDQUOT`: per-user disk quota exhausted.
    const EDQUOT: i32 = 122;

    // == Quota Classification ==
    /// Folds the platform-specific capacity signals into one condition.
    ///
    /// An explicit quota rejection and the file-system out-of-space errno
    /// family are the same condition as far as eviction is concerned.
    pub fn is_quota(&self) -> bool {
        match self {
            StorageError::QuotaExceeded => true,
            StorageError::Io(err) => matches!(
                err.raw_os_error(),
                Some(Self::ENOSPC) | Some(Self::EDQUOT)
            ),
            _ => false,
        }
    }
}

// == Fetch Error Enum ==
/// Failures surfaced by a fetch or sync delegation.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The underlying network operation failed
    #[error("network request failed: {0}")]
    Network(anyhow::Error),
}

impl From<anyhow::Error> for FetchError {
    fn from(err: anyhow::Error) -> Self {
        FetchError::Network(err)
    }
}
