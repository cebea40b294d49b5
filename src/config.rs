//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether the in-memory cache is mirrored to durable storage
    pub persistent: bool,
    /// Default expiry in seconds for entries without an explicit expiry
    pub default_expires: u64,
    /// Background expired-entry sweep interval in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FETCH_CACHE_PERSISTENT` - Mirror the cache to durable storage (default: true)
    /// - `FETCH_CACHE_DEFAULT_EXPIRES` - Default expiry in seconds (default: 300)
    /// - `FETCH_CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        Self {
            persistent: env::var("FETCH_CACHE_PERSISTENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            default_expires: env::var("FETCH_CACHE_DEFAULT_EXPIRES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            sweep_interval: env::var("FETCH_CACHE_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            persistent: true,
            default_expires: 300,
            sweep_interval: 60,
        }
    }
}
