//! Configuration Module
//!
//! Handles loading the demo binary's settings from environment variables.
//! The cache library itself reads no environment.

use std::env;

/// Demo configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the demo cache can hold
    pub capacity: usize,
    /// TTL in milliseconds used by the expiry walk-through
    pub demo_ttl_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Cache capacity (default: 2, zero falls back to default)
    /// - `DEMO_TTL_MS` - TTL in milliseconds (default: 100, zero falls back to default)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&v| v > 0)
                .unwrap_or(defaults.capacity),
            demo_ttl_ms: env::var("DEMO_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&v| v > 0)
                .unwrap_or(defaults.demo_ttl_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 2,
            demo_ttl_ms: 100,
        }
    }
}
