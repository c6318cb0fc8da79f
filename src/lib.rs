//! TTL LRU Cache - A fixed-capacity in-process key/value cache
//!
//! Provides O(1) access with least-recently-used eviction and optional
//! per-entry time-to-live expiration.

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::Cache;
pub use config::Config;
pub use error::{CacheError, Result};
