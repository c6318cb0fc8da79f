//! Cache Module
//!
//! Provides in-memory caching with LRU eviction and per-entry TTL expiration.

mod entry;
mod list;
mod shared;
mod store;


pub use shared::Cache;

pub(crate) use entry::Expiry;
pub(crate) use store::CacheStore;
