//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Cache misses are not
//! errors: lookups return `Option` and removing an absent key is a no-op.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A cache must hold at least one entry
    #[error("Cache capacity must be greater than zero")]
    ZeroCapacity,

    /// A TTL must be a positive duration
    #[error("TTL must be greater than zero")]
    ZeroTtl,

    /// TTL timers need a tokio runtime to run on
    #[error("No tokio runtime available to arm the TTL timer")]
    NoRuntime,

    /// Tail eviction was attempted on an empty recency list
    #[error("Recency list is empty")]
    EmptyList,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
