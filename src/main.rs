//! TTL LRU Cache - demo
//!
//! Walks through LRU eviction and TTL expiration on a small cache.

use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_lru_cache::{Cache, Config};

/// Entry point for the cache demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Fill the cache, read it back and overflow it by one key
/// 4. Store a key with TTL and watch it expire
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_lru_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: capacity={}, demo_ttl_ms={}",
        config.capacity, config.demo_ttl_ms
    );

    let cache: Cache<usize, String> = Cache::new(config.capacity)?;
    info!(len = cache.len(), cap = cache.cap(), "Cache created");

    run_eviction_demo(&cache);
    run_ttl_demo(&cache, Duration::from_millis(config.demo_ttl_ms)).await?;

    info!("Demo complete");
    Ok(())
}

/// Fills the cache, touches every key in insertion order, then adds one
/// more key so the least recently used one is evicted.
fn run_eviction_demo(cache: &Cache<usize, String>) {
    let cap = cache.cap();

    for key in 1..=cap {
        cache.add(key, label(key));
    }
    for key in 1..=cap {
        info!(key, value = ?cache.get(&key), "get");
    }

    let overflow = cap + 1;
    cache.add(overflow, label(overflow));
    info!(key = overflow, len = cache.len(), "Added one key past capacity");

    for key in 1..=overflow + 1 {
        info!(key, value = ?cache.get(&key), "get");
    }
}

/// Stores a key with TTL and checks it before and after the deadline.
async fn run_ttl_demo(cache: &Cache<usize, String>, ttl: Duration) -> anyhow::Result<()> {
    let key = 0;
    cache.add_with_ttl(key, "ephemeral".to_string(), ttl)?;
    info!(key, value = ?cache.get(&key), ttl = ?cache.ttl_remaining(&key), "Stored with TTL");

    tokio::time::sleep(ttl * 2).await;
    info!(key, value = ?cache.get(&key), len = cache.len(), "After TTL elapsed");
    Ok(())
}

/// Letter label for a key: 1 -> "a", 2 -> "b", ...
fn label(key: usize) -> String {
    let letter = (b'a' + ((key - 1) % 26) as u8) as char;
    letter.to_string()
}
