//! Integration Tests for the public Cache API
//!
//! Exercises LRU eviction, TTL expiration and concurrent access through
//! `ttl_lru_cache::Cache` only.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use ttl_lru_cache::{Cache, CacheError};

// == Helper Functions ==

fn lettered_cache() -> Cache<u32, &'static str> {
    let cache = Cache::new(2).unwrap();
    cache.add(1, "a");
    cache.add(2, "b");
    cache
}

/// Value whose drop reads back from the cache that held it
struct CallsBack {
    cache: Cache<u32, CallsBack>,
    drops: Arc<AtomicUsize>,
}

impl Drop for CallsBack {
    fn drop(&mut self) {
        let _ = self.cache.len();
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

fn calls_back(cache: &Cache<u32, CallsBack>, drops: &Arc<AtomicUsize>) -> CallsBack {
    CallsBack {
        cache: cache.clone(),
        drops: Arc::clone(drops),
    }
}

// == LRU Tests ==

#[test]
fn test_capacity_two_scenario() {
    let cache = lettered_cache();
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.cap(), 2);

    assert_eq!(cache.get(&1), Some("a"));
    assert_eq!(cache.get(&2), Some("b"));

    // Last touch order was 1 then 2, so 1 is least recently used
    cache.add(3, "c");

    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.get(&2), Some("b"));
    assert_eq!(cache.get(&3), Some("c"));
    assert_eq!(cache.get(&4), None);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_get_promotes_entry() {
    let cache = lettered_cache();

    // Touch 1 so that 2 becomes least recently used
    assert_eq!(cache.get(&1), Some("a"));
    cache.add(3, "c");

    assert_eq!(cache.get(&2), None);
    assert_eq!(cache.get(&1), Some("a"));
}

#[test]
fn test_update_in_place() {
    let cache = lettered_cache();

    cache.add(1, "z");

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get(&1), Some("z"));
    assert_eq!(cache.keys(), vec![1, 2]);
}

#[test]
fn test_update_promotes_without_eviction() {
    let cache = lettered_cache();

    // Updating 1 makes 2 the eviction candidate
    cache.add(1, "z");
    cache.add(3, "c");

    assert!(cache.contains_key(&1));
    assert!(!cache.contains_key(&2));
}

#[test]
fn test_remove_is_idempotent() {
    let cache = lettered_cache();

    cache.remove(&1);
    cache.remove(&1);
    cache.remove(&42);

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.get(&2), Some("b"));
}

#[test]
fn test_clear() {
    let cache = lettered_cache();

    cache.clear();

    assert_eq!(cache.len(), 0);
    assert!(cache.is_empty());
    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.get(&2), None);
}

#[test]
fn test_heterogeneous_string_keys() {
    let cache: Cache<String, Vec<u8>> = Cache::new(10).unwrap();

    cache.add("stringKey".to_string(), b"stringValue".to_vec());
    cache.add("other".to_string(), vec![1, 2, 3]);

    assert_eq!(cache.get("stringKey"), Some(b"stringValue".to_vec()));
    assert_eq!(cache.get("other"), Some(vec![1, 2, 3]));
}

#[test]
fn test_zero_capacity_rejected() {
    let result: Result<Cache<u32, u32>, _> = Cache::new(0);
    assert_eq!(result.unwrap_err(), CacheError::ZeroCapacity);
}

// == TTL Tests ==

#[tokio::test]
async fn test_ttl_expiry() {
    let cache = Cache::new(4).unwrap();

    cache
        .add_with_ttl("key", "value", Duration::from_millis(50))
        .unwrap();
    assert_eq!(cache.get("key"), Some("value"));

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(cache.get("key"), None);
    assert_eq!(cache.len(), 0);
}

#[tokio::test]
async fn test_ttl_rearm_times_from_last_call() {
    let cache = Cache::new(4).unwrap();

    cache
        .add_with_ttl("key", "first", Duration::from_millis(100))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    cache
        .add_with_ttl("key", "second", Duration::from_millis(300))
        .unwrap();

    // Past the first deadline, well before the second
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(cache.get("key"), Some("second"));

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(cache.get("key"), None);
}

#[tokio::test]
async fn test_plain_add_cancels_pending_ttl() {
    let cache = Cache::new(4).unwrap();

    cache
        .add_with_ttl("key", "temporary", Duration::from_millis(50))
        .unwrap();
    cache.add("key", "permanent");
    assert!(cache.ttl_remaining("key").is_none());

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(cache.get("key"), Some("permanent"));
}

#[tokio::test]
async fn test_remove_then_readd_survives_stale_timer() {
    let cache = Cache::new(4).unwrap();

    cache
        .add_with_ttl("key", "old", Duration::from_millis(50))
        .unwrap();
    cache.remove("key");
    cache.add("key", "new");

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(cache.get("key"), Some("new"));
}

#[tokio::test]
async fn test_clear_then_readd_survives_stale_timer() {
    let cache = Cache::new(4).unwrap();

    cache
        .add_with_ttl("key", "old", Duration::from_millis(50))
        .unwrap();
    cache.clear();
    cache.add("key", "new");

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(cache.get("key"), Some("new"));
}

#[tokio::test]
async fn test_evicted_ttl_key_readded_survives_stale_timer() {
    let cache = Cache::new(1).unwrap();

    cache
        .add_with_ttl("key", "old", Duration::from_millis(50))
        .unwrap();
    cache.add("other", "value");
    assert!(!cache.contains_key("key"));
    cache.add("key", "new");

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(cache.get("key"), Some("new"));
}

#[tokio::test]
async fn test_ttl_only_affects_its_key() {
    let cache = Cache::new(4).unwrap();

    cache.add("stays", 1);
    cache
        .add_with_ttl("goes", 2, Duration::from_millis(50))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(cache.get("stays"), Some(1));
    assert_eq!(cache.get("goes"), None);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_ttl_expires_after_runtime_shutdown() {
    let cache = Cache::new(4).unwrap();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        cache.add_with_ttl(1, 1, Duration::from_millis(10)).unwrap();
        cache.add_with_ttl(2, 2, Duration::from_millis(10)).unwrap();
    });
    cache.add(3, 3);

    // The timer tasks die with the runtime and never fire
    drop(runtime);
    thread::sleep(Duration::from_millis(50));

    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.len(), 1);
    assert!(!cache.contains_key(&2));
    assert_eq!(cache.ttl_remaining(&2), None);
    assert_eq!(cache.keys(), vec![3]);
}

#[tokio::test]
async fn test_get_misses_past_deadline_before_timer_runs() {
    let cache = Cache::new(4).unwrap();
    cache
        .add_with_ttl("key", "value", Duration::from_millis(10))
        .unwrap();

    // Blocking the only runtime thread keeps the timer from running
    thread::sleep(Duration::from_millis(50));

    assert_eq!(cache.get("key"), None);
    assert!(cache.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ttl_on_multi_thread_runtime() {
    let cache = Cache::new(64).unwrap();

    for key in 0..32u32 {
        cache
            .add_with_ttl(key, key, Duration::from_millis(50))
            .unwrap();
    }
    assert_eq!(cache.len(), 32);

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(cache.is_empty());
}

// == Drop Tests ==

#[test]
fn test_displaced_values_may_call_back_into_cache() {
    let cache: Cache<u32, CallsBack> = Cache::new(1).unwrap();
    let drops = Arc::new(AtomicUsize::new(0));
    let (done_tx, done_rx) = mpsc::channel();

    let worker = {
        let cache = cache.clone();
        let drops = Arc::clone(&drops);
        thread::spawn(move || {
            cache.add(1, calls_back(&cache, &drops));
            // Update, eviction, removal and clear each drop one value
            cache.add(1, calls_back(&cache, &drops));
            cache.add(2, calls_back(&cache, &drops));
            cache.remove(&2);
            cache.add(3, calls_back(&cache, &drops));
            cache.clear();
            done_tx.send(()).unwrap();
        })
    };

    // A value dropped under the lock would deadlock the worker
    done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("cache deadlocked while dropping a value");
    worker.join().unwrap();
    assert_eq!(drops.load(Ordering::SeqCst), 4);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_expired_value_may_call_back_into_cache() {
    let cache: Cache<u32, CallsBack> = Cache::new(2).unwrap();
    let drops = Arc::new(AtomicUsize::new(0));

    cache
        .add_with_ttl(1, calls_back(&cache, &drops), Duration::from_millis(20))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert!(cache.is_empty());
}

// == Concurrency Tests ==

#[test]
fn test_concurrent_access_keeps_invariants() {
    let cache = Arc::new(Cache::new(16).unwrap());
    let mut handles = Vec::new();

    for worker in 0..8u32 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..2_000u32 {
                let key = (worker * 7 + i) % 40;
                match i % 4 {
                    0 | 1 => cache.add(key, i),
                    2 => {
                        cache.get(&key);
                    }
                    _ => cache.remove(&key),
                }
                assert!(cache.len() <= cache.cap());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let keys = cache.keys();
    assert_eq!(keys.len(), cache.len());
    assert!(keys.iter().all(|key| cache.contains_key(key)));
}
