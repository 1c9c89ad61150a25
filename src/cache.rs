//! In-memory memoization cache with a per-entry TTL.
//!
//! Expiry is lazy: an entry older than the TTL is dropped when a read finds
//! it, or by an explicit [`TtlCache::purge_expired`] / [`TtlCache::clear`].
//! There is no background sweeper, so the map only shrinks on those calls.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Default TTL: 5 minutes in ms.
pub const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;

/// Source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to. Used to drive expiry in tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self { now: AtomicI64::new(start_millis) }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: i64,
}

/// Thread-safe key → value cache whose entries expire `ttl_ms` after insertion.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl_ms", &self.ttl_ms)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl_ms: u64) -> Self {
        Self::with_clock(ttl_ms, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_ms: i64::try_from(ttl_ms).unwrap_or(i64::MAX),
            clock,
        }
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned map is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: i64) -> bool {
        now.saturating_sub(entry.stored_at) > self.ttl_ms
    }

    /// Look up a key. An expired entry is removed and reported as a miss.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now_millis();
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if self.is_expired(entry, now) {
            entries.remove(key);
            debug!("cache entry expired");
            return None;
        }
        Some(entry.value.clone())
    }

    /// Insert or overwrite, resetting the entry's timestamp.
    pub fn set(&self, key: K, value: V) {
        let stored_at = self.clock.now_millis();
        self.lock().insert(key, CacheEntry { value, stored_at });
    }

    /// Return the cached value or compute, store and return a fresh one.
    ///
    /// `compute` runs without the lock held; two callers racing on the same
    /// missing key may both compute, and the later `set` wins.
    pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(hit) = self.get(&key) {
            debug!("cache hit");
            return hit;
        }
        debug!("cache miss");
        let value = compute();
        self.set(key, value.clone());
        value
    }

    /// Like [`Self::get_or_insert_with`] for fallible computations. Errors are
    /// returned as-is and never cached.
    pub fn try_get_or_insert_with<F, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(hit) = self.get(&key) {
            debug!("cache hit");
            return Ok(hit);
        }
        debug!("cache miss");
        let value = compute()?;
        self.set(key, value.clone());
        Ok(value)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop expired entries now, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_sub(entry.stored_at) <= self.ttl_ms);
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until they are evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn manual_cache(ttl_ms: u64) -> (TtlCache<String, u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        (TtlCache::with_clock(ttl_ms, clock.clone()), clock)
    }

    #[test]
    fn test_cache_set_get() {
        let (cache, _clock) = manual_cache(DEFAULT_TTL_MS);
        cache.set("380001".to_string(), 7);
        assert_eq!(cache.get("380001"), Some(7));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_miss() {
        let (cache, _clock) = manual_cache(DEFAULT_TTL_MS);
        assert_eq!(cache.get("nonexistent"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_alive_at_exact_ttl() {
        let (cache, clock) = manual_cache(100);
        cache.set("k".to_string(), 1);
        clock.advance(100);
        assert_eq!(cache.get("k"), Some(1));
    }

    #[test]
    fn test_expired_entry_removed_on_read() {
        let (cache, clock) = manual_cache(DEFAULT_TTL_MS);
        cache.set("k".to_string(), 1);
        clock.advance(DEFAULT_TTL_MS as i64 + 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);

        cache.set("k".to_string(), 2);
        clock.advance(10);
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_set_overwrites_value_and_timestamp() {
        let (cache, clock) = manual_cache(100);
        cache.set("k".to_string(), 1);
        clock.advance(80);
        cache.set("k".to_string(), 2);
        clock.advance(80);
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_clear() {
        let (cache, _clock) = manual_cache(100);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_purge_expired() {
        let (cache, clock) = manual_cache(100);
        cache.set("old".to_string(), 1);
        clock.advance(60);
        cache.set("new".to_string(), 2);
        clock.advance(60);
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("new"), Some(2));
    }

    #[test]
    fn test_get_or_insert_with_memoizes() {
        let (cache, clock) = manual_cache(100);
        let mut calls = 0;
        let mut compute = |v| {
            calls += 1;
            v
        };
        assert_eq!(cache.get_or_insert_with("k".to_string(), || compute(1)), 1);
        assert_eq!(cache.get_or_insert_with("k".to_string(), || compute(2)), 1);
        clock.advance(101);
        assert_eq!(cache.get_or_insert_with("k".to_string(), || compute(3)), 3);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let (cache, _clock) = manual_cache(100);
        let err: Result<u32, &str> = cache.try_get_or_insert_with("k".to_string(), || Err("boom"));
        assert_eq!(err, Err("boom"));
        assert!(cache.is_empty());
        let ok: Result<u32, &str> = cache.try_get_or_insert_with("k".to_string(), || Ok(5));
        assert_eq!(ok, Ok(5));
        assert_eq!(cache.get("k"), Some(5));
    }

    #[test]
    fn test_zero_ttl_survives_same_instant() {
        let (cache, clock) = manual_cache(0);
        cache.set("k".to_string(), 1);
        assert_eq!(cache.get("k"), Some(1));
        clock.advance(1);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(TtlCache::<u32, u32>::new(DEFAULT_TTL_MS));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        cache.set(i, t);
                        assert!(cache.get(&i).is_some());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 100);
    }
}
