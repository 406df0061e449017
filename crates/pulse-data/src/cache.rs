//! Time-bounded memoization with single-flight computation.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

impl<V> Entry<V> {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

type Slot<V> = Arc<Mutex<Option<Entry<V>>>>;

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Async TTL cache.
///
/// Each key owns a slot guarded by its own lock. Concurrent callers for the
/// same expired key queue on that lock, so exactly one of them computes
/// while the rest observe its result. Different keys never block each
/// other. Failed computations are not stored.
pub struct TtlCache<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    async fn all_slots(&self) -> Vec<Slot<V>> {
        self.slots.lock().await.values().cloned().collect()
    }

    async fn slot(&self, key: &K) -> Slot<V> {
        let mut slots = self.slots.lock().await;
        slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Return the value stored under `key` if younger than `ttl`, otherwise
    /// run `compute`, store its value and return it.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, ttl: Duration, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(&key).await;
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.is_fresh(ttl, Instant::now()) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!("cache hit");
                return Ok(cached.value.clone());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!("cache miss, computing");
        let value = compute().await?;
        *entry = Some(Entry {
            value: value.clone(),
            stored_at: Instant::now(),
        });
        Ok(value)
    }

    /// Fresh value for `key`, if any. Never computes.
    pub async fn get(&self, key: &K, ttl: Duration) -> Option<V> {
        let slot = {
            let slots = self.slots.lock().await;
            slots.get(key).cloned()
        }?;
        let entry = slot.lock().await;
        entry
            .as_ref()
            .filter(|e| e.is_fresh(ttl, Instant::now()))
            .map(|e| e.value.clone())
    }

    /// Drop the value for `key` so the next lookup recomputes.
    pub async fn invalidate(&self, key: &K) {
        let slot = {
            let slots = self.slots.lock().await;
            slots.get(key).cloned()
        };
        if let Some(slot) = slot {
            *slot.lock().await = None;
        }
    }

    /// Drop every stored value.
    ///
    /// Slots are emptied rather than removed, so a computation still in
    /// flight keeps its waiters and the next caller queues behind it.
    pub async fn clear(&self) {
        for slot in self.all_slots().await {
            *slot.lock().await = None;
        }
    }

    /// Number of stored values. Waits for in-flight computations.
    pub async fn len(&self) -> usize {
        let mut stored = 0;
        for slot in self.all_slots().await {
            if slot.lock().await.is_some() {
                stored += 1;
            }
        }
        stored
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
