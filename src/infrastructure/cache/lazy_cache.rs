//! Synchronous worker-local lazy resource cache.
//!
//! Amortizes the cost of constructing a large, non-serializable resource
//! (a loaded model, a lexicon) across many units of work running in one
//! worker process. Construction happens at most once per key; concurrent
//! callers for the same uncached key coalesce onto a single construction.

use crate::domain::error::{CacheError, CacheResult};
use crate::domain::models::{CacheConfig, CacheStats, StatsCounters};
use crate::domain::ports::ResourceLoader;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Mutable cache state behind the lock.
///
/// `entries` may hold empty cells for keys whose construction failed or is
/// in flight; `lru` tracks only keys with a constructed resource, in
/// least-recently-used order (front is coldest).
struct CacheInner<K, R> {
    entries: HashMap<K, Arc<OnceCell<Arc<R>>>>,
    lru: Vec<K>,
}

impl<K, R> CacheInner<K, R> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            lru: Vec::new(),
        }
    }
}

/// Process-local memoizing cache for expensive keyed resources.
///
/// The cache is an owned instance with an explicit lifecycle: construct it
/// once at worker startup, share it (typically via `Arc`) with every unit
/// of work, and drop it with the worker. There is no global state.
///
/// Guarantees per key, per cache instance:
/// - at most one successful construction; later accesses return the same
///   `Arc` without invoking the loader
/// - a failed construction caches nothing; the next access retries
/// - concurrent accesses for an uncached key run exactly one loader call,
///   and every caller observes the fully constructed instance
///
/// # Examples
///
/// ```
/// use oncecache::{CacheConfig, LazyCache};
/// use std::sync::Arc;
///
/// let cache: LazyCache<&str, String> = LazyCache::new(CacheConfig::named("models"));
/// let loader = |key: &&str| -> anyhow::Result<String> { Ok(format!("model:{key}")) };
///
/// let first = cache.get(&"en", &loader).unwrap();
/// let second = cache.get(&"en", &loader).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub struct LazyCache<K, R> {
    inner: Mutex<CacheInner<K, R>>,
    config: CacheConfig,
    stats: StatsCounters,
}

impl<K, R> LazyCache<K, R>
where
    K: Eq + Hash + Clone + Display,
{
    /// Create an empty cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner::new()),
            config,
            stats: StatsCounters::new(),
        }
    }

    /// Get the resource for `key`, constructing it on first access.
    ///
    /// If the key is uncached, `loader` runs on the calling thread and the
    /// call blocks until construction completes. Other threads asking for
    /// the same key block until the in-flight construction resolves and
    /// then share its outcome: the constructed instance on success, or a
    /// retry of their own on failure.
    ///
    /// # Errors
    /// Returns [`CacheError::LoadFailed`] when the loader fails. Nothing is
    /// cached for the key in that case.
    pub fn get<L>(&self, key: &K, loader: &L) -> CacheResult<Arc<R>>
    where
        L: ResourceLoader<K, Resource = R>,
        R: Send + Sync + 'static,
    {
        let cell = self.cell_for(key);

        if cell.get().is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }

        let mut loaded = false;
        let value = cell.get_or_try_init(|| {
            let started = Instant::now();
            debug!(cache = %self.config.name, key = %key, "constructing resource");

            match loader.load(key) {
                Ok(resource) => {
                    loaded = true;
                    info!(
                        cache = %self.config.name,
                        key = %key,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "resource constructed"
                    );
                    Ok(Arc::new(resource))
                }
                Err(err) => {
                    self.stats.record_load_failure();
                    warn!(
                        cache = %self.config.name,
                        key = %key,
                        error = %err,
                        "resource construction failed"
                    );
                    Err(CacheError::load_failed(key, err))
                }
            }
        })?;
        let value = Arc::clone(value);

        if loaded {
            self.stats.record_load();
            self.note_constructed(key);
        } else {
            self.touch(key);
        }

        Ok(value)
    }

    /// Return the constructed resource for `key` without loading or
    /// touching LRU order. `None` if the key has no constructed resource.
    pub fn peek(&self, key: &K) -> Option<Arc<R>> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Whether `key` currently has a constructed resource.
    pub fn contains(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }

    /// Number of constructed resources currently retained.
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.lru.len()
    }

    /// Whether the cache retains no constructed resources.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the cache's counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// The configuration this cache was built with.
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Drop every entry. Owner-driven reset only; the cache never clears
    /// itself.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.clear();
        inner.lru.clear();
        debug!(cache = %self.config.name, "cache cleared");
    }

    /// Fetch or insert the once-cell for `key`.
    ///
    /// Failed constructions leave their empty cell in place: replacing the
    /// cell after a racy failure could let two cells for one key both
    /// initialize, breaking the same-instance guarantee.
    fn cell_for(&self, key: &K) -> Arc<OnceCell<Arc<R>>> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(
            inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    /// Record a fresh construction in LRU order and enforce the bound.
    fn note_constructed(&self, key: &K) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.lru.retain(|k| k != key);
        inner.lru.push(key.clone());

        if let Some(max_entries) = self.config.capacity.max_entries() {
            while inner.lru.len() > max_entries {
                let victim = inner.lru.remove(0);
                inner.entries.remove(&victim);
                self.stats.record_eviction();
                debug!(cache = %self.config.name, key = %victim, "evicted LRU resource");
            }
        }
    }

    /// Move `key` to the warm end of LRU order if it is tracked.
    ///
    /// A coalesced waiter can get here before the constructing caller has
    /// recorded the key; skipping is correct, the constructor records it.
    fn touch(&self, key: &K) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(pos) = inner.lru.iter().position(|k| k == key) {
            let k = inner.lru.remove(pos);
            inner.lru.push(k);
        }
    }
}
