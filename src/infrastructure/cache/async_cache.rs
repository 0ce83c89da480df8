//! Asynchronous worker-local lazy resource cache.
//!
//! Same contract as [`super::lazy_cache::LazyCache`], for construction
//! routines that are themselves async (downloading model weights, opening
//! connections to a model server). Waiters for an in-flight construction
//! queue on the key's once-cell instead of blocking a thread.

use crate::domain::error::{CacheError, CacheResult};
use crate::domain::models::{CacheConfig, CacheStats, StatsCounters};
use crate::domain::ports::AsyncResourceLoader;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

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

/// Async process-local memoizing cache for expensive keyed resources.
///
/// Construct once at worker startup, wrap in `Arc`, hand a clone to every
/// unit of work. The map lock is a plain `std::sync::Mutex` held only for
/// entry lookup, never across an await; construction awaits happen on the
/// key's `tokio::sync::OnceCell`, which coalesces concurrent callers onto
/// one loader invocation and wakes one waiter to retry after a failure.
///
/// # Examples
///
/// ```
/// use futures::FutureExt;
/// use oncecache::{AsyncFnLoader, AsyncLazyCache, CacheConfig};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let cache: AsyncLazyCache<String, String> = AsyncLazyCache::new(CacheConfig::default());
/// let loader = AsyncFnLoader::new(|key: String| {
///     async move { Ok(format!("model:{key}")) }.boxed()
/// });
///
/// let first = cache.get(&"en".to_string(), &loader).await?;
/// let second = cache.get(&"en".to_string(), &loader).await?;
/// assert!(Arc::ptr_eq(&first, &second));
/// # Ok(())
/// # }
/// ```
pub struct AsyncLazyCache<K, R> {
    inner: Mutex<CacheInner<K, R>>,
    config: CacheConfig,
    stats: StatsCounters,
}

impl<K, R> AsyncLazyCache<K, R>
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
    /// Concurrent callers for the same uncached key await the single
    /// in-flight construction and share its instance. A failed construction
    /// caches nothing; the next caller (or a queued waiter) retries.
    ///
    /// # Errors
    /// Returns [`CacheError::LoadFailed`] when the loader fails.
    pub async fn get<L>(&self, key: &K, loader: &L) -> CacheResult<Arc<R>>
    where
        L: AsyncResourceLoader<K, Resource = R>,
        R: Send + Sync + 'static,
    {
        let cell = self.cell_for(key);

        if cell.initialized() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }

        // The init future must own its captures (the cell outlives this
        // call), so copy the shared references in and flag the load through
        // an atomic rather than a &mut.
        let loaded = AtomicBool::new(false);
        let loaded_flag = &loaded;
        let stats = &self.stats;
        let name = self.config.name.as_str();

        let value = cell
            .get_or_try_init(move || async move {
                let started = Instant::now();
                debug!(cache = %name, key = %key, "constructing resource");

                match loader.load(key).await {
                    Ok(resource) => {
                        loaded_flag.store(true, Ordering::Relaxed);
                        info!(
                            cache = %name,
                            key = %key,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "resource constructed"
                        );
                        Ok(Arc::new(resource))
                    }
                    Err(err) => {
                        stats.record_load_failure();
                        warn!(
                            cache = %name,
                            key = %key,
                            error = %err,
                            "resource construction failed"
                        );
                        Err(CacheError::load_failed(key, err))
                    }
                }
            })
            .await?;
        let value = Arc::clone(value);

        if loaded.load(Ordering::Relaxed) {
            self.stats.record_load();
            self.note_constructed(key);
        } else {
            self.touch(key);
        }

        Ok(value)
    }

    /// Return the constructed resource for `key` without loading or
    /// touching LRU order.
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

    /// Drop every entry. Owner-driven reset only.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.clear();
        inner.lru.clear();
        debug!(cache = %self.config.name, "cache cleared");
    }

    // Failed constructions leave the empty cell in place for the same
    // reason as the sync cache: a replacement cell could initialize
    // alongside a straggler holding the old one.
    fn cell_for(&self, key: &K) -> Arc<OnceCell<Arc<R>>> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(
            inner
                .entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

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

    fn touch(&self, key: &K) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(pos) = inner.lru.iter().position(|k| k == key) {
            let k = inner.lru.remove(pos);
            inner.lru.push(k);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::AsyncFnLoader;
    use anyhow::anyhow;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, Duration};

    fn counting_loader(
        calls: Arc<AtomicUsize>,
    ) -> AsyncFnLoader<impl Fn(String) -> futures::future::BoxFuture<'static, anyhow::Result<String>>>
    {
        AsyncFnLoader::new(move |key: String| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(format!("model:{key}"))
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_sequential_gets_construct_once() {
        let cache: AsyncLazyCache<String, String> = AsyncLazyCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(Arc::clone(&calls));
        let key = "en".to_string();

        let a = cache.get(&key, &loader).await.unwrap();
        let b = cache.get(&key, &loader).await.unwrap();
        let c = cache.get(&key, &loader).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
    }

    #[tokio::test]
    async fn test_distinct_keys_independent() {
        let cache: AsyncLazyCache<String, String> = AsyncLazyCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(Arc::clone(&calls));

        let en = cache.get(&"en".to_string(), &loader).await.unwrap();
        let fr = cache.get(&"fr".to_string(), &loader).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!Arc::ptr_eq(&en, &fr));
        assert_eq!(*en, "model:en");
        assert_eq!(*fr, "model:fr");
    }

    #[tokio::test]
    async fn test_concurrent_tasks_coalesce_onto_one_construction() {
        let cache: Arc<AsyncLazyCache<String, String>> =
            Arc::new(AsyncLazyCache::new(CacheConfig::default()));
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = Arc::new(AsyncFnLoader::new({
            let calls = Arc::clone(&calls);
            move |key: String| {
                let calls = Arc::clone(&calls);
                async move {
                    // Hold the construction open so every task queues on it.
                    sleep(Duration::from_millis(50)).await;
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(format!("model:{key}"))
                }
                .boxed()
            }
        }));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let loader = Arc::clone(&loader);
                tokio::spawn(
                    async move { cache.get(&"en".to_string(), loader.as_ref()).await.unwrap() },
                )
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for pair in results.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }

    #[tokio::test]
    async fn test_failure_not_cached_then_retry_succeeds() {
        let cache: AsyncLazyCache<String, String> = AsyncLazyCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = AsyncFnLoader::new({
            let calls = Arc::clone(&calls);
            move |key: String| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(anyhow!("registry unreachable"))
                    } else {
                        Ok(format!("model:{key}"))
                    }
                }
                .boxed()
            }
        });
        let key = "en".to_string();

        let err = cache.get(&key, &loader).await.unwrap_err();
        assert!(err.to_string().contains("registry unreachable"));
        assert!(!cache.contains(&key));

        let resource = cache.get(&key, &loader).await.unwrap();
        assert_eq!(*resource, "model:en");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().load_failures, 1);
    }

    #[tokio::test]
    async fn test_bounded_policy_evicts_lru() {
        let cache: AsyncLazyCache<String, String> =
            AsyncLazyCache::new(CacheConfig::bounded("models", 2));
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = counting_loader(Arc::clone(&calls));

        cache.get(&"en".to_string(), &loader).await.unwrap();
        cache.get(&"fr".to_string(), &loader).await.unwrap();
        cache.get(&"en".to_string(), &loader).await.unwrap();
        cache.get(&"de".to_string(), &loader).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&"en".to_string()));
        assert!(!cache.contains(&"fr".to_string()));
        assert_eq!(cache.stats().evictions, 1);
    }
}
