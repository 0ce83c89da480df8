//! Worker-facing composition of a cache and its construction routine.
//!
//! A distributed-execution framework schedules units of work onto a worker
//! process; every unit needs the same expensive resource. `WorkerContext`
//! is the explicitly owned instance that replaces module-level globals:
//! build it once at worker startup, clone it into each unit of work, drop
//! it with the worker.

use crate::domain::error::CacheResult;
use crate::domain::models::{CacheConfig, CacheStats};
use crate::domain::ports::AsyncResourceLoader;
use crate::infrastructure::cache::AsyncLazyCache;
use futures::future::{join_all, BoxFuture};
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// Shared per-worker state: one cache, one construction routine.
///
/// Cloning is cheap (two `Arc` bumps); clones share the same cache, so the
/// at-most-once construction guarantee spans every unit of work in the
/// process.
///
/// # Examples
///
/// ```
/// use futures::FutureExt;
/// use oncecache::{AsyncFnLoader, CacheConfig, WorkerContext};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let ctx = WorkerContext::new(
///     CacheConfig::named("sentiment-models"),
///     AsyncFnLoader::new(|lang: String| {
///         async move { Ok(format!("model:{lang}")) }.boxed()
///     }),
/// );
///
/// // Each unit of work asks the context for the resource by key.
/// let model = ctx.resource(&"en".to_string()).await?;
/// assert_eq!(*model, "model:en");
/// # Ok(())
/// # }
/// ```
pub struct WorkerContext<K, L>
where
    L: AsyncResourceLoader<K>,
{
    cache: Arc<AsyncLazyCache<K, L::Resource>>,
    loader: Arc<L>,
}

impl<K, L> Clone for WorkerContext<K, L>
where
    L: AsyncResourceLoader<K>,
{
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            loader: Arc::clone(&self.loader),
        }
    }
}

impl<K, L> WorkerContext<K, L>
where
    K: Eq + Hash + Clone + Display + Send + Sync,
    L: AsyncResourceLoader<K>,
{
    /// Build a context from a cache configuration and a loader.
    pub fn new(config: CacheConfig, loader: L) -> Self {
        Self {
            cache: Arc::new(AsyncLazyCache::new(config)),
            loader: Arc::new(loader),
        }
    }

    /// Get the resource for `key`, constructing it on first access in this
    /// worker.
    ///
    /// # Errors
    /// Propagates the loader's failure; nothing is cached for the key.
    //
    // Returns a boxed future rather than using `async fn` sugar: the
    // unboxed opaque future trips a rustc higher-ranked lifetime bug
    // ("one type is more general than the other") when awaited inside a
    // spawned task, because `L::Resource` appears in the hidden type
    // (see rust-lang/rust#102211). Callers `.await` it exactly as before.
    pub fn resource<'a>(&'a self, key: &'a K) -> BoxFuture<'a, CacheResult<Arc<L::Resource>>> {
        Box::pin(async move { self.cache.get(key, self.loader.as_ref()).await })
    }

    /// Construct the resources for `keys` up front.
    ///
    /// Useful at worker startup to take the construction cost before the
    /// first unit of work arrives. Stops at the first failure.
    pub async fn warm(&self, keys: &[K]) -> CacheResult<()> {
        for key in keys {
            self.resource(key).await?;
            debug!(key = %key, "resource warmed");
        }
        Ok(())
    }

    /// Run `work` over `items` concurrently, sharing one resource instance.
    ///
    /// The resource for `key` is fetched (constructing it if needed) before
    /// any work starts, so no unit of work can observe a partially built
    /// resource. Results are returned in the items' original order.
    ///
    /// # Errors
    /// Fails only if the resource construction fails; `work` itself is
    /// infallible by signature (units of work carry their own error channel
    /// in their output type if they need one).
    pub async fn map_with_resource<I, T, F, Fut>(
        &self,
        key: &K,
        items: Vec<I>,
        work: F,
    ) -> CacheResult<Vec<T>>
    where
        F: Fn(Arc<L::Resource>, I) -> Fut,
        Fut: Future<Output = T>,
    {
        let resource = self.resource(key).await?;
        let futures: Vec<_> = items
            .into_iter()
            .map(|item| work(Arc::clone(&resource), item))
            .collect();
        Ok(join_all(futures).await)
    }

    /// Snapshot of the underlying cache's counters.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The underlying cache, for embedders that need direct access.
    pub fn cache(&self) -> &AsyncLazyCache<K, L::Resource> {
        &self.cache
    }
}
