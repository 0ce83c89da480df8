//! Construction-routine ports.
//!
//! A loader maps a resource key to a freshly built resource instance. The
//! caches invoke a loader at most once per key per successful construction;
//! loader errors propagate to the caller and are never cached.

use async_trait::async_trait;
use futures::future::BoxFuture;

/// Synchronous construction routine for a keyed resource.
///
/// Implemented for any `Fn(&K) -> anyhow::Result<R>` closure, so plain
/// functions work directly:
///
/// ```
/// use oncecache::ResourceLoader;
///
/// fn load(key: &String) -> anyhow::Result<usize> {
///     Ok(key.len())
/// }
///
/// let loader = load;
/// assert_eq!(loader.load(&"en".to_string()).unwrap(), 2);
/// ```
pub trait ResourceLoader<K>: Send + Sync {
    /// The resource this routine constructs.
    type Resource: Send + Sync + 'static;

    /// Build a fresh resource instance for `key`.
    ///
    /// May block (e.g. reading model weights from disk). Errors propagate
    /// to the cache caller.
    fn load(&self, key: &K) -> anyhow::Result<Self::Resource>;
}

impl<K, R, F> ResourceLoader<K> for F
where
    F: Fn(&K) -> anyhow::Result<R> + Send + Sync,
    R: Send + Sync + 'static,
{
    type Resource = R;

    fn load(&self, key: &K) -> anyhow::Result<R> {
        self(key)
    }
}

/// Asynchronous construction routine for a keyed resource.
#[async_trait]
pub trait AsyncResourceLoader<K>: Send + Sync {
    /// The resource this routine constructs.
    type Resource: Send + Sync + 'static;

    /// Build a fresh resource instance for `key`.
    async fn load(&self, key: &K) -> anyhow::Result<Self::Resource>;
}

/// Adapter turning an async closure into an [`AsyncResourceLoader`].
///
/// The closure takes the key by value and returns a boxed future:
///
/// ```
/// use futures::FutureExt;
/// use oncecache::{AsyncFnLoader, AsyncResourceLoader};
///
/// # async fn example() -> anyhow::Result<()> {
/// let loader = AsyncFnLoader::new(|key: String| {
///     async move { Ok(key.len()) }.boxed()
/// });
/// assert_eq!(loader.load(&"en".to_string()).await?, 2);
/// # Ok(())
/// # }
/// ```
pub struct AsyncFnLoader<F> {
    f: F,
}

impl<F> AsyncFnLoader<F> {
    /// Wrap an async closure.
    pub const fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<K, R, F> AsyncResourceLoader<K> for AsyncFnLoader<F>
where
    K: Clone + Send + Sync,
    R: Send + Sync + 'static,
    F: Fn(K) -> BoxFuture<'static, anyhow::Result<R>> + Send + Sync,
{
    type Resource = R;

    async fn load(&self, key: &K) -> anyhow::Result<R> {
        (self.f)(key.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use futures::FutureExt;

    #[test]
    fn test_closure_implements_sync_loader() {
        let loader = |key: &&str| -> anyhow::Result<String> { Ok(key.to_uppercase()) };
        assert_eq!(loader.load(&"en").unwrap(), "EN");
    }

    #[test]
    fn test_sync_loader_error_propagates() {
        let loader = |_key: &&str| -> anyhow::Result<String> { Err(anyhow!("no such model")) };
        let err = loader.load(&"xx").unwrap_err();
        assert!(err.to_string().contains("no such model"));
    }

    #[tokio::test]
    async fn test_async_fn_loader_builds_resource() {
        let loader =
            AsyncFnLoader::new(|key: String| async move { Ok(format!("model:{key}")) }.boxed());
        let resource = loader.load(&"en".to_string()).await.unwrap();
        assert_eq!(resource, "model:en");
    }

    #[tokio::test]
    async fn test_async_fn_loader_error_propagates() {
        let loader = AsyncFnLoader::new(|_key: String| {
            async move { Err::<(), _>(anyhow!("download failed")) }.boxed()
        });
        let err = loader.load(&"en".to_string()).await.unwrap_err();
        assert!(err.to_string().contains("download failed"));
    }
}
