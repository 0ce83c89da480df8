use thiserror::Error;

/// Errors produced by the lazy resource caches.
///
/// Construction failures are never cached: after a `LoadFailed`, the next
/// access for the same key runs the construction routine again.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The caller-supplied construction routine failed for a key.
    ///
    /// Wraps whatever error the routine returned. The cache records no
    /// entry for the key, so a subsequent access retries construction.
    #[error("failed to construct resource for key '{key}': {source}")]
    LoadFailed {
        /// The key whose construction failed.
        key: String,
        /// The construction routine's error.
        #[source]
        source: anyhow::Error,
    },
}

impl CacheError {
    /// Build a `LoadFailed` from a key and the routine's error.
    pub fn load_failed(key: impl std::fmt::Display, source: anyhow::Error) -> Self {
        Self::LoadFailed {
            key: key.to_string(),
            source,
        }
    }
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
