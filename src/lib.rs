//! Oncecache - Worker-Local Lazy Resource Cache
//!
//! Oncecache provides process-local, lazily-populated caching of
//! expensive-to-construct, non-serializable resources (loaded language
//! models, tokenizers, lexicons) keyed by an identifier. It is intended to
//! be embedded in worker processes of a distributed-execution framework,
//! where every unit of work scheduled onto the process needs the same
//! resource and reconstructing it per invocation would be prohibitive.
//!
//! Guarantees:
//!
//! - **At-most-once construction** per key per cache instance: the first
//!   access constructs, every later access returns the same `Arc`.
//! - **Single-flight under concurrency**: concurrent accesses for the same
//!   uncached key coalesce onto one construction; no caller ever observes a
//!   partially built resource.
//! - **Failures are not cached**: a failed construction propagates to the
//!   caller and the next access retries.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): configuration, statistics, error types,
//!   and the construction-routine ports
//! - **Infrastructure Layer** (`infrastructure`): the sync and async cache
//!   implementations and the configuration loader
//! - **Service Layer** (`services`): the worker-facing context that bundles
//!   a cache with its loader
//!
//! # Example
//!
//! ```
//! use oncecache::{CacheConfig, LazyCache};
//!
//! # fn load_model(lang: &str) -> anyhow::Result<Vec<u8>> { Ok(lang.as_bytes().to_vec()) }
//! let cache: LazyCache<String, Vec<u8>> = LazyCache::new(CacheConfig::default());
//!
//! // First access constructs, later accesses reuse the same instance.
//! let en = cache.get(&"en".to_string(), &|key: &String| load_model(key)).unwrap();
//! let again = cache.get(&"en".to_string(), &|key: &String| load_model(key)).unwrap();
//! assert!(std::sync::Arc::ptr_eq(&en, &again));
//! ```

pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::error::{CacheError, CacheResult};
pub use domain::models::{CacheConfig, CacheStats, CapacityPolicy};
pub use domain::ports::{AsyncFnLoader, AsyncResourceLoader, ResourceLoader};
pub use infrastructure::cache::{AsyncLazyCache, LazyCache};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::WorkerContext;
