//! Lazy resource cache implementations.
//!
//! Two variants with the same contract: [`LazyCache`] for synchronous
//! construction routines and [`AsyncLazyCache`] for async ones. Both are
//! process-local, single-flight, and never cache a failed construction.

pub mod async_cache;
pub mod lazy_cache;

pub use async_cache::AsyncLazyCache;
pub use lazy_cache::LazyCache;
