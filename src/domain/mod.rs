//! Domain layer: configuration, statistics, errors, and ports.

pub mod error;
pub mod models;
pub mod ports;

pub use error::{CacheError, CacheResult};
pub use models::{CacheConfig, CacheStats, CapacityPolicy};
pub use ports::{AsyncFnLoader, AsyncResourceLoader, ResourceLoader};
