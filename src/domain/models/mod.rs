//! Domain models: configuration and statistics types.

pub mod config;
pub mod stats;

pub use config::{CacheConfig, CapacityPolicy};
pub use stats::{CacheStats, StatsCounters};
