//! Configuration loading for cache instances.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
