//! Ports: the construction-routine interfaces supplied by embedders.

pub mod loader;

pub use loader::{AsyncFnLoader, AsyncResourceLoader, ResourceLoader};
