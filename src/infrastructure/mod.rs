//! Infrastructure layer: cache implementations and configuration loading.

pub mod cache;
pub mod config;
