//! Service layer: worker-facing composition of cache and loader.

pub mod worker_context;

pub use worker_context::WorkerContext;
