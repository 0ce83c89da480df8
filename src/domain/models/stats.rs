use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of a cache's counters.
///
/// A `miss` is any access that found no constructed resource on entry,
/// including coalesced waiters that piggyback on another caller's in-flight
/// construction. A `load` is counted only for the caller whose construction
/// routine actually ran, so `loads <= misses` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheStats {
    /// Accesses that returned an already-constructed resource.
    pub hits: u64,
    /// Accesses that found no constructed resource on entry.
    pub misses: u64,
    /// Construction routine invocations that succeeded.
    pub loads: u64,
    /// Construction routine invocations that failed.
    pub load_failures: u64,
    /// Constructed entries evicted under a bounded policy.
    pub evictions: u64,
}

impl CacheStats {
    /// Hit ratio over all accesses, or `None` before the first access.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_ratio(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total == 0 {
            return None;
        }
        Some(self.hits as f64 / total as f64)
    }
}

/// Internal atomic counters backing [`CacheStats`].
///
/// Relaxed ordering throughout: counters are diagnostics, not
/// synchronization.
#[derive(Debug, Default)]
pub struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    evictions: AtomicU64,
}

impl StatsCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an access that found a constructed resource.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an access that found no constructed resource.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful construction.
    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed construction.
    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an eviction under a bounded policy.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the current counter values.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
