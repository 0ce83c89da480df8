use serde::{Deserialize, Serialize};

/// Configuration for a lazy resource cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Cache name, used to label tracing events when a process hosts
    /// several caches
    #[serde(default = "default_name")]
    pub name: String,

    /// Capacity policy governing how many constructed resources the cache
    /// retains
    #[serde(default)]
    pub capacity: CapacityPolicy,
}

fn default_name() -> String {
    "default".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            capacity: CapacityPolicy::default(),
        }
    }
}

impl CacheConfig {
    /// Convenience constructor for a named cache with the default policy.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: CapacityPolicy::default(),
        }
    }

    /// Convenience constructor for a bounded cache.
    pub fn bounded(name: impl Into<String>, max_entries: usize) -> Self {
        Self {
            name: name.into(),
            capacity: CapacityPolicy::Bounded { max_entries },
        }
    }
}

/// How many constructed resources a cache may retain.
///
/// `Unbounded` is the default: a constructed entry lives for the lifetime of
/// the cache, which matches the worker-process usage pattern where only a
/// handful of distinct keys ever occur. `Bounded` opts in to LRU eviction
/// of the least-recently-used constructed entry once `max_entries` would be
/// exceeded; in-flight constructions are never evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum CapacityPolicy {
    /// Never evict; one entry per distinct key ever requested.
    Unbounded,
    /// Retain at most `max_entries` constructed resources, evicting LRU.
    Bounded {
        /// Maximum number of constructed entries retained (must be >= 1).
        max_entries: usize,
    },
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self::Unbounded
    }
}

impl CapacityPolicy {
    /// The retention limit, if this policy has one.
    pub const fn max_entries(&self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Bounded { max_entries } => Some(*max_entries),
        }
    }
}
