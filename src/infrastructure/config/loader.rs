use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::{CacheConfig, CapacityPolicy};

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cache name cannot be empty")]
    EmptyName,

    #[error("Invalid max_entries: {0}. Bounded caches must retain at least 1 entry")]
    InvalidMaxEntries(usize),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. oncecache.yaml in the working directory (optional)
    /// 3. Environment variables (`ONCECACHE_*` prefix, highest priority)
    ///
    /// Nested fields use `__` in the environment, e.g.
    /// `ONCECACHE_CAPACITY__POLICY=bounded` and
    /// `ONCECACHE_CAPACITY__MAX_ENTRIES=4`.
    pub fn load() -> Result<CacheConfig> {
        let config: CacheConfig = Figment::new()
            .merge(Serialized::defaults(CacheConfig::default()))
            .merge(Yaml::file("oncecache.yaml"))
            .merge(Env::prefixed("ONCECACHE_").split("__"))
            .extract()
            .context("Failed to extract cache configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<CacheConfig> {
        let config: CacheConfig = Figment::new()
            .merge(Serialized::defaults(CacheConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load cache config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &CacheConfig) -> Result<(), ConfigError> {
        if config.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }

        if let CapacityPolicy::Bounded { max_entries } = config.capacity {
            if max_entries == 0 {
                return Err(ConfigError::InvalidMaxEntries(max_entries));
            }
        }

        Ok(())
    }
}
