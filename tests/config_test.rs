//! Configuration loading: precedence, env overrides, validation.

use oncecache::{CacheConfig, CapacityPolicy, ConfigLoader};

#[test]
fn test_defaults_when_nothing_is_set() {
    temp_env::with_vars_unset(
        [
            "ONCECACHE_NAME",
            "ONCECACHE_CAPACITY__POLICY",
            "ONCECACHE_CAPACITY__MAX_ENTRIES",
        ],
        || {
            let config = ConfigLoader::load().unwrap();
            assert_eq!(config.name, "default");
            assert_eq!(config.capacity, CapacityPolicy::Unbounded);
        },
    );
}

#[test]
fn test_env_overrides_name() {
    temp_env::with_var("ONCECACHE_NAME", Some("vader-lexicons"), || {
        let config = ConfigLoader::load().unwrap();
        assert_eq!(config.name, "vader-lexicons");
    });
}

#[test]
fn test_env_sets_bounded_capacity() {
    temp_env::with_vars(
        [
            ("ONCECACHE_CAPACITY__POLICY", Some("bounded")),
            ("ONCECACHE_CAPACITY__MAX_ENTRIES", Some("4")),
        ],
        || {
            let config = ConfigLoader::load().unwrap();
            assert_eq!(config.capacity, CapacityPolicy::Bounded { max_entries: 4 });
        },
    );
}

#[test]
fn test_env_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oncecache.yaml");
    std::fs::write(&path, "name: from-file\n").unwrap();

    // File sets the name; env must win.
    temp_env::with_var("ONCECACHE_NAME", Some("from-env"), || {
        let figment = figment_for(&path);
        assert_eq!(figment.name, "from-env");
    });
}

fn figment_for(path: &std::path::Path) -> CacheConfig {
    use figment::providers::{Env, Format, Serialized, Yaml};
    use figment::Figment;

    // Same merge order as ConfigLoader::load, pointed at a temp file so the
    // test does not depend on the working directory.
    let config: CacheConfig = Figment::new()
        .merge(Serialized::defaults(CacheConfig::default()))
        .merge(Yaml::file(path))
        .merge(Env::prefixed("ONCECACHE_").split("__"))
        .extract()
        .unwrap();
    ConfigLoader::validate(&config).unwrap();
    config
}

#[test]
fn test_zero_capacity_rejected_through_loader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oncecache.yaml");
    std::fs::write(&path, "capacity:\n  policy: bounded\n  max_entries: 0\n").unwrap();

    let err = ConfigLoader::load_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("at least 1"));
}
