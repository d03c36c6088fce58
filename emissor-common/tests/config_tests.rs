//! Tests for config file resolution and graceful degradation
//!
//! Tests that manipulate EMISSOR_DATA_CONFIG are marked with #[serial]
//! so they don't race on the process environment.

use emissor_common::config::{load_config, resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use emissor_common::Error;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

#[test]
#[serial]
fn test_cli_argument_takes_priority_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(Some(Path::new("/tmp/from-cli.toml")));
    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let config = load_config(Some(&missing)).expect("missing file is not fatal");
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_no_path_yields_defaults() {
    let config = load_config(None).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_load_full_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[server]
host = "0.0.0.0"
port = 9100

[event]
topics = ["cltl.topic.scenario", "cltl.topic.image"]
bus_capacity = 64

[storage]
path = "/var/lib/emissor"
rdf_source = "/var/lib/rdf"
flush_interval_ms = -1
immediate_flush = true

[media]
source_root = "/var/lib/backend"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.event.topics, vec!["cltl.topic.scenario", "cltl.topic.image"]);
    assert_eq!(config.event.bus_capacity, 64);
    assert_eq!(config.storage.path, PathBuf::from("/var/lib/emissor"));
    assert_eq!(config.storage.rdf_source(), PathBuf::from("/var/lib/rdf"));
    assert_eq!(config.storage.flush_interval_ms, Some(-1));
    assert!(config.storage.immediate_flush);
    assert_eq!(config.media.source_root, Some(PathBuf::from("/var/lib/backend")));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[server\nport = 1").unwrap();

    assert!(load_config(Some(&path)).is_err());
}

#[test]
fn test_unreadable_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();

    // Exists, but a directory cannot be read as a document
    let err = load_config(Some(dir.path())).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
