//! Config error-message, atomic-write-safety, and layout integration tests.
//! Storage: ~/.satori/config.yaml

use assert_fs::prelude::*;
use predicates::prelude::*;
use satori_core::{
    config::{self, ClientConfig},
    ConfigError,
};
use std::fs;

fn sample() -> ClientConfig {
    ClientConfig {
        host: "satori.tcs.uj.edu.pl".to_string(),
        blobs_port: 38889,
        use_ssl: true,
        token: None,
    }
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_returns_not_found() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("config not found"));
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".satori/config.yaml")
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    let msg = err.to_string();
    assert!(msg.contains("config.yaml"), "must contain file path, got: {msg}");
}

#[test]
fn load_wrong_type_yaml_returns_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".satori/config.yaml")
        .write_str("- this is a list, not a mapping\n")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn load_rejects_empty_host() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".satori/config.yaml")
        .write_str("host: \"\"\n")
        .expect("write");

    let err = config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn save_cleans_up_tmp_file() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample()).expect("save");

    home.child(".satori/config.yaml").assert(predicate::path::exists());
    home.child(".satori/config.yaml.tmp")
        .assert(predicate::path::missing());
}

#[test]
fn mid_write_crash_leaves_original_intact() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample()).expect("save");

    let path = config::config_path_at(home.path());
    let original_bytes = fs::read(&path).expect("read original");

    // Simulate crash: .tmp written but process died before rename
    let tmp = path.with_file_name("config.yaml.tmp");
    fs::write(&tmp, b"CRASH - INCOMPLETE WRITE").expect("write crash tmp");

    assert_eq!(original_bytes, fs::read(&path).expect("read after crash"));
    assert_eq!(config::load_at(home.path()).expect("still loads"), sample());
}

#[test]
fn save_overwrites_previous_values() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample()).expect("first save");

    let updated = ClientConfig {
        use_ssl: false,
        token: Some("abc".to_string()),
        ..sample()
    };
    config::save_at(home.path(), &updated).expect("second save");

    let loaded = config::load_at(home.path()).expect("load");
    assert!(!loaded.use_ssl);
    assert_eq!(loaded.token.as_deref(), Some("abc"));
}

#[test]
fn token_omitted_from_yaml_when_unset() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    config::save_at(home.path(), &sample()).expect("save");
    home.child(".satori/config.yaml")
        .assert(predicate::str::contains("token").not());
}

#[test]
fn invalid_config_is_not_written() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let bad = ClientConfig {
        blobs_port: 0,
        ..sample()
    };
    let err = config::save_at(home.path(), &bad).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    home.child(".satori/config.yaml")
        .assert(predicate::path::missing());
}
