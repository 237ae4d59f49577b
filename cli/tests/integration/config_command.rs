//! Integration tests for `az-zone-migrate config`.
//!
//! All filesystem-touching tests set `AZ_ZONE_MIGRATE_CONFIG` to a temp path
//! so they never read or write `~/.az-zone-migrate/config.yaml`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG_ENV: &str = "AZ_ZONE_MIGRATE_CONFIG";

fn azm() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("az-zone-migrate"));
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Returns a `TempDir` and the path string for a config file inside it.
fn temp_config_path() -> (TempDir, String) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir
        .path()
        .join("config.yaml")
        .to_string_lossy()
        .into_owned();
    (dir, path)
}

// ---------------------------------------------------------------------------
// `config show`
// ---------------------------------------------------------------------------

#[test]
fn test_config_show_no_config_file_uses_defaults() {
    let (_dir, path) = temp_config_path();
    azm()
        .args(["config", "show"])
        .env(CONFIG_ENV, &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("https://management.azure.com"))
        .stdout(predicate::str::contains("Standard_ZRS"))
        .stdout(predicate::str::contains("polling.timeout_secs"));
}

#[test]
fn test_config_show_displays_config_env_var_label() {
    let (_dir, path) = temp_config_path();
    azm()
        .args(["config", "show"])
        .env(CONFIG_ENV, &path)
        .assert()
        .success()
        .stdout(predicate::str::contains(CONFIG_ENV));
}

#[test]
fn test_config_show_does_not_create_file() {
    let (_dir, path) = temp_config_path();
    azm()
        .args(["config", "show"])
        .env(CONFIG_ENV, &path)
        .assert()
        .success();
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_show_json() {
    let (_dir, path) = temp_config_path();
    let out = azm()
        .args(["--json", "config", "show"])
        .env(CONFIG_ENV, &path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).expect("valid JSON");
    assert_eq!(v["config"]["polling"]["interval_secs"], 5);
    assert_eq!(v["path"], path);
}

// ---------------------------------------------------------------------------
// `config set`
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_persists_value_readable_by_show() {
    let (_dir, path) = temp_config_path();
    azm()
        .args(["config", "set", "polling.timeout_secs", "900"])
        .env(CONFIG_ENV, &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Set polling.timeout_secs = 900"));
    azm()
        .args(["config", "show"])
        .env(CONFIG_ENV, &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("900"));
}

#[test]
fn test_config_set_normalizes_snapshot_sku() {
    let (_dir, path) = temp_config_path();
    azm()
        .args(["config", "set", "snapshot.default_sku", "standard_lrs"])
        .env(CONFIG_ENV, &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Standard_LRS"));
}

#[test]
fn test_config_set_unknown_key_returns_error_with_valid_keys() {
    let (_dir, path) = temp_config_path();
    azm()
        .args(["config", "set", "unknown.key", "value"])
        .env(CONFIG_ENV, &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("snapshot.default_sku"));
}

#[test]
fn test_config_set_invalid_value_returns_error() {
    let (_dir, path) = temp_config_path();
    azm()
        .args(["config", "set", "azure.endpoint", "http://insecure.example"])
        .env(CONFIG_ENV, &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("https://"));
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_set_invalid_value_json_error_object() {
    let (_dir, path) = temp_config_path();
    let out = azm()
        .args(["--json", "config", "set", "polling.interval_secs", "0"])
        .env(CONFIG_ENV, &path)
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).expect("valid JSON");
    assert_eq!(v["error"], true);
    assert_eq!(v["code"], "CONFIG_ERROR");
}

#[test]
#[cfg(unix)]
fn test_config_set_creates_file_with_0o600_permissions() {
    use std::os::unix::fs::PermissionsExt;
    let (_dir, path) = temp_config_path();
    azm()
        .args(["config", "set", "retry.max_elapsed_secs", "60"])
        .env(CONFIG_ENV, &path)
        .assert()
        .success();
    let mode = std::fs::metadata(&path)
        .expect("file should exist")
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600, "expected 0o600, got {mode:o}");
}

#[test]
fn test_config_show_corrupt_yaml_returns_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, b"{ not: valid: yaml: [[[").expect("write");
    azm()
        .args(["config", "show"])
        .env(CONFIG_ENV, path.to_str().expect("path"))
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}
