//! Integration tests for `az-zone-migrate migrate` and `check`.
//!
//! Every test points `AZ_ZONE_MIGRATE_CONFIG` at a temp file. Tests that
//! reach the credential step replace `PATH` so the real Azure CLI is never run.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG_ENV: &str = "AZ_ZONE_MIGRATE_CONFIG";
const HEADER: &str = "#Source Resource Group Name,Source VM Name,Source OS Type,Desired Resource Group Name,Desired VM Name,Desired Zone";

fn azm(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("az-zone-migrate"));
    cmd.env("NO_COLOR", "1")
        .env(CONFIG_ENV, dir.join("config.yaml"))
        .env_remove("AZURE_SUBSCRIPTION_ID");
    cmd
}

fn write_csv(dir: &Path, rows: &[&str]) -> String {
    let path = dir.join("vms.csv");
    let mut content = format!("{HEADER}\n");
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    std::fs::write(&path, content).expect("write csv");
    path.to_string_lossy().into_owned()
}

#[test]
fn test_missing_csv_is_a_run_level_error() {
    let dir = TempDir::new().expect("tempdir");
    azm(dir.path())
        .args(["migrate", "--yes", "--subscription-id", "sub-1", "--csv-file"])
        .arg(dir.path().join("absent.csv"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: cannot read"));
}

#[test]
fn test_missing_column_reports_input_error_as_json() {
    let dir = TempDir::new().expect("tempdir");
    let csv = dir.path().join("vms.csv");
    std::fs::write(&csv, "#Source Resource Group Name,Source VM Name\nrg,web01\n").expect("write");
    let out = azm(dir.path())
        .args(["--json", "check", "--subscription-id", "sub-1", "--csv-file"])
        .arg(&csv)
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).expect("valid JSON");
    assert_eq!(v["error"], true);
    assert_eq!(v["code"], "INPUT_ERROR");
    assert!(v["message"].as_str().unwrap().contains("Source OS Type"));
}

#[test]
fn test_empty_field_aborts_before_any_processing() {
    let dir = TempDir::new().expect("tempdir");
    let csv = write_csv(dir.path(), &["rg,web01,Linux,rg,web01,2", "rg,web02,Linux,rg,web02,"]);
    azm(dir.path())
        .args(["check", "--subscription-id", "sub-1", "--csv-file", &csv])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("row 2"))
        .stdout(predicate::str::contains("Processing VM").not());
}

#[test]
fn test_subscription_id_read_from_environment() {
    let dir = TempDir::new().expect("tempdir");
    azm(dir.path())
        .env("AZURE_SUBSCRIPTION_ID", "sub-1")
        .args(["check", "--csv-file"])
        .arg(dir.path().join("absent.csv"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
#[cfg(unix)]
fn test_missing_azure_cli_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let empty_bin = dir.path().join("bin");
    std::fs::create_dir(&empty_bin).expect("mkdir");
    let csv = write_csv(dir.path(), &["rg,web01,Linux,rg,web01,2"]);
    azm(dir.path())
        .env("PATH", &empty_bin)
        .args(["check", "--subscription-id", "sub-1", "--csv-file", &csv])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Azure CLI is not installed. Please install it and log in using 'az login'.",
        ));
}

#[cfg(unix)]
mod against_fake_resource_manager {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;

    use axum::http::Method;

    use super::*;
    use crate::fake_arm::{FakeArm, Reply, serve, sku_page, skus_path, vm_json, vm_path};

    /// A `bin/az` that always hands out the token the fake expects.
    fn fake_az(dir: &Path) -> std::path::PathBuf {
        let bin = dir.join("bin");
        std::fs::create_dir(&bin).expect("mkdir");
        let az = bin.join("az");
        std::fs::write(
            &az,
            "#!/bin/sh\necho '{\"accessToken\":\"test-token\",\"expiresOn\":\"2099-01-01 00:00:00.000000\"}'\n",
        )
        .expect("write az");
        std::fs::set_permissions(&az, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        bin
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_check_reports_each_record_as_json() {
        let arm = Arc::new(FakeArm::default());
        let base = serve(Arc::clone(&arm)).await;
        arm.on(
            Method::GET,
            &vm_path("rg-src", "web01"),
            vec![Reply::json(200, vm_json("rg-src", "web01", "1"))],
        );
        arm.on(
            Method::GET,
            &skus_path(),
            vec![Reply::json(200, sku_page(&[("virtualMachines", "Standard_D2s_v5")], None))],
        );

        let dir = TempDir::new().expect("tempdir");
        let bin = fake_az(dir.path());
        std::fs::write(
            dir.path().join("config.yaml"),
            format!("azure:\n  endpoint: {base}\npolling:\n  interval_secs: 1\n"),
        )
        .expect("write config");
        let csv = write_csv(
            dir.path(),
            &["rg-src,web01,Linux,rg-src,web01,2", "rg-src,ghost,Linux,rg-src,ghost,2"],
        );

        let root = dir.path().to_path_buf();
        let output = tokio::task::spawn_blocking(move || {
            azm(&root)
                .env("PATH", &bin)
                .args(["--json", "check", "--subscription-id", "sub-1", "--csv-file", &csv])
                .output()
        })
        .await
        .expect("join")
        .expect("run binary");

        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let v: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
        assert_eq!(v["check_only"], true);
        assert_eq!(v["records"][0]["outcome"], "checked");
        assert_eq!(v["records"][0]["zones"], serde_json::json!(["1"]));
        assert_eq!(v["records"][0]["needs_migration"], true);
        assert_eq!(v["records"][0]["sku_available"], true);
        assert_eq!(v["records"][1]["outcome"], "skipped");
        assert_eq!(v["records"][1]["reason"], "not_found");
        assert_eq!(v["totals"]["checked"], 1);
        assert_eq!(v["totals"]["skipped"], 1);
        assert!(arm.seen().iter().all(|s| s.method == Method::GET));
        let logs = String::from_utf8_lossy(&output.stderr);
        assert!(logs.contains("was not found"), "logs: {logs}");
    }
}
