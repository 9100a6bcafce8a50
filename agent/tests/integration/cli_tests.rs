//! Integration tests for CLI structure, configuration and the commands that
//! never touch the network.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// The binary with a clean `FLEET_AGENT_*` environment rooted at `dir`.
pub fn agent_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fleet-agent"));
    for var in [
        "FLEET_AGENT_REGISTRATION_PATH",
        "FLEET_AGENT_TRUST_STORE_PASSWORD",
        "FLEET_AGENT_RETRY_INTERVAL_SECS",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("FLEET_AGENT_SERVER_URL", "http://127.0.0.1:9")
        .env("FLEET_AGENT_CONFIG_DIR", dir.path())
        .env("FLEET_AGENT_STORE_PASSWORD", "agent-pw")
        .env("FLEET_AGENT_CONNECT_TIMEOUT_SECS", "2")
        .env("FLEET_AGENT_READ_TIMEOUT_SECS", "5");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help() {
    let dir = TempDir::new().expect("tempdir");
    agent_cmd(&dir)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Build agent identity bootstrap"));
}

#[test]
fn test_cli_help_lists_commands() {
    let dir = TempDir::new().expect("tempdir");
    agent_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("invalidate"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    let dir = TempDir::new().expect("tempdir");
    agent_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fleet-agent 0.1.0"));
}

// --- Configuration ---

#[test]
fn test_missing_server_url_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    agent_cmd(&dir)
        .env_remove("FLEET_AGENT_SERVER_URL")
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("FLEET_AGENT_SERVER_URL"));
}

// --- Status ---

#[test]
fn test_status_on_fresh_install_is_unregistered_and_creates_nothing() {
    let dir = TempDir::new().expect("tempdir");
    agent_cmd(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("unregistered"));
    let created = std::fs::read_dir(dir.path()).expect("read dir").count();
    assert_eq!(created, 0);
}

#[test]
fn test_status_json() {
    let dir = TempDir::new().expect("tempdir");
    let output = agent_cmd(&dir)
        .args(["status", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["state"], "unregistered");
    assert!(report.get("fingerprint").is_none());
}

// --- Invalidate ---

#[test]
fn test_invalidate_without_stores_is_clean() {
    let dir = TempDir::new().expect("tempdir");
    agent_cmd(&dir)
        .arg("invalidate")
        .assert()
        .success()
        .stdout(predicate::str::diff("clean\n"));
}

#[test]
fn test_invalidate_corrupted_store_wipes_files() {
    let dir = TempDir::new().expect("tempdir");
    let agent_store = dir.path().join("agent.keystore");
    let trust_store = dir.path().join("trust.keystore");
    std::fs::write(&agent_store, b"not a keystore").expect("write");
    std::fs::write(&trust_store, b"not a keystore either").expect("write");

    agent_cmd(&dir)
        .args(["invalidate", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""outcome":"wiped""#));

    assert!(!agent_store.exists());
    assert!(!trust_store.exists());
}
