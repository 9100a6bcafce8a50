//! End-to-end registration against a fake coordinator.

#![allow(clippy::expect_used)]

use predicates::prelude::*;
use tempfile::TempDir;

use crate::cli_tests::agent_cmd;
use crate::fake_coordinator::{FakeCoordinator, field, issued_body, pending_body};

#[test]
fn test_register_waits_for_issue_then_persists_and_scrubs() {
    let dir = TempDir::new().expect("tempdir");
    let props = dir.path().join("autoregister.properties");
    std::fs::write(
        &props,
        "agent.auto.register.key=s3cret\nagent.auto.register.resources=linux\nother=kept\n",
    )
    .expect("write properties");

    let coordinator = FakeCoordinator::serving(vec![pending_body(), issued_body()]);
    agent_cmd(&dir)
        .env("FLEET_AGENT_SERVER_URL", &coordinator.base_url)
        .env("FLEET_AGENT_RETRY_INTERVAL_SECS", "0")
        .arg("register")
        .assert()
        .success()
        .stdout(predicate::str::diff("registered\n"));

    let forms = coordinator.finish();
    assert_eq!(forms.len(), 2);
    assert_eq!(field(&forms[0], "agentAutoRegisterKey"), Some("s3cret"));
    assert_eq!(field(&forms[0], "agentAutoRegisterResources"), Some("linux"));

    assert!(dir.path().join("agent.keystore").exists());
    assert!(dir.path().join("trust.keystore").exists());
    assert!(dir.path().join("guid.txt").exists());

    let scrubbed = std::fs::read_to_string(&props).expect("read properties");
    assert!(!scrubbed.contains("s3cret"));
    assert!(scrubbed.contains("other=kept"));

    agent_cmd(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("registered"))
        .stdout(predicate::str::contains("fingerprint:"));
}

#[test]
fn test_second_register_is_a_no_op() {
    let dir = TempDir::new().expect("tempdir");
    let coordinator = FakeCoordinator::serving(vec![issued_body()]);
    agent_cmd(&dir)
        .env("FLEET_AGENT_SERVER_URL", &coordinator.base_url)
        .arg("register")
        .assert()
        .success();
    assert_eq!(coordinator.finish().len(), 1);

    // Nothing listens on port 9; any request would fail the command.
    agent_cmd(&dir)
        .arg("register")
        .assert()
        .success()
        .stdout(predicate::str::diff("registered\n"));
}

#[test]
fn test_register_then_invalidate_then_status() {
    let dir = TempDir::new().expect("tempdir");
    let coordinator = FakeCoordinator::serving(vec![issued_body()]);
    agent_cmd(&dir)
        .env("FLEET_AGENT_SERVER_URL", &coordinator.base_url)
        .arg("register")
        .assert()
        .success();
    coordinator.finish();

    agent_cmd(&dir)
        .arg("invalidate")
        .assert()
        .success()
        .stdout(predicate::str::diff("clean\n"));
    agent_cmd(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("unregistered"));
}

#[test]
fn test_unreachable_coordinator_fails_without_persisting() {
    let dir = TempDir::new().expect("tempdir");
    agent_cmd(&dir)
        .arg("register")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("agent registration failed"));
    assert!(!dir.path().join("agent.keystore").exists());
}
