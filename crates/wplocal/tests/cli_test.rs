//! Integration tests for the `wplocal` CLI binary.
//!
//! Validates argument parsing, help output, and offline error handling
//! without a WordPress.com account or bundled server assets.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

/// Build a command for the `wplocal` binary with env isolation.
///
/// Points config and data directories at a scratch path so tests never
/// touch the user's real sites or preferences.
fn wplocal_cmd(home: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("wplocal");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"))
        .env_remove("WPLOCAL_OUTPUT")
        .env_remove("WPLOCAL_OAUTH_TOKEN")
        .env_remove("WPLOCAL_API_BASE");
    cmd
}

fn scratch_home() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Pre-write the user-data document the binary will load.
fn seed_user_data(home: &std::path::Path, json: &str) {
    let dir = home.join(".local/share/wplocal");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("user-data.json"), json).unwrap();
}

/// One registered site with an unacknowledged pull failure against
/// remote 7.
const FAILED_PULL_DOC: &str = r#"{
    "sites": [
        {"id": "5f9c2f60-1f0f-4a37-9c93-2a9d1a42b101", "name": "alpha", "path": "/tmp/alpha"}
    ],
    "connections": {"5f9c2f60-1f0f-4a37-9c93-2a9d1a42b101": [7]},
    "failed_syncs": [
        {
            "local": "5f9c2f60-1f0f-4a37-9c93-2a9d1a42b101",
            "remote": 7,
            "direction": "pull",
            "state": {"status": "failed", "message": "files download: connection reset", "progress": 0}
        }
    ]
}"#;

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let home = scratch_home();
    let output = wplocal_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(text.contains("Usage"), "expected 'Usage' in output:\n{text}");
}

#[test]
fn help_lists_top_level_commands() {
    let home = scratch_home();
    wplocal_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("site")
            .and(predicate::str::contains("remote"))
            .and(predicate::str::contains("sync"))
            .and(predicate::str::contains("snapshot")),
    );
}

#[test]
fn site_help_lists_subcommands() {
    let home = scratch_home();
    wplocal_cmd(home.path())
        .args(["site", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("create")
                .and(predicate::str::contains("start"))
                .and(predicate::str::contains("stop"))
                .and(predicate::str::contains("delete")),
        );
}

// ── Offline behavior ────────────────────────────────────────────────

#[test]
fn site_list_is_empty_on_fresh_home() {
    let home = scratch_home();
    wplocal_cmd(home.path())
        .args(["site", "list", "-o", "plain"])
        .assert()
        .success();
}

#[test]
fn remote_list_without_token_fails_with_auth_code() {
    let home = scratch_home();
    let output = wplocal_cmd(home.path())
        .args(["remote", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("token"),
        "expected token hint in stderr:\n{stderr}"
    );
}

#[test]
fn unknown_site_exits_not_found() {
    let home = scratch_home();
    let output = wplocal_cmd(home.path())
        .args(["site", "stop", "no-such-site"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

// ── Failed-run bookkeeping ──────────────────────────────────────────

#[test]
fn pull_is_blocked_until_its_failure_is_acknowledged() {
    let home = scratch_home();
    seed_user_data(home.path(), FAILED_PULL_DOC);
    let output = wplocal_cmd(home.path())
        .args(["-y", "sync", "pull", "alpha", "7"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("sync clear"),
        "expected clear hint in stderr:\n{stderr}"
    );
}

#[test]
fn sync_clear_works_without_a_token() {
    let home = scratch_home();
    seed_user_data(home.path(), FAILED_PULL_DOC);
    wplocal_cmd(home.path())
        .args(["sync", "clear", "alpha", "7"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Sync state cleared"));
    wplocal_cmd(home.path())
        .args(["sync", "clear", "alpha", "7"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Nothing to clear"));
}

#[test]
fn sync_status_reports_the_recorded_failure() {
    let home = scratch_home();
    seed_user_data(home.path(), FAILED_PULL_DOC);
    wplocal_cmd(home.path())
        .args(["sync", "status"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("alpha: connected to 7")
                .and(predicate::str::contains("connection reset")),
        );
}

#[test]
fn sync_pull_on_unknown_site_exits_not_found() {
    let home = scratch_home();
    let output = wplocal_cmd(home.path())
        .args(["-y", "sync", "pull", "missing", "42"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}
