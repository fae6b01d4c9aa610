// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `havenctl config`.

#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn havenctl() -> Command {
    cargo_bin_cmd!("havenctl")
}

#[test]
fn init_then_show() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("client.toml");

    havenctl()
        .args(["config", "init", "--base-url", "https://api.haven.test", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote config to"));

    havenctl()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("base_url = \"https://api.haven.test\""))
        .stdout(predicate::str::contains("timeout_ms = 30000"));
}

#[test]
fn init_refuses_to_overwrite() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("client.toml");

    havenctl()
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .success();

    havenctl()
        .args(["config", "init", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"))
        .stderr(predicate::str::contains("--force"));

    havenctl()
        .args(["config", "init", "--force", "--config"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn show_missing_config_fails() {
    let temp = TempDir::new().unwrap();

    havenctl()
        .args(["config", "show", "--config"])
        .arg(temp.path().join("missing.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: configuration error: failed to read config"));
}

#[test]
fn show_rejects_invalid_values() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("client.toml");
    std::fs::write(&path, "base_url = \"http://x\"\njitter = 4.0\n").unwrap();

    havenctl()
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("jitter must be between 0 and 1"));
}
