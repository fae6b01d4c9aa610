// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `havenctl invalidate`.

#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use yare::parameterized;

fn havenctl() -> Command {
    cargo_bin_cmd!("havenctl")
}

#[test]
fn invalidate_collection_keys_only() {
    havenctl()
        .args(["invalidate", "resident"])
        .assert()
        .success()
        .stdout("activity-feed\ndashboard-metrics\noccupancy-metrics\nresidents\n");
}

#[test]
fn invalidate_with_id_adds_instance_key() {
    havenctl()
        .args(["invalidate", "incident", "--id", "i-42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("incidents/i-42"))
        .stdout(predicate::str::contains("residents\n"));
}

#[parameterized(
    kebab = { "risk-assessment" },
    snake = { "risk_assessment" },
    upper = { "RISK-ASSESSMENT" },
)]
fn invalidate_accepts_entity_spellings(entity: &str) {
    havenctl()
        .args(["invalidate", entity])
        .assert()
        .success()
        .stdout(predicate::str::contains("risk-assessments"));
}

#[test]
fn invalidate_unknown_entity_fails() {
    havenctl()
        .args(["invalidate", "spaceship"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: invalid entity type: 'spaceship'"))
        .stderr(predicate::str::contains("hint: valid types are"));
}

#[test]
fn invalidate_json_output() {
    let output = havenctl()
        .args(["invalidate", "payment", "--id", "p1", "-o", "json"])
        .output()
        .unwrap();
    let keys: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(keys, vec!["billing-summary", "invoices", "payments", "payments/p1"]);
}
