// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `havenctl rules`.

#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;

fn havenctl() -> Command {
    cargo_bin_cmd!("havenctl")
}

#[test]
fn rules_lists_standard_table() {
    havenctl()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("support-plan"))
        .stdout(predicate::str::contains(
            "incident         incidents, residents, activity-feed, dashboard-metrics",
        ));
}

#[test]
fn rules_json_is_parseable() {
    let output = havenctl().args(["rules", "-o", "json"]).output().unwrap();
    assert!(output.status.success());

    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rules = rules.as_array().unwrap();
    assert_eq!(rules.len(), 9);
    assert_eq!(rules[0]["entity"], "property");
    assert_eq!(rules[0]["instance_root"], "properties");
}
