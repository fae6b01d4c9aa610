// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `havenctl request`.

#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;
use tempfile::TempDir;

fn havenctl() -> Command {
    cargo_bin_cmd!("havenctl")
}

fn write_config(temp: &TempDir, base_url: &str) -> PathBuf {
    let path = temp.path().join("client.toml");
    std::fs::write(
        &path,
        format!("base_url = \"{base_url}\"\nbase_delay_ms = 10\nmax_delay_ms = 20\n"),
    )
    .unwrap();
    path
}

/// Answers each scripted reply on its own connection, then exits.
fn serve(replies: Vec<(u16, &'static str)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    thread::spawn(move || {
        for (status, body) in replies {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        }
    });

    url
}

/// Reads headers and any content-length body so the socket closes cleanly.
fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_lowercase();
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return;
            }
        }
    }
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    format!("http://{}", listener.local_addr().unwrap())
}

#[test]
fn request_prints_body_and_stale_keys() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &serve(vec![(201, r#"{"id":"i9"}"#)]));

    havenctl()
        .args(["request", "POST", "/incidents", "--body", r#"{"severity":"low"}"#])
        .args(["--entity", "incident", "--id", "i9", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"i9\""))
        .stdout(predicate::str::contains(
            "marked stale: activity-feed, dashboard-metrics, incidents, incidents/i9, residents",
        ));
}

#[test]
fn request_retries_transient_status() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &serve(vec![(503, ""), (200, r#"{"ok":true}"#)]));

    let output = havenctl()
        .args(["request", "GET", "/rooms", "-o", "json", "--config"])
        .arg(&config)
        .output()
        .unwrap();

    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["attempts"], 2);
    assert_eq!(result["body"]["ok"], true);
}

#[test]
fn request_client_error_fails() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &serve(vec![(404, r#"{"error":"missing"}"#)]));

    havenctl()
        .args(["request", "GET", "/residents/r0", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: request rejected with status 404"));
}

#[test]
fn request_to_closed_port_is_network_error() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &closed_port_url());

    havenctl()
        .args(["request", "GET", "/rooms", "--no-retry", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: network error after 1 attempt(s)"));
}

#[test]
fn request_rejects_bad_body() {
    let temp = TempDir::new().unwrap();
    let config = write_config(&temp, &closed_port_url());

    havenctl()
        .args(["request", "POST", "/incidents", "--body", "{oops", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --body JSON"));
}
