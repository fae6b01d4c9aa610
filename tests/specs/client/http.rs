// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport behavior against a local socket server.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use haven_client::{
    ClientConfig, CredentialRefresher, HttpRefresher, HttpTransport, RefreshError,
    ResilientClient, Session,
};
use haven_core::{Error, Operation};

/// Serves one scripted reply per connection, then stops accepting.
struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    async fn start(replies: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            for (status, body) in replies {
                let (mut stream, _) = listener.accept().await.unwrap();
                let request = read_request(&mut stream).await;
                log.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {status} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
        });

        TestServer { addr, requests }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Raw requests received so far, lowercased.
    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_lowercase()
}

fn client_for(server: &TestServer) -> ResilientClient<HttpTransport> {
    let config = ClientConfig {
        base_delay_ms: 10,
        max_delay_ms: 50,
        timeout_ms: 2_000,
        ..ClientConfig::new(server.url())
    };
    ResilientClient::new(config).unwrap()
}

#[tokio::test]
async fn get_decodes_json_and_sends_bearer_token() {
    let server = TestServer::start(vec![(200, r#"{"rooms":[{"id":"r1"}]}"#)]).await;
    let client = client_for(&server);
    client.sign_in(Session::new("tok-123")).await;

    let response = client.execute(Operation::get("/rooms")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({"rooms": [{"id": "r1"}]}));

    let request = &server.requests()[0];
    assert!(request.starts_with("get /rooms http/1.1"), "{request}");
    assert!(request.contains("authorization: bearer tok-123"), "{request}");
}

#[tokio::test]
async fn post_sends_body_and_idempotency_key() {
    let server = TestServer::start(vec![(201, r#"{"id":"i1"}"#)]).await;
    let client = client_for(&server);

    let op = Operation::post("/incidents", json!({"severity": "high"}));
    let key = op.idempotency_key().unwrap().to_lowercase();
    let response = client.execute(op).await.unwrap();

    assert_eq!(response.status, 201);
    let request = &server.requests()[0];
    assert!(request.contains(&format!("idempotency-key: {key}")), "{request}");
    assert!(request.ends_with(r#"{"severity":"high"}"#), "{request}");
}

#[tokio::test]
async fn transient_status_is_retried_over_http() {
    let server = TestServer::start(vec![(503, ""), (200, r#"{"ok":true}"#)]).await;
    let client = client_for(&server);

    let response = client.execute(Operation::get("/residents")).await.unwrap();

    assert_eq!(response.attempts, 2);
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn client_error_body_is_surfaced() {
    let server = TestServer::start(vec![(422, r#"{"error":"name required"}"#)]).await;
    let client = client_for(&server);

    let err = client
        .execute(Operation::post("/residents", json!({})))
        .await
        .unwrap_err();

    match err {
        Error::ClientError { status, body } => {
            assert_eq!(status, 422);
            assert_eq!(body["error"], "name required");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn refused_connection_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ResilientClient::new(ClientConfig::new(format!("http://{addr}"))).unwrap();
    let err = client
        .execute(Operation::get("/rooms").without_retry())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Network { attempts: 1, .. }), "{err:?}");
}

#[tokio::test]
async fn refresher_exchanges_refresh_token() {
    let server = TestServer::start(vec![(
        200,
        r#"{"access_token":"new-access","expires_in":3600}"#,
    )])
    .await;
    let refresher = HttpRefresher::new(format!("{}/auth/refresh", server.url()));

    let session = refresher
        .refresh(Some(Session::new("old").with_refresh_token("r-1")))
        .await
        .unwrap();

    assert_eq!(session.access_token, "new-access");
    assert_eq!(session.refresh_token.as_deref(), Some("r-1"));
    assert!(session.expires_at.is_some());
    assert!(server.requests()[0].ends_with(r#"{"refresh_token":"r-1"}"#));
}

#[tokio::test]
async fn refresher_rejection_is_reported() {
    let server = TestServer::start(vec![(401, r#"{"error":"revoked"}"#)]).await;
    let refresher = HttpRefresher::new(format!("{}/auth/refresh", server.url()));

    let result = refresher
        .refresh(Some(Session::new("old").with_refresh_token("r-1")))
        .await;

    assert!(matches!(result, Err(RefreshError::Rejected(_))));
}

#[tokio::test]
async fn refresher_rejects_out_of_range_expiry() {
    let server = TestServer::start(vec![
        (200, r#"{"access_token":"a","expires_in":9223372036854775807}"#),
        (200, r#"{"access_token":"b","expires_in":-30}"#),
    ])
    .await;
    let refresher = HttpRefresher::new(format!("{}/auth/refresh", server.url()));

    for _ in 0..2 {
        let result = refresher
            .refresh(Some(Session::new("old").with_refresh_token("r-1")))
            .await;
        assert!(
            matches!(&result, Err(RefreshError::Rejected(msg)) if msg.contains("expires_in")),
            "{result:?}"
        );
    }
}

#[tokio::test]
async fn expired_token_refreshed_through_endpoint() {
    let server = TestServer::start(vec![
        (401, r#"{"error":"expired"}"#),
        (200, r#"{"access_token":"fresh"}"#),
        (200, r#"{"ok":true}"#),
    ])
    .await;
    let config = ClientConfig {
        refresh_url: Some("/auth/refresh".to_string()),
        ..ClientConfig::new(server.url())
    };
    let client = ResilientClient::new(config).unwrap();
    client
        .sign_in(Session::new("stale").with_refresh_token("r-1"))
        .await;

    let response = client.execute(Operation::get("/residents")).await.unwrap();

    assert_eq!(response.attempts, 2);
    let requests = server.requests();
    assert!(requests[1].starts_with("post /auth/refresh"));
    assert!(requests[2].contains("authorization: bearer fresh"));
}
