// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for client tests.

#![allow(clippy::unwrap_used)]

use serde_json::{json, Value};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::ResilientClient;
use crate::config::ClientConfig;
use crate::connectivity::Connectivity;
use crate::session::{CredentialRefresher, RefreshError, Session};
use crate::transport::{RawResponse, Request, Transport, TransportError, TransportResult};

pub const BASE_URL: &str = "http://backend.test";

/// Scripted reply for one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, Value),
    /// Connection refused.
    Network,
    /// Never answers.
    Hang,
    /// Answers with a status after a delay.
    Delayed(Duration, u16),
    /// Flips the shared connectivity flag offline and fails the request.
    Disconnect,
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Status(200, json!({"ok": true}))
    }

    pub fn status(status: u16) -> Self {
        Reply::Status(status, Value::Null)
    }
}

/// Mock transport answering from a script; 200 once the script runs out.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    /// Requests in the order they were sent.
    sent: Arc<Mutex<Vec<Request>>>,
    /// "start METHOD path" / "end METHOD path" markers.
    events: Arc<Mutex<Vec<String>>>,
    /// When set, any other credential is answered with 401.
    valid_token: Arc<Mutex<Option<String>>>,
    connectivity: Option<Connectivity>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        let transport = Self::new();
        transport.push_replies(replies);
        transport
    }

    /// Flag flipped offline by [`Reply::Disconnect`].
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    pub fn push_replies(&self, replies: impl IntoIterator<Item = Reply>) {
        self.replies.lock().unwrap().extend(replies);
    }

    pub fn require_token(&self, token: &str) {
        *self.valid_token.lock().unwrap() = Some(token.to_string());
    }

    pub fn sent(&self) -> Vec<Request> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn next_reply(&self, request: &Request) -> Reply {
        if let Some(valid) = self.valid_token.lock().unwrap().as_deref() {
            if request.credential.as_deref() != Some(valid) {
                return Reply::Status(401, json!({"error": "token expired"}));
            }
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Reply::ok)
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        request: Request,
    ) -> Pin<Box<dyn Future<Output = TransportResult<RawResponse>> + Send + '_>> {
        Box::pin(async move {
            let label = format!(
                "{} {}",
                request.method.as_str(),
                request.url.trim_start_matches(BASE_URL)
            );
            let reply = self.next_reply(&request);
            self.sent.lock().unwrap().push(request);
            self.events.lock().unwrap().push(format!("start {label}"));

            let result = match reply {
                Reply::Status(status, body) => Ok(RawResponse::new(status, body)),
                Reply::Network => Err(TransportError::ConnectionFailed(
                    "connection refused".to_string(),
                )),
                Reply::Hang => std::future::pending().await,
                Reply::Delayed(delay, status) => {
                    tokio::time::sleep(delay).await;
                    Ok(RawResponse::new(status, json!({"ok": true})))
                }
                Reply::Disconnect => {
                    if let Some(connectivity) = &self.connectivity {
                        connectivity.set_online(false);
                    }
                    Err(TransportError::ConnectionFailed("network down".to_string()))
                }
            };

            self.events.lock().unwrap().push(format!("end {label}"));
            result
        })
    }
}

/// Refresher that counts calls and answers after a short delay.
pub struct MockRefresher {
    calls: AtomicUsize,
    result: Result<Session, RefreshError>,
    delay: Duration,
}

impl MockRefresher {
    pub fn succeeding(access_token: &str) -> Arc<Self> {
        Arc::new(MockRefresher {
            calls: AtomicUsize::new(0),
            result: Ok(Session::new(access_token).with_refresh_token("refresh-2")),
            delay: Duration::from_millis(20),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(MockRefresher {
            calls: AtomicUsize::new(0),
            result: Err(RefreshError::Rejected("refresh token revoked".to_string())),
            delay: Duration::from_millis(20),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialRefresher for MockRefresher {
    fn refresh(
        &self,
        _current: Option<Session>,
    ) -> Pin<Box<dyn Future<Output = Result<Session, RefreshError>> + Send + '_>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.result.clone()
        })
    }
}

/// Config with short backoff for tests.
pub fn test_config() -> ClientConfig {
    ClientConfig {
        base_delay_ms: 100,
        max_delay_ms: 1_000,
        timeout_ms: 5_000,
        ..ClientConfig::new(BASE_URL)
    }
}

pub fn make_client(transport: MockTransport) -> ResilientClient<MockTransport> {
    ResilientClient::builder(test_config(), transport)
        .build()
        .unwrap()
}

/// Session signed in with a token the backend no longer accepts.
pub fn stale_session() -> Session {
    Session::new("stale-token").with_refresh_token("refresh-1")
}
