// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport and credential refresher using reqwest.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;

use haven_core::Method;

use crate::session::{CredentialRefresher, RefreshError, Session};
use crate::transport::{RawResponse, Request, Transport, TransportError, TransportResult};

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// JSON-over-HTTP transport.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport {
            client: reqwest::Client::new(),
        }
    }

    /// Uses an existing reqwest client (shared connection pool, custom TLS).
    pub fn with_client(client: reqwest::Client) -> Self {
        HttpTransport { client }
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn transport_error(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else if e.is_connect() {
        TransportError::ConnectionFailed(e.to_string())
    } else {
        TransportError::RequestFailed(e.to_string())
    }
}

/// Decodes a response body: empty is `null`, non-JSON is kept as a string.
pub(crate) fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: Request,
    ) -> Pin<Box<dyn Future<Output = TransportResult<RawResponse>> + Send + '_>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .request(reqwest_method(request.method), &request.url);

            if let Some(token) = &request.credential {
                builder = builder.bearer_auth(token);
            }
            if let Some(key) = &request.idempotency_key {
                builder = builder.header(IDEMPOTENCY_HEADER, key);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(transport_error)?;
            let status = response.status().as_u16();
            let bytes = response.bytes().await.map_err(transport_error)?;

            Ok(RawResponse::new(status, decode_body(&bytes)))
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Refreshes sessions against a token endpoint.
///
/// Posts `{"refresh_token": ...}` and expects `{access_token, refresh_token?, expires_in?}`.
#[derive(Debug, Clone)]
pub struct HttpRefresher {
    client: reqwest::Client,
    url: String,
}

impl HttpRefresher {
    pub fn new(url: impl Into<String>) -> Self {
        HttpRefresher {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn exchange(&self, current: Option<Session>) -> Result<Session, RefreshError> {
        let refresh_token = current
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
            .ok_or_else(|| RefreshError::Rejected("session has no refresh token".to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| RefreshError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(RefreshError::Rejected(format!("status {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(RefreshError::Unavailable(format!("status {}", status.as_u16())));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| RefreshError::Rejected(format!("malformed token response: {}", e)))?;

        let mut session = Session::new(tokens.access_token);
        // Keep the old refresh token when the endpoint does not rotate it
        session.refresh_token = tokens.refresh_token.or(Some(refresh_token));
        if let Some(secs) = tokens.expires_in {
            let expires_at = expiry_after(Utc::now(), secs).ok_or_else(|| {
                RefreshError::Rejected(format!(
                    "malformed token response: expires_in {} out of range",
                    secs
                ))
            })?;
            session.expires_at = Some(expires_at);
        }
        Ok(session)
    }
}

/// Absolute expiry `secs` after `now`; `None` if negative or unrepresentable.
pub(crate) fn expiry_after(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    if secs < 0 {
        return None;
    }
    now.checked_add_signed(chrono::Duration::try_seconds(secs)?)
}

impl CredentialRefresher for HttpRefresher {
    fn refresh(
        &self,
        current: Option<Session>,
    ) -> Pin<Box<dyn Future<Output = Result<Session, RefreshError>> + Send + '_>> {
        Box::pin(self.exchange(current))
    }
}
