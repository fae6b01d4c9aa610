// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction and the per-attempt transport core.
//!
//! Provides a trait-based transport layer that enables:
//! - Real HTTP requests for production ([`HttpTransport`](crate::HttpTransport))
//! - Mock transports for unit testing
//!
//! [`TransportCore`] wraps a transport with a deadline and cancellation and
//! classifies what comes back. It holds no shared state.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use haven_core::{Failure, Method, Outcome};

use crate::cancel::CancellationToken;

/// Error type for transport operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request was sent but the exchange failed before a status arrived.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Request could not be built (bad URL, unencodable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// One physical HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    /// Bearer credential, if a session is active.
    pub credential: Option<String>,
    pub idempotency_key: Option<String>,
}

/// Status and decoded body of a completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn new(status: u16, body: Value) -> Self {
        RawResponse { status, body }
    }
}

/// Transport trait for HTTP-like request/response exchanges.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations. Implementations must be
/// usable from many concurrent operations at once.
pub trait Transport: Send + Sync + 'static {
    /// Sends one request and waits for its response.
    fn send(
        &self,
        request: Request,
    ) -> Pin<Box<dyn Future<Output = TransportResult<RawResponse>> + Send + '_>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(
        &self,
        request: Request,
    ) -> Pin<Box<dyn Future<Output = TransportResult<RawResponse>> + Send + '_>> {
        (**self).send(request)
    }
}

/// Executes single attempts with a deadline and classifies the result.
pub struct TransportCore<T: Transport> {
    transport: T,
}

impl<T: Transport> TransportCore<T> {
    pub fn new(transport: T) -> Self {
        TransportCore { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs one attempt.
    ///
    /// On deadline expiry or cancellation the in-flight request future is
    /// dropped, which aborts the underlying call.
    pub async fn execute(
        &self,
        request: Request,
        deadline: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Outcome {
        let send = tokio::time::timeout(deadline, self.transport.send(request));

        let result = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Outcome::from_failure(Failure::Cancelled),
                    r = send => r,
                }
            }
            None => send.await,
        };

        match result {
            Err(_elapsed) => Outcome::from_failure(Failure::Timeout),
            Ok(Ok(response)) => Outcome::from_status(response.status, response.body),
            Ok(Err(TransportError::InvalidRequest(msg))) => {
                Outcome::from_failure(Failure::InvalidRequest(msg))
            }
            Ok(Err(e)) => Outcome::from_failure(Failure::Network(e.to_string())),
        }
    }
}
