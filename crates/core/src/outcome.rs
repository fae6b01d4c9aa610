// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Classification of attempt results.
//!
//! Every completed attempt lands in exactly one bucket:
//!
//! | Bucket    | Cause                                            |
//! |-----------|--------------------------------------------------|
//! | Success   | 2xx                                              |
//! | Retryable | 408, 429, 500-599, network error, deadline hit   |
//! | Terminal  | any other status, cancellation, invalid request |

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Status codes that are retried even though they are not 5xx.
const RETRYABLE_CLIENT_STATUSES: [u16; 2] = [408, 429];

/// Status signalling that the session credential has expired.
pub const AUTH_EXPIRED_STATUS: u16 = 401;

/// Bucket a status code falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    Retryable,
    Terminal,
}

/// Classifies an HTTP status code.
pub fn classify_status(status: u16) -> Classification {
    match status {
        200..=299 => Classification::Success,
        500..=599 => Classification::Retryable,
        s if RETRYABLE_CLIENT_STATUSES.contains(&s) => Classification::Retryable,
        _ => Classification::Terminal,
    }
}

/// A successful backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    /// Decoded JSON body; `null` when empty, a JSON string when not JSON.
    pub body: Value,
    /// Number of attempts the operation took.
    pub attempts: u32,
}

impl Response {
    /// Deserializes the body into a typed value.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Why an attempt did not succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// The backend answered with a non-2xx status.
    Status { status: u16, body: Value },
    /// The request never completed at the network level.
    Network(String),
    /// The per-attempt deadline expired.
    Timeout,
    /// The caller cancelled the operation.
    Cancelled,
    /// The request could not be built or encoded.
    InvalidRequest(String),
}

impl Failure {
    /// Returns true if this failure signals an expired session.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Failure::Status { status, .. } if *status == AUTH_EXPIRED_STATUS)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Failure::Network(_))
    }

    /// Converts the final failure of an operation into its error.
    pub fn into_error(self, attempts: u32) -> Error {
        match self {
            Failure::Status { status, body } => match classify_status(status) {
                Classification::Retryable => Error::TransientServerError { status, attempts },
                _ => Error::ClientError { status, body },
            },
            Failure::Network(message) => Error::Network { message, attempts },
            Failure::Timeout => Error::Timeout { attempts },
            Failure::Cancelled => Error::Cancelled,
            Failure::InvalidRequest(message) => Error::InvalidRequest(message),
        }
    }
}

/// Classified result of one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Response),
    Retryable(Failure),
    Terminal(Failure),
}

impl Outcome {
    /// Classifies a completed HTTP exchange.
    pub fn from_status(status: u16, body: Value) -> Self {
        match classify_status(status) {
            Classification::Success => Outcome::Success(Response {
                status,
                body,
                attempts: 1,
            }),
            Classification::Retryable => Outcome::Retryable(Failure::Status { status, body }),
            Classification::Terminal => Outcome::Terminal(Failure::Status { status, body }),
        }
    }

    /// Classifies a failure that produced no HTTP status.
    pub fn from_failure(failure: Failure) -> Self {
        match failure {
            Failure::Network(_) | Failure::Timeout => Outcome::Retryable(failure),
            Failure::Cancelled | Failure::InvalidRequest(_) => Outcome::Terminal(failure),
            Failure::Status { status, body } => Outcome::from_status(status, body),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Outcome::Retryable(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match self {
            Outcome::Success(r) => format!("success ({})", r.status),
            Outcome::Retryable(f) | Outcome::Terminal(f) => match f {
                Failure::Status { status, .. } => format!("status {status}"),
                Failure::Network(msg) => format!("network error: {msg}"),
                Failure::Timeout => "timeout".to_string(),
                Failure::Cancelled => "cancelled".to_string(),
                Failure::InvalidRequest(msg) => format!("invalid request: {msg}"),
            },
        }
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
