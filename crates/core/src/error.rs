// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for haven data-access operations.
//!
//! Application code sees exactly one of these per failed Operation. Retries,
//! session refreshes and offline queueing never surface as intermediate errors.

use serde_json::Value;
use thiserror::Error;

/// All possible errors that can end an Operation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    #[error("server error {status} after {attempts} attempt(s)\n  hint: the backend is unavailable or rate limiting, try again later")]
    TransientServerError { status: u16, attempts: u32 },

    #[error("network error after {attempts} attempt(s): {message}")]
    Network { message: String, attempts: u32 },

    #[error("request rejected with status {status}")]
    ClientError { status: u16, body: Value },

    #[error("session expired\n  hint: sign in again to continue")]
    SessionExpired,

    #[error("operation cancelled")]
    Cancelled,

    #[error("queued write could not be replayed: {source}")]
    QueueReplayFailure {
        #[source]
        source: Box<Error>,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`], used when rendering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Timeout,
    TransientServerError,
    Network,
    ClientError,
    SessionExpired,
    Cancelled,
    QueueReplayFailure,
    Local,
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::TransientServerError { .. } => ErrorKind::TransientServerError,
            Error::Network { .. } => ErrorKind::Network,
            Error::ClientError { .. } => ErrorKind::ClientError,
            Error::SessionExpired => ErrorKind::SessionExpired,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::QueueReplayFailure { .. } => ErrorKind::QueueReplayFailure,
            Error::InvalidRequest(_)
            | Error::InvalidInput(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::Json(_) => ErrorKind::Local,
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::TransientServerError { status, .. } | Error::ClientError { status, .. } => {
                Some(*status)
            }
            Error::SessionExpired => Some(401),
            Error::QueueReplayFailure { source } => source.status(),
            _ => None,
        }
    }

    /// Returns true if this error means a retry budget ran out.
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(
            self,
            Error::Timeout { .. } | Error::TransientServerError { .. } | Error::Network { .. }
        )
    }

    /// Wraps budget exhaustion of a queued write; other errors pass through.
    pub fn into_replay_failure(self) -> Error {
        if self.is_budget_exhausted() {
            Error::QueueReplayFailure {
                source: Box::new(self),
            }
        } else {
            self
        }
    }
}

/// A specialized Result type for haven operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
