// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Logical operations issued by application code.
//!
//! An [`Operation`] is immutable once built. The builder methods consume and
//! return it, so nothing downstream can alter what the caller issued.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::entity::{EntityRef, EntityType};
use crate::error::{Error, Result};

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Returns true unless the method is a plain read.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Method::Get)
    }

    /// Returns true if resubmitting the method cannot duplicate its effect.
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Method::Get | Method::Put | Method::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(Error::InvalidInput(format!(
                "invalid method: '{s}'\n  hint: valid methods are: GET, POST, PUT, PATCH, DELETE"
            ))),
        }
    }
}

/// Per-call overrides of the client defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOptions {
    /// Deadline for each attempt, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Retry budget (number of retries after the first attempt).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// When false, retryable failures end the operation immediately.
    #[serde(default = "default_retry")]
    pub retry: bool,
}

fn default_retry() -> bool {
    true
}

impl Default for CallOptions {
    fn default() -> Self {
        CallOptions {
            timeout_ms: None,
            max_retries: None,
            retry: true,
        }
    }
}

impl CallOptions {
    /// Per-attempt deadline, falling back to `default`. A zero override is ignored.
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(default)
    }

    /// Effective retry budget, falling back to `default`.
    pub fn retry_budget(&self, default: u32) -> u32 {
        if self.retry {
            self.max_retries.unwrap_or(default)
        } else {
            0
        }
    }
}

/// One logical call against the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    method: Method,
    target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<Value>,
    mutates: bool,
    idempotent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    idempotency_key: Option<String>,
    #[serde(default)]
    options: CallOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invalidates: Option<EntityRef>,
}

impl Operation {
    /// Creates an operation with method-derived defaults.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        let idempotent = method.is_idempotent();
        Operation {
            method,
            target: target.into(),
            body: None,
            mutates: method.is_mutating(),
            idempotent,
            idempotency_key: (!idempotent).then(new_idempotency_key),
            options: CallOptions::default(),
            invalidates: None,
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::Get, target)
    }

    pub fn post(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, target).with_body(body)
    }

    pub fn put(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, target).with_body(body)
    }

    pub fn patch(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Patch, target).with_body(body)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::Delete, target)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Overrides the per-attempt deadline, rounded up to at least 1ms.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.options.timeout_ms = Some(ms.max(1));
        self
    }

    /// Overrides the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.options.max_retries = Some(max_retries);
        self
    }

    /// Opts out of retries entirely.
    pub fn without_retry(mut self) -> Self {
        self.options.retry = false;
        self
    }

    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    /// Overrides whether the operation mutates backend state.
    pub fn mutating(mut self, mutates: bool) -> Self {
        self.mutates = mutates;
        self
    }

    /// Overrides the idempotency flag. Non-idempotent operations carry a key.
    pub fn idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        if idempotent {
            self.idempotency_key = None;
        } else if self.idempotency_key.is_none() {
            self.idempotency_key = Some(new_idempotency_key());
        }
        self
    }

    /// Declares the entity this operation mutates.
    pub fn invalidating(mut self, entity: EntityType, id: Option<&str>) -> Self {
        self.invalidates = Some(EntityRef {
            entity,
            id: id.map(str::to_string),
        });
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn mutates(&self) -> bool {
        self.mutates
    }

    pub fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }

    pub fn options(&self) -> &CallOptions {
        &self.options
    }

    pub fn invalidates(&self) -> Option<&EntityRef> {
        self.invalidates.as_ref()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.target)
    }
}

fn new_idempotency_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
