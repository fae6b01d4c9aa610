// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! haven-core: Shared data model for the haven data-access layer
//!
//! This crate provides the operation model, outcome classification, error
//! taxonomy and invalidation graph used by the resilient client and the
//! `havenctl` CLI. It performs no I/O.

pub mod entity;
pub mod error;
pub mod invalidation;
pub mod operation;
pub mod outcome;

pub use entity::{EntityRef, EntityType};
pub use error::{Error, ErrorKind, Result};
pub use invalidation::{CacheKey, InvalidationGraph, InvalidationRule};
pub use operation::{CallOptions, Method, Operation};
pub use outcome::{classify_status, Classification, Failure, Outcome, Response};
