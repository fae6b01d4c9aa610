// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! haven-client: Resilient data access for the care-management backend.
//!
//! Every call the application makes goes through one [`ResilientClient`],
//! which turns flaky network calls into operations with a single final
//! outcome.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌─────────────┐
//! │  Resilient   │────►│ TransportCore │────►│  Transport  │────► backend
//! │   Client     │◄────│ (deadline,    │◄────│   (trait)   │
//! └──────────────┘     │  classify)    │     └─────────────┘
//!    │   │   │         └───────────────┘
//!    │   │   └──────────► SessionManager  (single-flight refresh)
//!    │   └──────────────► OfflineQueue    (writes while offline)
//!    └──────────────────► InvalidationGraph ─► ReadCache::mark_stale
//! ```
//!
//! # Features
//!
//! - Per-attempt deadlines and caller cancellation
//! - Retry with exponential backoff and jitter for transient failures
//! - FIFO offline queue for writes, optionally journaled to JSONL
//! - One credential refresh shared by all operations that hit a 401
//! - Cache invalidation after successful writes
//! - Injectable transport and refresher traits for testing

mod cache;
mod cancel;
mod client;
mod config;
mod connectivity;
mod http;
mod queue;
mod retry;
mod session;
mod transport;

pub use cache::{ReadCache, StaleKeyLog};
pub use cancel::CancellationToken;
pub use client::{ClientBuilder, ResilientClient};
pub use config::ClientConfig;
pub use connectivity::Connectivity;
pub use http::{HttpRefresher, HttpTransport};
pub use queue::{OfflineQueue, QueueJournal, QueuedWrite};
pub use retry::{Attempt, AttemptLog, RetryPolicy};
pub use session::{
    Credential, CredentialRefresher, NoRefresh, RefreshError, Session, SessionEvent,
    SessionManager,
};
pub use transport::{
    RawResponse, Request, Transport, TransportCore, TransportError, TransportResult,
};

#[cfg(test)]
mod test_helpers;
