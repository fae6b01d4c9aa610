// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Seam to the reactive read cache.
//!
//! The client never reads cached values. After a successful write it tells
//! the cache which keys are stale; discarding and refetching is the cache's job.

use std::collections::BTreeSet;
use std::sync::Mutex;

use haven_core::CacheKey;

/// Receives staleness instructions after successful writes.
pub trait ReadCache: Send + Sync + 'static {
    fn mark_stale(&self, keys: &BTreeSet<CacheKey>);
}

/// In-memory cache seam that records every key it is told is stale.
#[derive(Debug, Default)]
pub struct StaleKeyLog {
    marked: Mutex<Vec<CacheKey>>,
}

impl StaleKeyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys marked stale so far, in the order they arrived.
    pub fn marked(&self) -> Vec<CacheKey> {
        match self.marked.lock() {
            Ok(marked) => marked.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns true if `key` or any key it is nested under was marked stale.
    ///
    /// Marking `residents` stales `residents/42`, but not the other way round.
    pub fn is_stale(&self, key: &CacheKey) -> bool {
        let marked = match self.marked.lock() {
            Ok(marked) => marked,
            Err(poisoned) => poisoned.into_inner(),
        };
        marked.iter().any(|m| m.is_prefix_of(key))
    }

    /// Returns and forgets the keys marked so far.
    pub fn take(&self) -> Vec<CacheKey> {
        match self.marked.lock() {
            Ok(mut marked) => std::mem::take(&mut *marked),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl ReadCache for StaleKeyLog {
    fn mark_stale(&self, keys: &BTreeSet<CacheKey>) {
        let mut marked = match self.marked.lock() {
            Ok(marked) => marked,
            Err(poisoned) => poisoned.into_inner(),
        };
        marked.extend(keys.iter().cloned());
    }
}
