// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity flag fed by platform online/offline signals.
//!
//! The flag is read by every operation and written only by the platform
//! signal adapter, so it lives in a `watch` channel.

use std::sync::Arc;
use tokio::sync::watch;

/// Shared online/offline flag.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Connectivity { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Updates the flag. Returns true if this was an offline-to-online transition.
    pub fn set_online(&self, online: bool) -> bool {
        let was_online = self.tx.send_replace(online);
        online && !was_online
    }

    /// Subscribes to transitions.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
