// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline queue for writes issued while disconnected.
//!
//! Writes wait here in submission order with their continuation still
//! pending. On reconnect the client replays them one at a time; the next
//! write is not taken until the previous one reached a terminal outcome.
//!
//! The queue can be backed by a JSONL journal. Each enqueued operation is
//! written as a single line and fsynced immediately, and the journal is
//! rewritten whenever a write leaves the queue.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use haven_core::{Operation, Response, Result};

/// Continuation of a queued write.
pub type Responder = oneshot::Sender<Result<Response>>;

/// An operation captured while offline.
#[derive(Debug)]
pub struct QueuedWrite {
    /// Submission sequence number, increasing across the queue's lifetime.
    pub seq: u64,
    pub operation: Operation,
    /// `None` for writes restored from the journal after a restart.
    responder: Option<Responder>,
}

impl QueuedWrite {
    /// Delivers the final outcome to whoever issued the write.
    pub fn resolve(self, result: Result<Response>) {
        match self.responder {
            Some(tx) => {
                if tx.send(result).is_err() {
                    debug!(seq = self.seq, "caller dropped before queued write resolved");
                }
            }
            None => match result {
                Ok(_) => debug!(seq = self.seq, "restored write {} replayed", self.operation),
                Err(e) => warn!(seq = self.seq, "restored write {} failed: {}", self.operation, e),
            },
        }
    }
}

/// Append-only JSONL log of queued operations.
#[derive(Debug)]
pub struct QueueJournal {
    path: PathBuf,
}

impl QueueJournal {
    /// Create or open a journal at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(path)?;
        Ok(QueueJournal {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one operation and fsyncs.
    pub fn append(&self, op: &Operation) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let json = serde_json::to_string(op)?;
        writeln!(file, "{}", json)?;
        file.sync_all()?;
        Ok(())
    }

    /// Read all journaled operations in order.
    pub fn read_all(&self) -> Result<Vec<Operation>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ops = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            ops.push(serde_json::from_str(&line)?);
        }
        Ok(ops)
    }

    /// Replaces the journal contents with `ops`.
    pub fn rewrite<'a>(&self, ops: impl Iterator<Item = &'a Operation>) -> Result<()> {
        let mut file = File::create(&self.path)?;
        for op in ops {
            let json = serde_json::to_string(op)?;
            writeln!(file, "{}", json)?;
        }
        file.sync_all()?;
        Ok(())
    }
}

struct QueueState {
    items: VecDeque<QueuedWrite>,
    /// True while a write taken by `begin_replay` is unresolved.
    replaying: bool,
    next_seq: u64,
}

/// FIFO of writes waiting for connectivity.
pub struct OfflineQueue {
    state: Mutex<QueueState>,
    journal: Option<QueueJournal>,
}

impl OfflineQueue {
    /// Creates an in-memory queue.
    pub fn new() -> Self {
        OfflineQueue {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                replaying: false,
                next_seq: 0,
            }),
            journal: None,
        }
    }

    /// Creates a queue backed by a journal, restoring any writes it holds.
    pub fn with_journal(journal: QueueJournal) -> Result<Self> {
        let restored = journal.read_all()?;
        if !restored.is_empty() {
            warn!(
                "restored {} queued write(s) from {}",
                restored.len(),
                journal.path().display()
            );
        }

        let items: VecDeque<QueuedWrite> = restored
            .into_iter()
            .enumerate()
            .map(|(i, operation)| QueuedWrite {
                seq: i as u64,
                operation,
                responder: None,
            })
            .collect();
        let next_seq = items.len() as u64;

        Ok(OfflineQueue {
            state: Mutex::new(QueueState {
                items,
                replaying: false,
                next_seq,
            }),
            journal: Some(journal),
        })
    }

    /// Enqueues a write and returns the receiver its outcome will arrive on.
    pub async fn enqueue(&self, operation: Operation) -> Result<oneshot::Receiver<Result<Response>>> {
        let mut state = self.state.lock().await;
        if let Some(journal) = &self.journal {
            journal.append(&operation)?;
        }

        let (tx, rx) = oneshot::channel();
        let seq = state.next_seq;
        state.next_seq += 1;
        debug!(seq, "queued {}", operation);
        state.items.push_back(QueuedWrite {
            seq,
            operation,
            responder: Some(tx),
        });
        Ok(rx)
    }

    /// Takes the oldest write for replay.
    ///
    /// Returns `None` if the queue is empty or another write is mid-replay.
    pub async fn begin_replay(&self) -> Option<QueuedWrite> {
        let mut state = self.state.lock().await;
        if state.replaying {
            return None;
        }
        let write = state.items.pop_front()?;
        state.replaying = true;
        Some(write)
    }

    /// Puts a write taken by `begin_replay` back at the head of the queue.
    pub async fn requeue_front(&self, write: QueuedWrite) {
        let mut state = self.state.lock().await;
        state.items.push_front(write);
        state.replaying = false;
    }

    /// Marks the write taken by `begin_replay` as resolved.
    pub async fn finish_replay(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.replaying = false;
        if let Some(journal) = &self.journal {
            journal.rewrite(state.items.iter().map(|w| &w.operation))?;
        }
        Ok(())
    }

    /// Number of writes waiting (excluding one mid-replay).
    pub async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.items.is_empty()
    }

    /// Returns true if any write is waiting or mid-replay.
    pub async fn has_pending(&self) -> bool {
        let state = self.state.lock().await;
        state.replaying || !state.items.is_empty()
    }

    /// Operations waiting in the queue, oldest first.
    pub async fn pending_operations(&self) -> Vec<Operation> {
        let state = self.state.lock().await;
        state.items.iter().map(|w| w.operation.clone()).collect()
    }
}

impl Default for OfflineQueue {
    fn default() -> Self {
        Self::new()
    }
}
