// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Resilient client turning unreliable calls into dependable operations.
//!
//! Provides a high-level interface for:
//! - Executing operations with deadline, retry and jittered backoff
//! - Diverting writes to the offline queue while disconnected
//! - Refreshing an expired session once and replaying
//! - Marking dependent cached reads stale after successful writes
//!
//! Per operation:
//!
//! ```text
//! Created ─► Sending ─┬─► Success
//!               ▲     ├─► Retryable ─► Backoff ─┐
//!               │     ├─► Terminal              │
//!               └─────┴─────────────────────────┘
//!   interrupts: ─► Queued (writes, on disconnect)
//!               ─► RefreshingSession ─► Sending (at most once)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use haven_core::{Error, InvalidationGraph, Operation, Outcome, Response, Result};

use crate::cache::{ReadCache, StaleKeyLog};
use crate::cancel::CancellationToken;
use crate::config::ClientConfig;
use crate::connectivity::Connectivity;
use crate::http::{HttpRefresher, HttpTransport};
use crate::queue::{OfflineQueue, QueueJournal};
use crate::retry::{AttemptLog, RetryPolicy};
use crate::session::{
    Credential, CredentialRefresher, NoRefresh, Session, SessionEvent, SessionManager,
};
use crate::transport::{Request, Transport, TransportCore};

/// Where the attempt loop left an operation.
enum Step {
    /// Terminal outcome reached.
    Resolved(Result<Response>),
    /// A write lost connectivity mid-flight and belongs in the queue.
    Offline,
}

struct ClientInner<T: Transport> {
    config: ClientConfig,
    policy: RetryPolicy,
    core: TransportCore<T>,
    session: SessionManager,
    queue: OfflineQueue,
    connectivity: Connectivity,
    graph: InvalidationGraph,
    cache: Arc<dyn ReadCache>,
    /// Held by the one task allowed to replay the queue.
    drain_lock: Mutex<()>,
    /// Set once a task is watching the connectivity flag.
    watching: AtomicBool,
}

/// Resilient data-access client. Cheap to clone; clones share all state.
pub struct ResilientClient<T: Transport = HttpTransport> {
    inner: Arc<ClientInner<T>>,
}

impl<T: Transport> Clone for ResilientClient<T> {
    fn clone(&self) -> Self {
        ResilientClient {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Builder for [`ResilientClient`].
pub struct ClientBuilder<T: Transport> {
    config: ClientConfig,
    transport: T,
    refresher: Arc<dyn CredentialRefresher>,
    session: Option<Session>,
    cache: Arc<dyn ReadCache>,
    graph: InvalidationGraph,
    connectivity: Option<Connectivity>,
}

impl<T: Transport> ClientBuilder<T> {
    /// Sets the credential refresher.
    pub fn refresher(mut self, refresher: Arc<dyn CredentialRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    /// Sets the initial session.
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Sets the read cache told about stale keys.
    pub fn cache(mut self, cache: Arc<dyn ReadCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Shares a connectivity flag with the platform signal adapter.
    ///
    /// Overrides `start_online` from the config. Flipping the shared flag
    /// online drains the queue the same way [`ResilientClient::set_online`] does.
    pub fn connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Replaces the standard invalidation rules.
    pub fn graph(mut self, graph: InvalidationGraph) -> Self {
        self.graph = graph;
        self
    }

    /// Builds the client. Inside a Tokio runtime this also starts watching
    /// the connectivity flag; otherwise watching starts on first use.
    pub fn build(self) -> Result<ResilientClient<T>> {
        self.config.validate()?;

        let queue = match &self.config.queue_journal {
            Some(path) => OfflineQueue::with_journal(QueueJournal::open(path)?)?,
            None => OfflineQueue::new(),
        };

        let connectivity = self
            .connectivity
            .unwrap_or_else(|| Connectivity::new(self.config.start_online));

        let client = ResilientClient {
            inner: Arc::new(ClientInner {
                policy: self.config.retry_policy(),
                connectivity,
                config: self.config,
                core: TransportCore::new(self.transport),
                session: SessionManager::new(self.refresher, self.session),
                queue,
                graph: self.graph,
                cache: self.cache,
                drain_lock: Mutex::new(()),
                watching: AtomicBool::new(false),
            }),
        };
        client.watch_connectivity();
        Ok(client)
    }
}

impl ResilientClient<HttpTransport> {
    /// Create a client with the reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::http_builder(config).build()
    }

    /// Builder with the reqwest transport.
    ///
    /// Uses [`HttpRefresher`] when `refresh_url` is configured.
    pub fn http_builder(config: ClientConfig) -> ClientBuilder<HttpTransport> {
        let refresher: Arc<dyn CredentialRefresher> = match config.refresh_endpoint() {
            Some(url) => Arc::new(HttpRefresher::new(url)),
            None => Arc::new(NoRefresh),
        };
        Self::builder(config, HttpTransport::new()).refresher(refresher)
    }
}

impl<T: Transport> ResilientClient<T> {
    /// Start building a client with a custom transport.
    pub fn builder(config: ClientConfig, transport: T) -> ClientBuilder<T> {
        ClientBuilder {
            config,
            transport,
            refresher: Arc::new(NoRefresh),
            session: None,
            cache: Arc::new(StaleKeyLog::new()),
            graph: InvalidationGraph::standard(),
            connectivity: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &T {
        self.inner.core.transport()
    }

    pub fn invalidation_graph(&self) -> &InvalidationGraph {
        &self.inner.graph
    }

    pub fn is_online(&self) -> bool {
        self.inner.connectivity.is_online()
    }

    /// Feeds a platform connectivity signal.
    ///
    /// Going online wakes the connectivity watcher, which drains the queue.
    pub fn set_online(&self, online: bool) {
        self.watch_connectivity();
        let reconnected = self.inner.connectivity.set_online(online);
        debug!(online, reconnected, "connectivity signal");
    }

    /// Starts the task that drains the queue whenever the flag goes online.
    ///
    /// No-op outside a Tokio runtime or when a watcher already runs. The task
    /// holds only a weak reference and ends with the last client clone.
    fn watch_connectivity(&self) {
        if self.inner.watching.swap(true, Ordering::SeqCst) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.inner.watching.store(false, Ordering::SeqCst);
            return;
        };

        let mut signal = self.inner.connectivity.subscribe();
        let weak: Weak<ClientInner<T>> = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            let mut online = *signal.borrow_and_update();
            while signal.changed().await.is_ok() {
                let was_online = online;
                online = *signal.borrow_and_update();
                if !online {
                    continue;
                }
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if !was_online {
                    info!("connectivity restored");
                }
                ResilientClient { inner }.drain().await;
            }
        });
    }

    /// Number of writes waiting in the offline queue.
    pub async fn pending_writes(&self) -> usize {
        self.inner.queue.len().await
    }

    /// Operations waiting in the offline queue, oldest first.
    pub async fn pending_operations(&self) -> Vec<Operation> {
        self.inner.queue.pending_operations().await
    }

    pub async fn sign_in(&self, session: Session) {
        self.inner.session.sign_in(session).await;
    }

    pub async fn sign_out(&self) {
        self.inner.session.sign_out().await;
    }

    pub async fn session(&self) -> Option<Session> {
        self.inner.session.session().await
    }

    /// Subscribes to refresh and re-authentication events.
    pub fn session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.session.subscribe()
    }

    /// Executes an operation to its single final outcome.
    ///
    /// Writes issued while offline (or while earlier writes are still queued)
    /// wait in the queue; the returned future resolves once they are replayed.
    pub async fn execute(&self, operation: Operation) -> Result<Response> {
        self.execute_inner(operation, None).await
    }

    /// Like [`execute`](Self::execute), aborting the in-flight attempt when `cancel` fires.
    pub async fn execute_cancellable(
        &self,
        operation: Operation,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        self.execute_inner(operation, Some(cancel)).await
    }

    async fn execute_inner(
        &self,
        operation: Operation,
        cancel: Option<&CancellationToken>,
    ) -> Result<Response> {
        if operation.mutates() && (!self.is_online() || self.inner.queue.has_pending().await) {
            return self.enqueue(operation).await;
        }

        match self.run(&operation, cancel).await {
            Step::Resolved(result) => {
                if result.is_ok() {
                    self.invalidate(&operation);
                }
                result
            }
            Step::Offline => {
                debug!("connectivity lost during {}, queueing", operation);
                self.enqueue(operation).await
            }
        }
    }

    async fn enqueue(&self, operation: Operation) -> Result<Response> {
        let rx = self.inner.queue.enqueue(operation).await?;
        self.watch_connectivity();
        if self.is_online() {
            self.spawn_drain();
        }
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::Cancelled),
        }
    }

    fn spawn_drain(&self) {
        let client = self.clone();
        tokio::spawn(async move {
            client.drain().await;
        });
    }

    /// Replays queued writes in submission order while online.
    ///
    /// Returns the number of writes that reached a terminal outcome. Only one
    /// drain runs at a time; a concurrent call returns 0 immediately.
    pub async fn drain(&self) -> usize {
        let mut replayed = 0;

        loop {
            let Ok(guard) = self.inner.drain_lock.try_lock() else {
                return replayed;
            };

            let pending = self.inner.queue.len().await;
            if pending > 0 && self.is_online() {
                info!("draining {} queued write(s)", pending);
            }

            while self.is_online() {
                let Some(write) = self.inner.queue.begin_replay().await else {
                    break;
                };

                match self.run(&write.operation, None).await {
                    Step::Offline => {
                        info!("connectivity lost mid-drain, keeping {} queued", write.operation);
                        self.inner.queue.requeue_front(write).await;
                        break;
                    }
                    Step::Resolved(result) => {
                        let result = result.map_err(Error::into_replay_failure);
                        if result.is_ok() {
                            self.invalidate(&write.operation);
                        }
                        if let Err(e) = self.inner.queue.finish_replay().await {
                            warn!("failed to update queue journal: {}", e);
                        }
                        write.resolve(result);
                        replayed += 1;
                    }
                }
            }

            drop(guard);

            // A write may have been queued after the loop saw an empty queue
            if !self.is_online() || !self.inner.queue.has_pending().await {
                if replayed > 0 {
                    info!("drain finished, {} write(s) replayed", replayed);
                }
                return replayed;
            }
        }
    }

    fn request_for(&self, operation: &Operation, credential: &Credential) -> Request {
        Request {
            method: operation.method(),
            url: self.inner.config.url_for(operation.target()),
            body: operation.body().cloned(),
            credential: credential.token.clone(),
            idempotency_key: operation.idempotency_key().map(str::to_string),
        }
    }

    /// Attempt loop: transport, session refresh, retry and backoff.
    async fn run(&self, operation: &Operation, cancel: Option<&CancellationToken>) -> Step {
        let policy = &self.inner.policy;
        let max_retries = operation.options().retry_budget(policy.max_retries);
        let deadline = operation.options().timeout_or(self.inner.config.timeout());

        let mut credential = match self.inner.session.credential().await {
            Ok(c) => c,
            Err(e) => return Step::Resolved(Err(e)),
        };

        let mut log = AttemptLog::default();
        let mut retries = 0;
        let mut refreshed = false;

        loop {
            let index = log.begin();
            let request = self.request_for(operation, &credential);
            let outcome = self.inner.core.execute(request, deadline, cancel).await;
            log.finish(&outcome);
            debug!(attempt = index, "{}: {}", operation, outcome.label());

            let retry = policy.should_retry(retries, max_retries, &outcome);
            let label = outcome.label();

            match outcome {
                Outcome::Success(mut response) => {
                    response.attempts = log.count();
                    if log.count() > 1 {
                        info!("{} succeeded after {} attempts", operation, log.count());
                    }
                    return Step::Resolved(Ok(response));
                }
                Outcome::Terminal(failure) if failure.is_auth_expired() => {
                    if refreshed {
                        warn!("{} rejected again after session refresh", operation);
                        return Step::Resolved(Err(Error::SessionExpired));
                    }
                    refreshed = true;
                    credential = match self.inner.session.refresh_after(credential.generation).await
                    {
                        Ok(c) => c,
                        Err(e) => return Step::Resolved(Err(e)),
                    };
                }
                Outcome::Terminal(failure) => {
                    return Step::Resolved(Err(failure.into_error(log.count())));
                }
                Outcome::Retryable(failure) => {
                    if operation.mutates() && failure.is_network() && !self.is_online() {
                        return Step::Offline;
                    }
                    if !retry {
                        if max_retries > 0 {
                            warn!(
                                "{} gave up after {} attempts in {:?}: {}",
                                operation,
                                log.count(),
                                log.elapsed(),
                                log.summary()
                            );
                        }
                        return Step::Resolved(Err(failure.into_error(log.count())));
                    }

                    let delay = policy.delay(retries);
                    retries += 1;
                    warn!(
                        "{} failed ({}), retry {}/{} in {:?}",
                        operation, label, retries, max_retries, delay
                    );

                    match cancel {
                        Some(token) => {
                            tokio::select! {
                                biased;
                                _ = token.cancelled() => return Step::Resolved(Err(Error::Cancelled)),
                                _ = tokio::time::sleep(delay) => {}
                            }
                        }
                        None => tokio::time::sleep(delay).await,
                    }
                }
            }
        }
    }

    /// Marks cached reads stale after a successful write.
    fn invalidate(&self, operation: &Operation) {
        if !operation.mutates() {
            return;
        }
        let Some(target) = operation.invalidates() else {
            return;
        };
        let keys = self.inner.graph.invalidate_ref(target);
        if keys.is_empty() {
            return;
        }
        debug!(entity = %target.entity, "marking {} cache key(s) stale", keys.len());
        self.inner.cache.mark_stale(&keys);
    }
}
