// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session credential and single-flight refresh.
//!
//! The session is the only state that concurrent operations write, so every
//! refresh goes through one shared in-flight future:
//!
//! ```text
//!  op A ─401─┐
//!  op B ─401─┼──► refresh_after(gen) ──► one CredentialRefresher::refresh
//!  op C ─401─┘            │
//!                         ▼
//!            all three replay with generation gen+1
//! ```
//!
//! Each credential snapshot carries the generation it was taken at. A refresh
//! requested for a generation that has already been superseded returns the
//! current credential without contacting the refresh endpoint.

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use haven_core::{Error, Result};

/// An access credential and its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Session {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns true if the session carries an expiry at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Error type for credential refresh.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// The identity provider refused the refresh.
    #[error("refresh rejected: {0}")]
    Rejected(String),

    /// The refresh endpoint could not be reached.
    #[error("refresh endpoint unavailable: {0}")]
    Unavailable(String),

    /// No refresh endpoint is configured.
    #[error("no refresh endpoint configured")]
    NotConfigured,
}

/// Exchanges an expiring session for a fresh one.
pub trait CredentialRefresher: Send + Sync + 'static {
    fn refresh(
        &self,
        current: Option<Session>,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<Session, RefreshError>> + Send + '_>>;
}

/// Refresher used when no refresh endpoint exists; every refresh fails.
#[derive(Debug, Default)]
pub struct NoRefresh;

impl CredentialRefresher for NoRefresh {
    fn refresh(
        &self,
        _current: Option<Session>,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<Session, RefreshError>> + Send + '_>> {
        Box::pin(async { Err(RefreshError::NotConfigured) })
    }
}

/// Session lifecycle notifications for the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A refresh succeeded.
    Refreshed { generation: u64 },
    /// A refresh failed; the application must sign the user in again.
    ReauthenticationRequired,
    /// The application installed a new session.
    SignedIn { generation: u64 },
    /// The application cleared the session.
    SignedOut,
}

/// Credential snapshot handed to one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: Option<String>,
    pub generation: u64,
}

type SharedRefresh = Shared<BoxFuture<'static, std::result::Result<Credential, RefreshError>>>;

struct SessionState {
    session: Option<Session>,
    generation: u64,
    /// Set after a failed refresh; cleared by `sign_in`.
    expired: bool,
    in_flight: Option<SharedRefresh>,
}

impl SessionState {
    fn credential(&self) -> Credential {
        Credential {
            token: self.session.as_ref().map(|s| s.access_token.clone()),
            generation: self.generation,
        }
    }
}

/// Owner of the current session.
pub struct SessionManager {
    state: Arc<Mutex<SessionState>>,
    refresher: Arc<dyn CredentialRefresher>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(refresher: Arc<dyn CredentialRefresher>, session: Option<Session>) -> Self {
        let (events, _) = broadcast::channel(64);
        SessionManager {
            state: Arc::new(Mutex::new(SessionState {
                session,
                generation: 0,
                expired: false,
                in_flight: None,
            })),
            refresher,
            events,
        }
    }

    /// Subscribes to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Installs a session obtained from the identity provider.
    pub async fn sign_in(&self, session: Session) {
        let mut state = self.state.lock().await;
        state.session = Some(session);
        state.expired = false;
        state.generation += 1;
        let _ = self.events.send(SessionEvent::SignedIn {
            generation: state.generation,
        });
    }

    /// Clears the session. Later operations are sent without a credential.
    pub async fn sign_out(&self) {
        let mut state = self.state.lock().await;
        state.session = None;
        state.expired = false;
        state.generation += 1;
        let _ = self.events.send(SessionEvent::SignedOut);
    }

    pub async fn session(&self) -> Option<Session> {
        self.state.lock().await.session.clone()
    }

    /// Returns true after a failed refresh, until the next `sign_in`.
    pub async fn is_expired(&self) -> bool {
        self.state.lock().await.expired
    }

    /// Returns the credential for a new attempt.
    ///
    /// A session whose expiry has passed is refreshed first.
    pub async fn credential(&self) -> Result<Credential> {
        let (credential, stale) = {
            let state = self.state.lock().await;
            if state.expired {
                return Err(Error::SessionExpired);
            }
            let stale = state
                .session
                .as_ref()
                .is_some_and(|s| s.is_expired_at(Utc::now()));
            (state.credential(), stale)
        };

        if stale {
            debug!("session past expiry, refreshing before send");
            self.refresh_after(credential.generation).await
        } else {
            Ok(credential)
        }
    }

    /// Refreshes the credential that was current at `stale_generation`.
    ///
    /// Joins an in-flight refresh if there is one, and skips the refresh if
    /// the generation has already moved on.
    pub async fn refresh_after(&self, stale_generation: u64) -> Result<Credential> {
        let refresh = {
            let mut state = self.state.lock().await;
            if state.expired {
                return Err(Error::SessionExpired);
            }
            if state.generation > stale_generation {
                return Ok(state.credential());
            }
            match &state.in_flight {
                Some(in_flight) => in_flight.clone(),
                None => {
                    let refresh = self.start_refresh(state.session.clone(), state.generation);
                    state.in_flight = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await.map_err(|_| Error::SessionExpired)
    }

    fn start_refresh(&self, current: Option<Session>, started_at: u64) -> SharedRefresh {
        let state = Arc::clone(&self.state);
        let refresher = Arc::clone(&self.refresher);
        let events = self.events.clone();

        async move {
            debug!(generation = started_at, "refreshing session credential");
            let result = refresher.refresh(current).await;

            let mut state = state.lock().await;
            state.in_flight = None;

            if state.generation != started_at {
                // sign_in or sign_out raced the refresh; theirs wins
                return Ok(state.credential());
            }

            match result {
                Ok(session) => {
                    state.session = Some(session);
                    state.generation += 1;
                    info!(generation = state.generation, "session refreshed");
                    let _ = events.send(SessionEvent::Refreshed {
                        generation: state.generation,
                    });
                    Ok(state.credential())
                }
                Err(e) => {
                    warn!("session refresh failed: {}", e);
                    state.session = None;
                    state.expired = true;
                    let _ = events.send(SessionEvent::ReauthenticationRequired);
                    Err(e)
                }
            }
        }
        .boxed()
        .shared()
    }
}
