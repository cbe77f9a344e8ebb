//! Access/refresh token lifecycle.
//!
//! [`AuthSessionManager`] is the one piece of shared mutable state in the
//! client. It hands out usable access tokens, refreshes them at most once at
//! a time, and tears the session down when the server refuses it.
//!
//! ## Single-flight refresh
//!
//! The first caller that needs a refresh spawns it as a tokio task and parks
//! a [`Shared`] handle to its result in the refresh slot. Every caller
//! arriving while that slot is occupied awaits the same handle, so they all
//! observe the same token or the same error. The task empties the slot on
//! every exit path (success, failure, panic, abort) before its result is
//! delivered, and records the outcome under a completion counter.
//!
//! A caller notes the counter before reading the cached token. If a refresh
//! completes between that read and the caller reaching the slot, the caller
//! takes the recorded outcome instead of starting another refresh.
//!
//! ## Session expiry
//!
//! `handle_unauthorized` clears persisted tokens and broadcasts
//! [`SessionEvent::Expired`] on a [`SessionSignal`]. Delivery is
//! asynchronous; receivers pick it up on their own task.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::core::decoder::ResponseDecoder;
use crate::core::endpoint::{Endpoint, HttpMethod};
use crate::core::transport::Transport;
use crate::error::NetworkError;
use crate::storage::session::{SessionStore, StoredSession};

/// Subtracted from the server-reported lifetime so tokens are refreshed
/// before they actually expire.
pub const EXPIRY_SAFETY_BUFFER_SECS: i64 = 300;

/// Cap on accepted token lifetimes (ten years).
const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Capacity of the session-event broadcast channel.
const SIGNAL_CAPACITY: usize = 16;

/// Tokens returned by a refresh (or login) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// Exchanges a refresh token for a new grant.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, NetworkError>;
}

// =============================================================================
// Session signal
// =============================================================================

/// Process-wide session notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session was cleared because the server refused it.
    Expired,
}

/// Broadcast channel for [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct SessionSignal {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget. Having no subscribers is not an error.
    pub fn notify_expired(&self) {
        let receivers = self.tx.send(SessionEvent::Expired).unwrap_or(0);
        tracing::debug!(receivers, "session-expired broadcast");
    }
}

impl Default for SessionSignal {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Session manager
// =============================================================================

type RefreshOutcome = Result<String, NetworkError>;
type RefreshFuture = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Default)]
struct RefreshSlot {
    in_flight: Option<RefreshFuture>,
    /// Refreshes finished so far.
    completed: u64,
    last_outcome: Option<RefreshOutcome>,
}

struct SessionInner {
    store: SessionStore,
    refresher: Arc<dyn TokenRefresher>,
    signal: SessionSignal,
    slot: Mutex<RefreshSlot>,
}

/// Owns the token lifecycle. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AuthSessionManager {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for AuthSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSessionManager")
            .field("refresh_in_flight", &self.is_refreshing())
            .finish_non_exhaustive()
    }
}

impl AuthSessionManager {
    #[must_use]
    pub fn new(store: SessionStore, refresher: Arc<dyn TokenRefresher>, signal: SessionSignal) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store,
                refresher,
                signal,
                slot: Mutex::new(RefreshSlot::default()),
            }),
        }
    }

    #[must_use]
    pub fn signal(&self) -> &SessionSignal {
        &self.inner.signal
    }

    /// Current persisted session state.
    #[must_use]
    pub fn status(&self) -> StoredSession {
        self.inner.store.load()
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.lock_slot().in_flight.is_some()
    }

    /// Return a usable access token, refreshing if none is cached or the
    /// cached one has passed its (buffered) expiry.
    ///
    /// # Errors
    ///
    /// Propagates the refresh failure; see [`Self::refresh_access_token`].
    pub async fn get_valid_access_token(&self) -> Result<String, NetworkError> {
        let seen = self.inner.lock_slot().completed;
        if let Some(token) = self.inner.cached_token() {
            return Ok(token);
        }
        self.join_or_start_refresh(Some(seen)).await
    }

    /// Refresh the access token, joining any refresh already in flight.
    ///
    /// # Errors
    ///
    /// [`NetworkError::AuthorizationFailed`] when no refresh token is stored;
    /// otherwise whatever the refresher returned. Both paths clear the
    /// session and broadcast expiry first.
    pub async fn refresh_access_token(&self) -> Result<String, NetworkError> {
        self.join_or_start_refresh(None).await
    }

    /// Clear the persisted session and broadcast expiry.
    pub fn handle_unauthorized(&self) {
        self.inner.handle_unauthorized();
    }

    /// Store a freshly issued grant (login).
    pub fn establish(&self, grant: &TokenGrant) {
        self.inner.persist(grant);
    }

    /// Clear the session without broadcasting (user-initiated logout).
    pub fn logout(&self) {
        self.inner.store.clear();
    }

    /// Await the refresh in flight, or start one.
    ///
    /// With `seen` set, a refresh that completed after the caller read the
    /// completion counter is reused rather than repeated.
    async fn join_or_start_refresh(&self, seen: Option<u64>) -> RefreshOutcome {
        let pending = {
            let mut slot = self.inner.lock_slot();
            if let Some(existing) = &slot.in_flight {
                tracing::debug!("joining in-flight token refresh");
                existing.clone()
            } else if let Some(outcome) = seen
                .filter(|&seen| seen != slot.completed)
                .and_then(|_| slot.last_outcome.clone())
            {
                tracing::debug!("reusing outcome of refresh that just completed");
                return outcome;
            } else {
                let started = self.spawn_refresh();
                slot.in_flight = Some(started.clone());
                started
            }
        };
        pending.await
    }

    fn spawn_refresh(&self) -> RefreshFuture {
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let mut finish = FinishRefresh {
                inner: &inner,
                outcome: None,
            };
            let outcome = inner.perform_refresh().await;
            finish.outcome = Some(outcome.clone());
            outcome
        });
        async move {
            task.await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "token refresh task did not complete");
                Err(NetworkError::AuthorizationFailed)
            })
        }
        .boxed()
        .shared()
    }
}

impl SessionInner {
    fn lock_slot(&self) -> MutexGuard<'_, RefreshSlot> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn cached_token(&self) -> Option<String> {
        let token = self.store.access_token()?;
        match self.store.expires_at() {
            Some(expires_at) if Utc::now() >= expires_at => {
                tracing::debug!(%expires_at, "cached access token expired");
                None
            }
            _ => Some(token),
        }
    }

    async fn perform_refresh(&self) -> Result<String, NetworkError> {
        let Some(refresh_token) = self.store.refresh_token() else {
            tracing::warn!("no refresh token available");
            self.handle_unauthorized();
            return Err(NetworkError::AuthorizationFailed);
        };

        tracing::info!("refreshing access token");
        match self.refresher.refresh(&refresh_token).await {
            Ok(grant) => {
                self.persist(&grant);
                Ok(grant.access_token)
            }
            Err(err) => {
                tracing::warn!(error = %err, code = err.code(), "token refresh failed");
                self.handle_unauthorized();
                Err(err)
            }
        }
    }

    fn persist(&self, grant: &TokenGrant) {
        let lifetime = i64::try_from(grant.expires_in)
            .unwrap_or(MAX_TOKEN_LIFETIME_SECS)
            .min(MAX_TOKEN_LIFETIME_SECS);
        let expires_at =
            Utc::now() + Duration::seconds(lifetime) - Duration::seconds(EXPIRY_SAFETY_BUFFER_SECS);
        self.store.save(
            &grant.access_token,
            grant.refresh_token.as_deref(),
            Some(expires_at),
        );
    }

    fn handle_unauthorized(&self) {
        tracing::warn!("handling unauthorized response - clearing session");
        self.store.clear();
        self.signal.notify_expired();
    }
}

/// Empties the refresh slot and records the outcome when the refresh task
/// finishes or is dropped. A task that never produced an outcome counts as
/// an authorization failure.
struct FinishRefresh<'a> {
    inner: &'a SessionInner,
    outcome: Option<RefreshOutcome>,
}

impl Drop for FinishRefresh<'_> {
    fn drop(&mut self) {
        let outcome = self
            .outcome
            .take()
            .unwrap_or(Err(NetworkError::AuthorizationFailed));
        let mut slot = self.inner.lock_slot();
        slot.in_flight = None;
        slot.completed += 1;
        slot.last_outcome = Some(outcome);
    }
}

// =============================================================================
// HTTP refresher
// =============================================================================

/// Posts the refresh token to the API and decodes a [`TokenGrant`].
pub struct HttpTokenRefresher {
    transport: Arc<dyn Transport>,
    base_url: String,
    path: String,
    decoder: ResponseDecoder,
}

impl HttpTokenRefresher {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            path: path.into(),
            decoder: ResponseDecoder::new(),
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, NetworkError> {
        let mut body = Map::new();
        body.insert(
            "refreshToken".to_string(),
            Value::String(refresh_token.to_string()),
        );
        let request = Endpoint::new(&self.base_url, &self.path)
            .with_method(HttpMethod::Post)
            .with_body(body)
            .resolve()
            .map_err(|_| NetworkError::BadRequest)?;

        let response = self.transport.execute(&request).await.map_err(|e| {
            tracing::warn!(error = %e, "refresh transport failure");
            NetworkError::NoData
        })?;

        if (200..300).contains(&response.status) {
            self.decoder.decode(&response.body)
        } else {
            tracing::warn!(status = response.status, "refresh rejected");
            Err(NetworkError::AuthorizationFailed)
        }
    }
}
