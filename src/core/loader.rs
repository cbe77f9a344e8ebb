//! Cache-first loading.
//!
//! Serve the persisted snapshot immediately, then refresh from the network
//! when connectivity allows. Fresh data is written through to the cache;
//! network failures are swallowed while anything is on display.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::core::connectivity::ConnectivityMonitor;
use crate::error::NetworkError;
use crate::storage::cache::SnapshotRepository;

/// Something that can fetch a fresh `T` from the API.
#[async_trait]
pub trait RemoteSource<T>: Send + Sync {
    async fn fetch(&self) -> Result<T, NetworkError>;
}

/// Where the currently surfaced data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Cache,
    Network,
}

/// Observable loader state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadState<T> {
    pub data: Option<T>,
    pub origin: Option<DataOrigin>,
    /// When the cached snapshot was written, if `origin` is the cache.
    pub cached_at: Option<DateTime<Utc>>,
    pub error: Option<NetworkError>,
    pub loading: bool,
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        Self {
            data: None,
            origin: None,
            cached_at: None,
            error: None,
            loading: false,
        }
    }
}

impl<T> LoadState<T> {
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// Runs the cache-then-network load and publishes each step.
pub struct CacheFirstLoader<T> {
    cache: Arc<dyn SnapshotRepository<T>>,
    remote: Arc<dyn RemoteSource<T>>,
    connectivity: ConnectivityMonitor,
    state: watch::Sender<LoadState<T>>,
}

impl<T> CacheFirstLoader<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(
        cache: Arc<dyn SnapshotRepository<T>>,
        remote: Arc<dyn RemoteSource<T>>,
        connectivity: ConnectivityMonitor,
    ) -> Self {
        let (state, _) = watch::channel(LoadState::default());
        Self {
            cache,
            remote,
            connectivity,
            state,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoadState<T>> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> LoadState<T> {
        self.state.borrow().clone()
    }

    /// Load and return the final state.
    ///
    /// 1. Surface the cached snapshot, if any.
    /// 2. Offline: stop. With nothing on display, surface
    ///    [`NetworkError::NoInternetConnection`].
    /// 3. Online: fetch. On success save (best effort) and surface the fresh
    ///    value. On failure surface the error only if nothing is on display.
    pub async fn load(&self) -> LoadState<T> {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        if let Some(cached) = self.cache.fetch_cached() {
            let cached_at = self.cache.last_updated();
            tracing::debug!(?cached_at, "surfacing cached snapshot");
            self.state.send_modify(|s| {
                s.data = Some(cached);
                s.origin = Some(DataOrigin::Cache);
                s.cached_at = cached_at;
            });
        }

        if !self.connectivity.is_connected() {
            tracing::info!("offline, serving cache only");
            self.state.send_modify(|s| {
                s.loading = false;
                if s.data.is_none() {
                    s.error = Some(NetworkError::NoInternetConnection);
                }
            });
            return self.state();
        }

        match self.remote.fetch().await {
            Ok(fresh) => {
                if let Err(e) = self.cache.save(&fresh) {
                    tracing::warn!(error = %e, "failed to write snapshot cache");
                }
                self.state.send_modify(|s| {
                    s.data = Some(fresh);
                    s.origin = Some(DataOrigin::Network);
                    s.cached_at = None;
                    s.loading = false;
                });
            }
            Err(err) => {
                self.state.send_modify(|s| {
                    s.loading = false;
                    if s.data.is_some() {
                        tracing::info!(error = %err, "network refresh failed, keeping displayed data");
                    } else {
                        tracing::warn!(error = %err, "load failed with no cached data");
                        s.error = Some(err);
                        s.origin = None;
                    }
                });
            }
        }
        self.state()
    }
}
