//! Wiring shared by the commands: paths, config, storage, and the client.

use std::sync::Arc;

use crate::core::auth::{AuthSessionManager, HttpTokenRefresher, SessionSignal};
use crate::core::client::NetworkClient;
use crate::core::connectivity::{ConnectivityMonitor, DEFAULT_PROBE_TIMEOUT, probe_address};
use crate::core::home::HomeService;
use crate::core::loader::CacheFirstLoader;
use crate::core::models::HomeResponse;
use crate::core::transport::{ReqwestTransport, Transport};
use crate::error::{Result, ShopError};
use crate::storage::cache::SqliteSnapshotRepository;
use crate::storage::config::{ConfigOverrides, NetworkConfig};
use crate::storage::db::Database;
use crate::storage::history::SearchHistoryStore;
use crate::storage::paths::AppPaths;
use crate::storage::session::SessionStore;
use crate::storage::token_store::create_storage;

/// Everything a command needs, built once per invocation.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub paths: AppPaths,
    pub config: NetworkConfig,
    pub auth: AuthSessionManager,
    pub client: NetworkClient,
}

impl AppContext {
    /// Resolve config and assemble the session manager and network client.
    ///
    /// # Errors
    /// Returns an error if the config file is invalid or the HTTP client
    /// cannot be built.
    pub fn build(overrides: &ConfigOverrides) -> Result<Self> {
        let paths = AppPaths::new();
        let config = NetworkConfig::resolve(overrides, &paths)?;
        Self::from_config(paths, config)
    }

    /// Assemble the context from an already resolved config.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(paths: AppPaths, config: NetworkConfig) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(
            ReqwestTransport::new(config.request_timeout)
                .map_err(|e| ShopError::Config(format!("cannot build HTTP client: {e}")))?,
        );
        let store = SessionStore::new(create_storage(config.token_backend, &paths));
        let refresher = HttpTokenRefresher::new(
            Arc::clone(&transport),
            config.base_url.clone(),
            config.refresh_path.clone(),
        );
        let auth = AuthSessionManager::new(store, Arc::new(refresher), SessionSignal::new());
        let client = NetworkClient::new(transport)
            .with_auth(auth.clone())
            .with_logging(config.logging_enabled);

        Ok(Self {
            paths,
            config,
            auth,
            client,
        })
    }

    /// Open the local database, creating directories as needed.
    ///
    /// # Errors
    /// Returns an error if the directory or database cannot be created.
    pub fn database(&self) -> Result<Database> {
        self.paths.ensure_dirs()?;
        Database::open(&self.paths.database_file())
    }

    #[must_use]
    pub fn history_store(&self, db: Database) -> SearchHistoryStore {
        SearchHistoryStore::new(db, self.config.history_limit)
    }

    /// Probe the API host once unless `offline` is set.
    pub async fn connectivity(&self, offline: bool) -> ConnectivityMonitor {
        if offline {
            return ConnectivityMonitor::with_state(false);
        }
        let monitor = ConnectivityMonitor::new();
        if let Some(addr) = probe_address(&self.config.base_url) {
            monitor.probe_once(&addr, DEFAULT_PROBE_TIMEOUT).await;
        }
        monitor
    }

    /// Cache-first loader for the home document.
    pub async fn home_loader(&self, db: Database, offline: bool) -> CacheFirstLoader<HomeResponse> {
        let service = HomeService::new(self.client.clone(), self.config.base_url.clone());
        CacheFirstLoader::new(
            Arc::new(SqliteSnapshotRepository::home(db)),
            Arc::new(service),
            self.connectivity(offline).await,
        )
    }
}
