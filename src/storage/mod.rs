//! Storage for configuration, tokens, the home snapshot, and search history.

pub mod cache;
pub mod config;
pub mod db;
pub mod history;
pub mod paths;
pub mod schema;
pub mod session;
pub mod token_store;

pub use cache::{HOME_SNAPSHOT_ID, SnapshotRepository, SqliteSnapshotRepository};
pub use config::{
    ConfigFile, ConfigOverrides, ConfigSource, ConfigSources, ENV_BASE_URL, ENV_CONFIG,
    ENV_ENABLE_LOGGING, ENV_MAX_RETRY_ATTEMPTS, ENV_REQUEST_TIMEOUT, ENV_TOKEN_BACKEND,
    NetworkConfig,
};
pub use db::Database;
pub use history::{
    DEFAULT_HISTORY_LIMIT, SearchHistoryEntry, SearchHistoryRepository, SearchHistoryStore,
};
pub use paths::AppPaths;
pub use schema::run_migrations;
pub use session::{SessionStore, StoredSession};
pub use token_store::{StorageKind, TokenStorage, create_storage};
