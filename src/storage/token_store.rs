//! Secure key-value storage for session tokens.
//!
//! Two interchangeable backends implement [`TokenStorage`]:
//! - [`KeyringStorage`]: the platform secret store via `keyring` (preferred).
//! - [`PreferenceStorage`]: a plain JSON preference file, or in-memory map
//!   (fallback and tests).
//!
//! Backend failures are logged and reported as "not found". Nothing here
//! returns an error to the caller.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::storage::paths::AppPaths;

/// Default keyring service name.
pub const DEFAULT_SERVICE: &str = "com.shopdir.auth";

/// Keyring account used to remember which keys this service has written.
const KEY_INDEX_ACCOUNT: &str = "__shopdir.keys";

/// Capability interface shared by all token backends.
pub trait TokenStorage: Send + Sync {
    fn store(&self, value: &str, key: &str);
    fn get(&self, key: &str) -> Option<String>;
    fn remove(&self, key: &str);
    fn remove_all(&self);
    fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Which backend to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Keyring,
    Preferences,
}

impl StorageKind {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "keyring" | "keychain" | "secure" => Some(Self::Keyring),
            "preferences" | "prefs" | "file" => Some(Self::Preferences),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Keyring => "keyring",
            Self::Preferences => "preferences",
        }
    }
}

/// Build the backend selected by `kind`.
#[must_use]
pub fn create_storage(kind: StorageKind, paths: &AppPaths) -> Arc<dyn TokenStorage> {
    match kind {
        StorageKind::Keyring => Arc::new(KeyringStorage::new(DEFAULT_SERVICE)),
        StorageKind::Preferences => Arc::new(PreferenceStorage::open(&paths.preferences_file())),
    }
}

// =============================================================================
// Keyring backend
// =============================================================================

/// Platform secret store, one entry per key under a fixed service name.
#[derive(Debug, Clone)]
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Option<keyring::Entry> {
        match keyring::Entry::new(&self.service, key) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::error!(key, error = %e, "failed to open keyring entry");
                None
            }
        }
    }

    fn read_index(&self) -> BTreeSet<String> {
        self.entry(KEY_INDEX_ACCOUNT)
            .and_then(|entry| entry.get_password().ok())
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn write_index(&self, index: &BTreeSet<String>) {
        let Some(entry) = self.entry(KEY_INDEX_ACCOUNT) else {
            return;
        };
        let result = if index.is_empty() {
            entry.delete_credential()
        } else {
            match serde_json::to_string(index) {
                Ok(raw) => entry.set_password(&raw),
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode keyring index");
                    return;
                }
            }
        };
        if let Err(e) = result {
            if !matches!(e, keyring::Error::NoEntry) {
                tracing::error!(error = %e, "failed to update keyring index");
            }
        }
    }
}

impl TokenStorage for KeyringStorage {
    fn store(&self, value: &str, key: &str) {
        let Some(entry) = self.entry(key) else {
            return;
        };
        if let Err(e) = entry.set_password(value) {
            tracing::error!(key, error = %e, "failed to store value in keyring");
            return;
        }
        let mut index = self.read_index();
        if index.insert(key.to_string()) {
            self.write_index(&index);
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.entry(key)?.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                tracing::error!(key, error = %e, "failed to read keyring entry");
                None
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(entry) = self.entry(key) {
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => tracing::error!(key, error = %e, "failed to remove keyring entry"),
            }
        }
        let mut index = self.read_index();
        if index.remove(key) {
            self.write_index(&index);
        }
    }

    fn remove_all(&self) {
        let index = self.read_index();
        for key in &index {
            if let Some(entry) = self.entry(key) {
                match entry.delete_credential() {
                    Ok(()) | Err(keyring::Error::NoEntry) => {}
                    Err(e) => tracing::error!(key, error = %e, "failed to remove keyring entry"),
                }
            }
        }
        self.write_index(&BTreeSet::new());
    }
}

// =============================================================================
// Preference backend
// =============================================================================

/// Plain key-value preferences, optionally persisted to a JSON file.
#[derive(Debug)]
pub struct PreferenceStorage {
    values: Mutex<BTreeMap<String, String>>,
    path: Option<PathBuf>,
}

impl PreferenceStorage {
    /// Load from file, or start empty if the file is missing or unreadable.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        let values = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt preference file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to read preference file");
                BTreeMap::new()
            }
        };
        Self {
            values: Mutex::new(values),
            path: Some(path.to_path_buf()),
        }
    }

    /// Create an empty store that never touches disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            values: Mutex::new(BTreeMap::new()),
            path: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Persist while holding the lock so concurrent writers cannot interleave.
    fn persist(&self, values: &BTreeMap<String, String>) {
        let Some(path) = &self.path else {
            return;
        };
        let result = serde_json::to_vec_pretty(values)
            .map_err(std::io::Error::other)
            .and_then(|content| write_atomic(path, &content));
        if let Err(e) = result {
            tracing::error!(path = %path.display(), error = %e, "failed to write preference file");
        }
    }
}

impl TokenStorage for PreferenceStorage {
    fn store(&self, value: &str, key: &str) {
        let mut values = self.lock();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }

    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn remove(&self, key: &str) {
        let mut values = self.lock();
        if values.remove(key).is_some() {
            self.persist(&values);
        }
    }

    fn remove_all(&self) {
        let mut values = self.lock();
        values.clear();
        self.persist(&values);
    }

    fn exists(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }
}

/// Write bytes atomically using temp file + rename.
fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("preferences"),
        std::process::id()
    ));

    {
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
    }

    std::fs::rename(&temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_round_trip() {
        let storage = PreferenceStorage::in_memory();
        assert!(!storage.exists("a"));
        storage.store("1", "a");
        assert_eq!(storage.get("a").as_deref(), Some("1"));
        assert!(storage.exists("a"));
        storage.remove("a");
        assert_eq!(storage.get("a"), None);
    }

    #[test]
    fn remove_all_clears_every_key() {
        let storage = PreferenceStorage::in_memory();
        storage.store("1", "a");
        storage.store("2", "b");
        storage.remove_all();
        assert!(!storage.exists("a"));
        assert!(!storage.exists("b"));
    }

    #[test]
    fn file_backend_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/preferences.json");

        PreferenceStorage::open(&path).store("token", "shopdir.accessToken");

        let reopened = PreferenceStorage::open(&path);
        assert_eq!(
            reopened.get("shopdir.accessToken").as_deref(),
            Some("token")
        );
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{ not json").unwrap();

        let storage = PreferenceStorage::open(&path);
        assert_eq!(storage.get("anything"), None);
        storage.store("v", "k");
        assert_eq!(PreferenceStorage::open(&path).get("k").as_deref(), Some("v"));
    }

    #[test]
    fn storage_kind_parsing() {
        assert_eq!(StorageKind::from_arg("Keychain"), Some(StorageKind::Keyring));
        assert_eq!(StorageKind::from_arg(" prefs "), Some(StorageKind::Preferences));
        assert_eq!(StorageKind::from_arg("vault"), None);
        assert_eq!(StorageKind::default().as_str(), "keyring");
    }

    #[test]
    fn factory_builds_preference_backend() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::rooted_at(dir.path());
        let storage = create_storage(StorageKind::Preferences, &paths);
        storage.store("x", "k");
        assert!(paths.preferences_file().exists());
        assert!(storage.exists("k"));
    }
}
