//! Network configuration.
//!
//! Loads the optional config file from:
//! - Linux: `~/.config/shopdir/config.toml`
//! - macOS: `~/Library/Application Support/com.shopdir.shopdir/config.toml`
//! - Windows: `%APPDATA%/shopdir/shopdir/config/config.toml`
//!
//! ## Precedence
//!
//! Every field is resolved first-match-wins (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Build-time value (`SHOPDIR_BUILD_BASE_URL`, base URL only)
//! 5. Built-in defaults
//!
//! A base URL candidate that fails validation is skipped with a warning and
//! the next source is tried.
//!
//! ## Environment Variables
//!
//! - `SHOPDIR_API_BASE_URL`: API base URL
//! - `SHOPDIR_REQUEST_TIMEOUT`: request timeout in seconds
//! - `SHOPDIR_MAX_RETRY_ATTEMPTS`: retry budget handed to the transport
//! - `SHOPDIR_ENABLE_LOGGING`: request/response diagnostics (1, true, yes, on)
//! - `SHOPDIR_TOKEN_BACKEND`: `keyring` or `preferences`
//! - `SHOPDIR_CONFIG`: override config file path

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use super::AppPaths;
use crate::error::{Result, ShopError};
use crate::storage::history::DEFAULT_HISTORY_LIMIT;
use crate::storage::token_store::StorageKind;

// =============================================================================
// Environment Variable Names
// =============================================================================

pub const ENV_BASE_URL: &str = "SHOPDIR_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT: &str = "SHOPDIR_REQUEST_TIMEOUT";
pub const ENV_MAX_RETRY_ATTEMPTS: &str = "SHOPDIR_MAX_RETRY_ATTEMPTS";
pub const ENV_ENABLE_LOGGING: &str = "SHOPDIR_ENABLE_LOGGING";
pub const ENV_TOKEN_BACKEND: &str = "SHOPDIR_TOKEN_BACKEND";
pub const ENV_CONFIG: &str = "SHOPDIR_CONFIG";

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_BASE_URL: &str = "http://185.204.197.213:5906";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Base URL baked in at compile time, if any.
const BUILD_BASE_URL: Option<&str> = option_env!("SHOPDIR_BUILD_BASE_URL");

static DOMAIN_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .ok()
});

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Value compiled into the binary.
    Build,
    /// Built-in default.
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Build => write!(f, "build configuration"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Source of each resolved field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigSources {
    pub base_url: ConfigSource,
    pub request_timeout: ConfigSource,
    pub max_retry_attempts: ConfigSource,
    pub logging_enabled: ConfigSource,
    pub refresh_path: ConfigSource,
    pub token_backend: ConfigSource,
    pub history_limit: ConfigSource,
    pub search_debounce: ConfigSource,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub logging_enabled: Option<bool>,
    pub token_backend: Option<StorageKind>,
}

/// Immutable configuration, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    pub base_url: String,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    pub max_retry_attempts: u32,
    pub logging_enabled: bool,
    pub refresh_path: String,
    pub token_backend: StorageKind,
    pub history_limit: usize,
    #[serde(with = "duration_millis")]
    pub search_debounce: Duration,
    /// File the file-level values were read from, if it existed.
    pub config_file: Option<PathBuf>,
    pub sources: ConfigSources,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            logging_enabled: false,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            token_backend: StorageKind::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            config_file: None,
            sources: ConfigSources::default(),
        }
    }
}

impl NetworkConfig {
    /// Resolve from CLI overrides, the process environment, and the config
    /// file (respecting `SHOPDIR_CONFIG`).
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// holds invalid values.
    pub fn resolve(overrides: &ConfigOverrides, paths: &AppPaths) -> Result<Self> {
        let path = std::env::var(ENV_CONFIG)
            .map_or_else(|_| paths.config_file(), PathBuf::from);
        let file = ConfigFile::load_from(&path)?;
        file.validate()?;
        let config_file = path.exists().then_some(path);

        let mut config = Self::resolve_with(overrides, &file, |key| std::env::var(key).ok());
        config.config_file = config_file;
        tracing::info!(
            base_url = %config.base_url,
            timeout_secs = config.request_timeout.as_secs(),
            retries = config.max_retry_attempts,
            logging = config.logging_enabled,
            "network configuration loaded"
        );
        Ok(config)
    }

    /// Resolve with an explicit environment lookup.
    #[must_use]
    pub fn resolve_with<F>(overrides: &ConfigOverrides, file: &ConfigFile, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut sources = ConfigSources::default();

        let base_url = Self::resolve_base_url(overrides, file, &env, &mut sources.base_url);

        let request_timeout = first_match(
            &mut sources.request_timeout,
            [
                (ConfigSource::Cli, overrides.request_timeout_secs),
                (
                    ConfigSource::Env,
                    env(ENV_REQUEST_TIMEOUT).and_then(|v| parse_env(ENV_REQUEST_TIMEOUT, &v)),
                ),
                (ConfigSource::ConfigFile, file.network.request_timeout_seconds),
            ],
        )
        .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs)
        .max(MIN_REQUEST_TIMEOUT);

        let max_retry_attempts = first_match(
            &mut sources.max_retry_attempts,
            [
                (
                    ConfigSource::Env,
                    env(ENV_MAX_RETRY_ATTEMPTS).and_then(|v| parse_env(ENV_MAX_RETRY_ATTEMPTS, &v)),
                ),
                (ConfigSource::ConfigFile, file.network.max_retry_attempts),
            ],
        )
        .unwrap_or(DEFAULT_MAX_RETRY_ATTEMPTS);

        let logging_enabled = first_match(
            &mut sources.logging_enabled,
            [
                (ConfigSource::Cli, overrides.logging_enabled),
                (ConfigSource::Env, env(ENV_ENABLE_LOGGING).and_then(|v| parse_bool(&v))),
                (ConfigSource::ConfigFile, file.network.logging_enabled),
            ],
        )
        .unwrap_or(false);

        let refresh_path = first_match(
            &mut sources.refresh_path,
            [(ConfigSource::ConfigFile, file.network.refresh_path.clone())],
        )
        .unwrap_or_else(|| DEFAULT_REFRESH_PATH.to_string());

        let token_backend = first_match(
            &mut sources.token_backend,
            [
                (ConfigSource::Cli, overrides.token_backend),
                (
                    ConfigSource::Env,
                    env(ENV_TOKEN_BACKEND).and_then(|v| {
                        let kind = StorageKind::from_arg(&v);
                        if kind.is_none() {
                            tracing::warn!(var = ENV_TOKEN_BACKEND, value = %v, "ignoring unknown token backend");
                        }
                        kind
                    }),
                ),
                (
                    ConfigSource::ConfigFile,
                    file.storage.token_backend.as_deref().and_then(StorageKind::from_arg),
                ),
            ],
        )
        .unwrap_or_default();

        let history_limit = first_match(
            &mut sources.history_limit,
            [(ConfigSource::ConfigFile, file.storage.history_limit)],
        )
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .max(1);

        let search_debounce = first_match(
            &mut sources.search_debounce,
            [(ConfigSource::ConfigFile, file.search.debounce_ms)],
        )
        .map_or(DEFAULT_SEARCH_DEBOUNCE, Duration::from_millis);

        Self {
            base_url,
            request_timeout,
            max_retry_attempts,
            logging_enabled,
            refresh_path,
            token_backend,
            history_limit,
            search_debounce,
            config_file: None,
            sources,
        }
    }

    fn resolve_base_url<F>(
        overrides: &ConfigOverrides,
        file: &ConfigFile,
        env: &F,
        source: &mut ConfigSource,
    ) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let candidates = [
            (ConfigSource::Cli, overrides.base_url.clone()),
            (ConfigSource::Env, env(ENV_BASE_URL)),
            (ConfigSource::ConfigFile, file.network.base_url.clone()),
            (ConfigSource::Build, BUILD_BASE_URL.map(str::to_string)),
        ];

        for (origin, candidate) in candidates {
            let Some(raw) = candidate else {
                continue;
            };
            match validate_base_url(&raw) {
                Some(url) => {
                    *source = origin;
                    return url;
                }
                None => tracing::warn!(source = %origin, value = %raw, "ignoring invalid base URL"),
            }
        }

        *source = ConfigSource::Default;
        DEFAULT_BASE_URL.to_string()
    }
}

/// Take the first present value and record where it came from.
fn first_match<T, const N: usize>(
    source: &mut ConfigSource,
    candidates: [(ConfigSource, Option<T>); N],
) -> Option<T> {
    for (origin, value) in candidates {
        if let Some(value) = value {
            *source = origin;
            return Some(value);
        }
    }
    *source = ConfigSource::Default;
    None
}

fn parse_env<T: std::str::FromStr>(var: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!(var, value, "ignoring unparseable environment value");
    }
    parsed
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validate a base URL candidate and return it trimmed.
///
/// Requires an `http`/`https` scheme and a host that is `localhost`, an IP
/// literal, or a well-formed DNS name.
#[must_use]
pub fn validate_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        if trimmed.starts_with("http:") || trimmed.starts_with("https:") {
            tracing::error!(url = trimmed, "base URL appears truncated");
        }
        return None;
    }

    let url = Url::parse(trimmed).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let valid_host = match url.host()? {
        Host::Ipv4(_) | Host::Ipv6(_) => true,
        Host::Domain(domain) => {
            domain == "localhost"
                || DOMAIN_RE.as_ref().is_some_and(|re| re.is_match(domain))
        }
    };
    valid_host.then(|| trimmed.to_string())
}

// =============================================================================
// Config file
// =============================================================================

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub network: NetworkSection,
    pub storage: StorageSection,
    pub search: SearchSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    pub base_url: Option<String>,
    pub request_timeout_seconds: Option<u64>,
    pub max_retry_attempts: Option<u32>,
    pub logging_enabled: Option<bool>,
    pub refresh_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub token_backend: Option<String>,
    pub history_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub debounce_ms: Option<u64>,
}

impl ConfigFile {
    /// Load from `path`. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ShopError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Write to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ShopError::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)?;
        tracing::debug!(?path, "Config file saved");
        Ok(())
    }

    /// Check values that cannot be skipped silently.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::ConfigInvalid`] for an unknown token backend, a
    /// zero timeout, or a refresh path not starting with `/`.
    pub fn validate(&self) -> Result<()> {
        if let Some(backend) = &self.storage.token_backend {
            if StorageKind::from_arg(backend).is_none() {
                return Err(ShopError::ConfigInvalid {
                    key: "storage.token_backend".to_string(),
                    value: backend.clone(),
                    message: "expected keyring or preferences".to_string(),
                });
            }
        }
        if self.network.request_timeout_seconds == Some(0) {
            return Err(ShopError::ConfigInvalid {
                key: "network.request_timeout_seconds".to_string(),
                value: "0".to_string(),
                message: "timeout must be positive".to_string(),
            });
        }
        if let Some(path) = &self.network.refresh_path {
            if !path.starts_with('/') {
                return Err(ShopError::ConfigInvalid {
                    key: "network.refresh_path".to_string(),
                    value: path.clone(),
                    message: "path must start with '/'".to_string(),
                });
            }
        }
        Ok(())
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI flag");
        assert_eq!(ConfigSource::Build.to_string(), "build configuration");
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config =
            NetworkConfig::resolve_with(&ConfigOverrides::default(), &ConfigFile::default(), no_env);

        if BUILD_BASE_URL.is_none() {
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
            assert_eq!(config.sources.base_url, ConfigSource::Default);
        }
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.max_retry_attempts, 3);
        assert!(!config.logging_enabled);
        assert_eq!(config.refresh_path, "/auth/refresh");
        assert_eq!(config.token_backend, StorageKind::Keyring);
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert_eq!(config.sources.request_timeout, ConfigSource::Default);
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let mut file = ConfigFile::default();
        file.network.base_url = Some("https://file.example.com".to_string());
        file.network.request_timeout_seconds = Some(40);
        let env = env_of(&[
            (ENV_BASE_URL, "https://env.example.com"),
            (ENV_REQUEST_TIMEOUT, "50"),
        ]);
        let overrides = ConfigOverrides {
            base_url: Some("https://cli.example.com".to_string()),
            ..ConfigOverrides::default()
        };

        let config = NetworkConfig::resolve_with(&overrides, &file, &env);

        assert_eq!(config.base_url, "https://cli.example.com");
        assert_eq!(config.sources.base_url, ConfigSource::Cli);
        assert_eq!(config.request_timeout, Duration::from_secs(50));
        assert_eq!(config.sources.request_timeout, ConfigSource::Env);

        let config = NetworkConfig::resolve_with(&ConfigOverrides::default(), &file, no_env);
        assert_eq!(config.base_url, "https://file.example.com");
        assert_eq!(config.sources.base_url, ConfigSource::ConfigFile);
        assert_eq!(config.request_timeout, Duration::from_secs(40));
    }

    #[test]
    fn invalid_base_url_falls_through_to_next_source() {
        let mut file = ConfigFile::default();
        file.network.base_url = Some("https://file.example.com/".to_string());
        let env = env_of(&[(ENV_BASE_URL, "api.example.com")]);

        let config = NetworkConfig::resolve_with(&ConfigOverrides::default(), &file, env);

        assert_eq!(config.base_url, "https://file.example.com/");
        assert_eq!(config.sources.base_url, ConfigSource::ConfigFile);
    }

    #[test]
    fn timeout_is_clamped_to_minimum() {
        let env = env_of(&[(ENV_REQUEST_TIMEOUT, "1")]);
        let config = NetworkConfig::resolve_with(&ConfigOverrides::default(), &ConfigFile::default(), env);
        assert_eq!(config.request_timeout, MIN_REQUEST_TIMEOUT);
    }

    #[test]
    fn unparseable_env_values_are_skipped() {
        let env = env_of(&[
            (ENV_REQUEST_TIMEOUT, "soon"),
            (ENV_MAX_RETRY_ATTEMPTS, "many"),
            (ENV_ENABLE_LOGGING, "maybe"),
            (ENV_TOKEN_BACKEND, "vault"),
        ]);
        let config = NetworkConfig::resolve_with(&ConfigOverrides::default(), &ConfigFile::default(), env);

        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.max_retry_attempts, DEFAULT_MAX_RETRY_ATTEMPTS);
        assert!(!config.logging_enabled);
        assert_eq!(config.token_backend, StorageKind::Keyring);
        assert_eq!(config.sources.logging_enabled, ConfigSource::Default);
    }

    #[test]
    fn env_flags_parse() {
        let env = env_of(&[
            (ENV_ENABLE_LOGGING, "YES"),
            (ENV_MAX_RETRY_ATTEMPTS, "5"),
            (ENV_TOKEN_BACKEND, "preferences"),
        ]);
        let config = NetworkConfig::resolve_with(&ConfigOverrides::default(), &ConfigFile::default(), env);

        assert!(config.logging_enabled);
        assert_eq!(config.max_retry_attempts, 5);
        assert_eq!(config.token_backend, StorageKind::Preferences);
        assert_eq!(config.sources.token_backend, ConfigSource::Env);
    }

    #[test]
    fn base_url_validation() {
        assert!(validate_base_url("https://api.x.com").is_some());
        assert!(validate_base_url("  http://localhost:8080  ").is_some());
        assert!(validate_base_url("http://185.204.197.213:5906").is_some());
        assert!(validate_base_url("http://[::1]:3000").is_some());
        assert!(validate_base_url("https://my-api.example.co.uk/v1").is_some());

        assert!(validate_base_url("").is_none());
        assert!(validate_base_url("   ").is_none());
        assert!(validate_base_url("api.x.com").is_none());
        assert!(validate_base_url("ftp://api.x.com").is_none());
        assert!(validate_base_url("http:api.x.com").is_none());
        assert!(validate_base_url("https://-bad-.com").is_none());
        assert!(validate_base_url("https://under_score.com").is_none());
    }

    #[test]
    fn load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn load_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[network]
base_url = "https://shop.example.com"
request_timeout_seconds = 12
logging_enabled = true

[storage]
token_backend = "preferences"
history_limit = 5

[search]
debounce_ms = 150
"#,
        )
        .unwrap();

        let file = ConfigFile::load_from(&path).unwrap();
        file.validate().unwrap();
        let config = NetworkConfig::resolve_with(&ConfigOverrides::default(), &file, no_env);

        assert_eq!(config.base_url, "https://shop.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(12));
        assert!(config.logging_enabled);
        assert_eq!(config.token_backend, StorageKind::Preferences);
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.search_debounce, Duration::from_millis(150));
        assert_eq!(config.sources.history_limit, ConfigSource::ConfigFile);
    }

    #[test]
    fn load_invalid_toml_returns_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[network\nbase_url = 1").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(err, ShopError::ConfigParse { .. }));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut file = ConfigFile::default();
        file.storage.token_backend = Some("vault".to_string());
        assert!(matches!(file.validate(), Err(ShopError::ConfigInvalid { .. })));

        let mut file = ConfigFile::default();
        file.network.request_timeout_seconds = Some(0);
        assert!(file.validate().is_err());

        let mut file = ConfigFile::default();
        file.network.refresh_path = Some("auth/refresh".to_string());
        assert!(file.validate().is_err());
    }

    #[test]
    fn roundtrip_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut file = ConfigFile::default();
        file.network.max_retry_attempts = Some(7);
        file.search.debounce_ms = Some(500);

        file.save_to(&path).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), file);
    }

    #[test]
    fn resolved_config_serializes_sources() {
        let config =
            NetworkConfig::resolve_with(&ConfigOverrides::default(), &ConfigFile::default(), no_env);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["request_timeout"], 30);
        assert_eq!(json["search_debounce"], 300);
        assert_eq!(json["sources"]["request_timeout"], "default");
    }
}
