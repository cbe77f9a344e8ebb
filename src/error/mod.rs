//! Error types for shopdir.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! Two layers:
//! - [`NetworkError`]: the closed set returned by the network client and the
//!   session manager. Never carries payload detail.
//! - [`ShopError`]: the crate-wide error for storage, configuration, and the
//!   CLI. Wraps `NetworkError` when a request failure needs to reach `main`.
//!
//! Each `ShopError` has a stable error code (e.g., `SHOP-N002`) for
//! programmatic handling.

pub mod network;

use thiserror::Error;

pub use network::NetworkError;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Session or token issues.
    Authentication,
    /// Transport, status, decoding, or reachability issues.
    Network,
    /// Config file parsing, validation, or missing values.
    Configuration,
    /// Local cache, history, or token storage issues.
    Storage,
    /// Internal errors (bugs, unexpected state, unclassified).
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Authentication => "Authentication error",
            Self::Network => "Network error",
            Self::Configuration => "Configuration error",
            Self::Storage => "Storage error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Authentication => "A",
            Self::Network => "N",
            Self::Configuration => "C",
            Self::Storage => "S",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Parse/format errors, invalid configuration
    ParseError = 3,
    /// Timeout or no connectivity
    Timeout = 4,
    /// Session expired or authorization refused
    AuthError = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

impl From<ExitCode> for u8 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(u8::from(code))
    }
}

/// Main error type for shopdir operations.
#[derive(Error, Debug)]
pub enum ShopError {
    /// Generic configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Error parsing the configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    /// Local database failure (cache or history).
    #[error("storage error: {0}")]
    Storage(String),

    /// No cached data and no way to fetch fresh data.
    #[error("no data available: {0}")]
    NoData(#[from] NetworkError),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for ShopError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl ShopError {
    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::NoData(err) => match err {
                NetworkError::AuthorizationFailed => ExitCode::AuthError,
                NetworkError::Timeout | NetworkError::NoInternetConnection => ExitCode::Timeout,
                _ => ExitCode::GeneralError,
            },
            Self::Config(_) | Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => {
                ExitCode::ParseError
            }
            Self::Storage(_) | Self::Io(_) | Self::Json(_) | Self::Other(_) => {
                ExitCode::GeneralError
            }
        }
    }

    /// Returns the error category for classification and routing.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NoData(NetworkError::AuthorizationFailed) => ErrorCategory::Authentication,
            Self::NoData(_) => ErrorCategory::Network,
            Self::Config(_) | Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => {
                ErrorCategory::Configuration
            }
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `SHOP-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoData(NetworkError::AuthorizationFailed) => "SHOP-A002",
            Self::NoData(_) => "SHOP-N002",
            Self::ConfigParse { .. } => "SHOP-C001",
            Self::ConfigInvalid { .. } => "SHOP-C002",
            Self::Config(_) => "SHOP-C003",
            Self::Storage(_) => "SHOP-S001",
            Self::Io(_) => "SHOP-X001",
            Self::Json(_) => "SHOP-X002",
            Self::Other(_) => "SHOP-X099",
        }
    }
}

/// Result type alias for shopdir operations.
pub type Result<T> = std::result::Result<T, ShopError>;
