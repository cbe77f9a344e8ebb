//! Diagnostic logging.
//!
//! Everything is emitted through `tracing` and written to stderr (or a log
//! file) so stdout stays clean for command output. `SHOPDIR_LOG`,
//! `SHOPDIR_LOG_FORMAT` and `SHOPDIR_LOG_FILE` override the CLI settings;
//! `RUST_LOG` replaces the filter entirely.

use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_LEVEL_ENV: &str = "SHOPDIR_LOG";
pub const LOG_FORMAT_ENV: &str = "SHOPDIR_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "SHOPDIR_LOG_FILE";

/// Target of request/response diagnostics.
const CLIENT_TARGET: &str = "shopdir::core::client";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable logs.
    #[default]
    Human,
    /// JSON logs (one event per line).
    Json,
    /// Compact logs (single line, terse).
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "human" | "pretty" => Some(Self::Human),
            "json" | "jsonl" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Log level from CLI argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    #[default]
    Error,
}

impl LogLevel {
    /// Parse from CLI argument.
    #[must_use]
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "verbose" | "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" | "critical" => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub const fn as_tracing_level(self) -> Level {
        match self {
            Self::Trace => Level::TRACE,
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Level from `SHOPDIR_LOG`.
#[must_use]
pub fn parse_log_level_from_env() -> Option<LogLevel> {
    non_empty_env(LOG_LEVEL_ENV).and_then(|v| LogLevel::from_arg(&v))
}

/// Format from `SHOPDIR_LOG_FORMAT`.
#[must_use]
pub fn parse_log_format_from_env() -> Option<LogFormat> {
    non_empty_env(LOG_FORMAT_ENV).and_then(|v| LogFormat::from_arg(&v))
}

/// File from `SHOPDIR_LOG_FILE`.
#[must_use]
pub fn parse_log_file_from_env() -> Option<PathBuf> {
    non_empty_env(LOG_FILE_ENV).map(PathBuf::from)
}

/// Filter directive for the crate at `level`.
///
/// `verbose` raises the default error level to debug. `network_logging`
/// always lets request/response diagnostics through.
#[must_use]
pub fn filter_directive(level: LogLevel, verbose: bool, network_logging: bool) -> String {
    let level = if verbose && level == LogLevel::Error {
        LogLevel::Debug
    } else {
        level
    };
    let mut directive = format!("shopdir={}", level.as_filter());
    if network_logging && level.as_tracing_level() < Level::DEBUG {
        directive.push_str(&format!(",{CLIENT_TARGET}=debug"));
    }
    directive
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(
    level: LogLevel,
    format: LogFormat,
    log_file: Option<PathBuf>,
    verbose: bool,
    network_logging: bool,
) {
    let level = parse_log_level_from_env().unwrap_or(level);
    let format = parse_log_format_from_env().unwrap_or(format);
    let log_file = parse_log_file_from_env().or(log_file);

    let file = log_file.and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()
    });
    let writer = file.map_or_else(|| BoxMakeWriter::new(std::io::stderr), BoxMakeWriter::new);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level, verbose, network_logging)));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(writer)
                .with_span_events(FmtSpan::CLOSE)
                .try_init()
                .ok();
        }
        LogFormat::Compact => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .compact()
                .with_writer(writer)
                .with_target(true)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_target(false)
                .without_time()
                .try_init()
                .ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[allow(unsafe_code)]
    fn with_env_var(key: &str, value: &str, f: impl FnOnce()) {
        let _guard = ENV_LOCK.lock().unwrap();
        let prior = std::env::var(key).ok();
        unsafe {
            std::env::set_var(key, value);
        }
        f();
        match prior {
            Some(val) => unsafe {
                std::env::set_var(key, val);
            },
            None => unsafe {
                std::env::remove_var(key);
            },
        }
    }

    #[test]
    fn env_var_log_level_parsing() {
        with_env_var(LOG_LEVEL_ENV, "trace", || {
            assert_eq!(parse_log_level_from_env(), Some(LogLevel::Trace));
        });
        with_env_var(LOG_LEVEL_ENV, "  ", || {
            assert_eq!(parse_log_level_from_env(), None);
        });
    }

    #[test]
    fn env_var_log_format_parsing() {
        with_env_var(LOG_FORMAT_ENV, "JSON", || {
            assert_eq!(parse_log_format_from_env(), Some(LogFormat::Json));
        });
    }

    #[test]
    fn directive_defaults_to_error() {
        assert_eq!(filter_directive(LogLevel::Error, false, false), "shopdir=error");
    }

    #[test]
    fn verbose_raises_default_level() {
        assert_eq!(filter_directive(LogLevel::Error, true, false), "shopdir=debug");
        assert_eq!(filter_directive(LogLevel::Warn, true, false), "shopdir=warn");
    }

    #[test]
    fn network_logging_enables_client_diagnostics() {
        assert_eq!(
            filter_directive(LogLevel::Warn, false, true),
            "shopdir=warn,shopdir::core::client=debug"
        );
        assert_eq!(filter_directive(LogLevel::Trace, false, true), "shopdir=trace");
    }
}
