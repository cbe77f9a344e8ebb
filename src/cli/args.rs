//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};

use crate::storage::config::ConfigOverrides;
use crate::storage::token_store::StorageKind;

/// Shopping directory client - browse the home feed and search shops.
#[derive(Parser, Debug)]
#[command(name = "shopdir")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// API base URL
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Where tokens are kept (keyring, preferences)
    #[arg(long, value_name = "BACKEND", global = true)]
    pub token_backend: Option<String>,

    /// Log request and response diagnostics
    #[arg(long, global = true)]
    pub log_network: bool,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub const fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }

    /// Configuration values given on the command line.
    ///
    /// # Errors
    /// Returns an error if `--token-backend` names an unknown backend.
    pub fn config_overrides(&self) -> crate::error::Result<ConfigOverrides> {
        use crate::error::ShopError;

        let token_backend = match self.token_backend.as_deref() {
            Some(raw) => Some(StorageKind::from_arg(raw).ok_or_else(|| ShopError::ConfigInvalid {
                key: "token_backend".to_string(),
                value: raw.to_string(),
                message: "expected keyring or preferences".to_string(),
            })?),
            None => None,
        };

        Ok(ConfigOverrides {
            base_url: self.base_url.clone(),
            request_timeout_secs: self.timeout,
            logging_enabled: self.log_network.then_some(true),
            token_backend,
        })
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the home feed (cached first, then refreshed)
    Home(HomeArgs),

    /// Search shops by title or tag
    Search(SearchArgs),

    /// Manage recent search terms
    #[command(subcommand)]
    History(HistoryCommand),

    /// Manage the stored session
    #[command(subcommand)]
    Session(SessionCommand),

    /// Show the resolved configuration and where each value came from
    Config,
}

/// Arguments for the `home` command.
#[derive(Parser, Debug)]
pub struct HomeArgs {
    /// Use the cached snapshot only
    #[arg(long)]
    pub offline: bool,
}

/// Arguments for the `search` command.
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Search term (at least 3 characters)
    pub term: String,

    /// Search the cached snapshot only
    #[arg(long)]
    pub offline: bool,
}

/// History subcommands.
#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List recent terms, newest first
    List,

    /// Delete terms (matched ignoring case)
    Delete {
        /// Terms to delete
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// Delete all terms
    Clear,
}

/// Session subcommands.
#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Store tokens issued by the backend
    Login {
        /// Access token
        #[arg(long, value_name = "TOKEN")]
        access_token: String,

        /// Refresh token
        #[arg(long, value_name = "TOKEN")]
        refresh_token: Option<String>,

        /// Access token lifetime in seconds
        #[arg(long, value_name = "SECONDS", default_value = "3600")]
        expires_in: u64,
    },

    /// Remove stored tokens
    Logout,

    /// Show whether a session is stored and when it expires
    Status,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
}
