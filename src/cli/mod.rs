//! CLI argument parsing and command dispatch.

pub mod args;
pub mod config;
pub mod context;
pub mod history;
pub mod home;
pub mod output;
pub mod search;
pub mod session;

pub use args::{Cli, Commands, OutputFormat};
pub use context::AppContext;
