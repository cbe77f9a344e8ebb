//! shopdir - Shopping directory client
//!
//! CLI entry point.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use clap::Parser;
use std::process::ExitCode;

use shopdir::cli::output::render_error;
use shopdir::cli::{AppContext, Cli, Commands};
use shopdir::core::logging;
use shopdir::storage::config::NetworkConfig;
use shopdir::storage::paths::AppPaths;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = cli.effective_format();
    let pretty = cli.pretty;

    // Resolved before logging starts so the file's `logging_enabled` can
    // shape the filter.
    let paths = AppPaths::new();
    let config = cli
        .config_overrides()
        .and_then(|overrides| NetworkConfig::resolve(&overrides, &paths));

    let log_level = cli
        .log_level
        .as_deref()
        .and_then(logging::LogLevel::from_arg)
        .unwrap_or_default();
    let log_format = if cli.json_output {
        logging::LogFormat::Json
    } else {
        logging::LogFormat::default()
    };
    let network_logging = config.as_ref().map_or(cli.log_network, |c| c.logging_enabled);
    logging::init(log_level, log_format, None, cli.verbose, network_logging);

    colored::control::set_override(shopdir::util::env::should_use_color(cli.no_color));

    let result = match config {
        Ok(config) => run(&cli, paths, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{e}");
            eprintln!("{}", render_error(&e, format, pretty));
            e.exit_code().into()
        }
    }
}

async fn run(cli: &Cli, paths: AppPaths, config: NetworkConfig) -> shopdir::Result<()> {
    let format = cli.effective_format();
    let pretty = cli.pretty;

    // `config` only reports settings, so it runs without opening the database.
    match &cli.command {
        Commands::Config => shopdir::cli::config::execute(&config, &paths, format, pretty),
        Commands::Home(args) => {
            let ctx = AppContext::from_config(paths, config)?;
            shopdir::cli::home::execute(args, &ctx, format, pretty).await
        }
        Commands::Search(args) => {
            let ctx = AppContext::from_config(paths, config)?;
            shopdir::cli::search::execute(args, &ctx, format, pretty).await
        }
        Commands::History(cmd) => {
            let ctx = AppContext::from_config(paths, config)?;
            shopdir::cli::history::execute(cmd, &ctx, format, pretty)
        }
        Commands::Session(cmd) => {
            let ctx = AppContext::from_config(paths, config)?;
            shopdir::cli::session::execute(cmd, &ctx, format, pretty)
        }
    }
}
