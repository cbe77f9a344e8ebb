//! Config command implementation.

use std::fmt::Write as _;

use colored::Colorize;

use crate::cli::args::OutputFormat;
use crate::cli::output::print_json;
use crate::error::Result;
use crate::storage::config::NetworkConfig;
use crate::storage::paths::AppPaths;

/// Show the resolved configuration.
///
/// # Errors
/// Returns an error if output serialization fails.
pub fn execute(config: &NetworkConfig, paths: &AppPaths, format: OutputFormat, pretty: bool) -> Result<()> {
    match format {
        OutputFormat::Json => print_json("config", config, pretty),
        OutputFormat::Human => {
            print!("{}", render_config(config, paths));
            Ok(())
        }
    }
}

/// Human rendering: one row per field with its source.
#[must_use]
pub fn render_config(config: &NetworkConfig, paths: &AppPaths) -> String {
    let s = &config.sources;
    let rows = [
        ("base_url", config.base_url.clone(), s.base_url),
        (
            "request_timeout",
            format!("{}s", config.request_timeout.as_secs()),
            s.request_timeout,
        ),
        (
            "max_retry_attempts",
            config.max_retry_attempts.to_string(),
            s.max_retry_attempts,
        ),
        (
            "logging_enabled",
            config.logging_enabled.to_string(),
            s.logging_enabled,
        ),
        ("refresh_path", config.refresh_path.clone(), s.refresh_path),
        (
            "token_backend",
            config.token_backend.as_str().to_string(),
            s.token_backend,
        ),
        ("history_limit", config.history_limit.to_string(), s.history_limit),
        (
            "search_debounce",
            format!("{}ms", config.search_debounce.as_millis()),
            s.search_debounce,
        ),
    ];

    let mut out = String::new();
    for (key, value, source) in rows {
        let _ = writeln!(
            out,
            "{:<20} {:<36} {}",
            key.bold(),
            value,
            format!("({source})").dimmed()
        );
    }
    let _ = writeln!(out);
    let file = config.config_file.as_ref().map_or_else(
        || format!("{} (not found)", paths.config_file().display()),
        |p| p.display().to_string(),
    );
    let _ = writeln!(out, "{:<20} {file}", "config_file".bold());
    let _ = writeln!(out, "{:<20} {}", "database".bold(), paths.database_file().display());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn lists_every_field_with_source() {
        let config = NetworkConfig::default();
        let out = render_config(&config, &AppPaths::rooted_at(Path::new("/tmp/shopdir")));
        for key in [
            "base_url",
            "request_timeout",
            "max_retry_attempts",
            "logging_enabled",
            "refresh_path",
            "token_backend",
            "history_limit",
            "search_debounce",
        ] {
            assert!(out.contains(key), "missing {key}");
        }
        assert!(out.contains("(default)"));
        assert!(out.contains("not found"));
    }
}
