//! History command implementation.

use colored::Colorize;

use crate::cli::args::{HistoryCommand, OutputFormat};
use crate::cli::context::AppContext;
use crate::cli::output::print_json;
use crate::error::Result;
use crate::storage::history::SearchHistoryRepository;
use crate::util::time::format_relative_time;

/// Execute history commands.
///
/// # Errors
/// Returns an error if the history database cannot be opened or written.
pub fn execute(
    cmd: &HistoryCommand,
    ctx: &AppContext,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    let store = ctx.history_store(ctx.database()?);

    match cmd {
        HistoryCommand::List => {
            let entries = store.entries()?;
            match format {
                OutputFormat::Json => print_json("history list", &entries, pretty)?,
                OutputFormat::Human if entries.is_empty() => println!("No recent searches."),
                OutputFormat::Human => {
                    for entry in &entries {
                        println!(
                            "{}  {}",
                            entry.term,
                            format_relative_time(entry.created_at).dimmed()
                        );
                    }
                }
            }
        }
        HistoryCommand::Delete { terms } => {
            let removed = store.delete(terms)?;
            report_removed("history delete", removed, format, pretty)?;
        }
        HistoryCommand::Clear => {
            let removed = store.clear()?;
            report_removed("history clear", removed, format, pretty)?;
        }
    }
    Ok(())
}

fn report_removed(command: &str, removed: usize, format: OutputFormat, pretty: bool) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(command, &serde_json::json!({ "removed": removed }), pretty),
        OutputFormat::Human => {
            println!("Removed {removed} term{}.", if removed == 1 { "" } else { "s" });
            Ok(())
        }
    }
}
