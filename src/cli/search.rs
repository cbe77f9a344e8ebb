//! Search command implementation.

use std::fmt::Write as _;
use std::sync::Arc;

use colored::Colorize;

use crate::cli::args::{OutputFormat, SearchArgs};
use crate::cli::context::AppContext;
use crate::cli::output::{print_json, report_session_expiry};
use crate::core::search::{MIN_QUERY_CHARS, SearchState, ShopSearch, searchable};
use crate::error::{Result, ShopError};

/// Execute the search command.
///
/// # Errors
/// Returns an error if the term is too short, the database cannot be
/// opened, or no shop list could be loaded at all.
pub async fn execute(
    args: &SearchArgs,
    ctx: &AppContext,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    if searchable(&args.term).is_none() {
        return Err(ShopError::Config(format!(
            "search term must be at least {MIN_QUERY_CHARS} characters"
        )));
    }

    let db = ctx.database()?;
    let history = ctx.history_store(db.clone());
    let mut events = ctx.auth.signal().subscribe();
    let loader = ctx.home_loader(db, args.offline).await;
    let search = ShopSearch::new(loader, Arc::new(history), ctx.config.search_debounce);

    let loaded = search.load().await;
    report_session_expiry(&mut events);
    if let Some(err) = loaded.error {
        return Err(err.into());
    }

    let state = search.search(&args.term);
    match format {
        OutputFormat::Json => print_json("search", &state, pretty),
        OutputFormat::Human => {
            print!("{}", render_results(&state));
            Ok(())
        }
    }
}

/// Human rendering of a search outcome.
#[must_use]
pub fn render_results(state: &SearchState) -> String {
    let mut out = String::new();
    if state.show_empty_state {
        let _ = writeln!(out, "No shops match \"{}\".", state.query.trim());
        return out;
    }

    let _ = writeln!(
        out,
        "{} {}",
        format!("Results for \"{}\"", state.query.trim()).bold(),
        format!("({})", state.results.len()).dimmed()
    );
    for shop in &state.results {
        let _ = write!(out, "  - {}", shop.title);
        if let Some(about) = shop.about.as_ref().and_then(|a| a.description.as_deref()) {
            let _ = write!(out, " {}", format!("- {about}").dimmed());
        }
        let _ = writeln!(out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_test_shop;

    #[test]
    fn empty_state_message() {
        let state = SearchState {
            query: "cherry".to_string(),
            show_empty_state: true,
            ..SearchState::default()
        };
        assert!(render_results(&state).contains("No shops match \"cherry\""));
    }

    #[test]
    fn lists_matches() {
        let state = SearchState {
            query: "apple".to_string(),
            results: vec![make_test_shop("shop-1", "Apple Store")],
            ..SearchState::default()
        };
        let out = render_results(&state);
        assert!(out.contains("Apple Store"));
        assert!(out.contains("(1)"));
    }
}
