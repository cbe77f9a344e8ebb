//! Home command implementation.

use std::fmt::Write as _;

use colored::Colorize;
use serde::Serialize;

use crate::cli::args::{HomeArgs, OutputFormat};
use crate::cli::context::AppContext;
use crate::cli::output::{print_json, report_session_expiry};
use crate::core::loader::{DataOrigin, LoadState};
use crate::core::models::{FaqPayload, HomeResponse, HomeSection};
use crate::error::{NetworkError, Result};
use crate::util::time::format_relative_time;

/// JSON shape of the `home` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView<'a> {
    pub origin: Option<DataOrigin>,
    pub cached_at: Option<chrono::DateTime<chrono::Utc>>,
    pub search: bool,
    pub sections: Vec<HomeSection>,
    pub faq: Option<&'a FaqPayload>,
}

/// Execute the home command.
///
/// # Errors
/// Returns [`crate::error::ShopError::NoData`] when nothing is cached and the fetch failed,
/// or a storage error if the database cannot be opened.
pub async fn execute(
    args: &HomeArgs,
    ctx: &AppContext,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    let mut events = ctx.auth.signal().subscribe();
    let loader = ctx.home_loader(ctx.database()?, args.offline).await;
    let state = loader.load().await;
    report_session_expiry(&mut events);

    let Some(home) = state.data.as_ref() else {
        return Err(state.error.unwrap_or(NetworkError::NoData).into());
    };

    match format {
        OutputFormat::Json => print_json("home", &home_view(home, &state), pretty),
        OutputFormat::Human => {
            print!("{}", render_home(home, &state));
            Ok(())
        }
    }
}

fn home_view<'a>(home: &'a HomeResponse, state: &LoadState<HomeResponse>) -> HomeView<'a> {
    HomeView {
        origin: state.origin,
        cached_at: state.cached_at,
        search: home.has_search(),
        sections: home.resolve_sections(),
        faq: home.faq(),
    }
}

/// Human rendering of the resolved home feed.
#[must_use]
pub fn render_home(home: &HomeResponse, state: &LoadState<HomeResponse>) -> String {
    let mut out = String::new();

    if state.origin == Some(DataOrigin::Cache) {
        let age = state
            .cached_at
            .map_or_else(|| "unknown time".to_string(), format_relative_time);
        let _ = writeln!(out, "{}", format!("Showing cached data from {age}").dimmed());
        let _ = writeln!(out);
    }

    for section in home.resolve_sections() {
        render_section(&mut out, &section);
        let _ = writeln!(out);
    }

    if let Some(faq) = home.faq() {
        let _ = writeln!(out, "{}", faq.title.bold());
        for item in &faq.sections {
            let _ = writeln!(out, "  {}", item.title.cyan());
            let _ = writeln!(out, "    {}", item.description);
        }
    }

    out
}

fn render_section(out: &mut String, section: &HomeSection) {
    match section {
        HomeSection::Category { title, items } => {
            heading(out, title.as_deref().unwrap_or("Categories"), items.len());
            for category in items {
                let _ = writeln!(out, "  - {}", category.title);
            }
        }
        HomeSection::Shop { title, items } => {
            heading(out, title.as_deref().unwrap_or("Shops"), items.len());
            for shop in items {
                let tags = shop.tags.as_deref().unwrap_or_default();
                if tags.is_empty() {
                    let _ = writeln!(out, "  - {}", shop.title);
                } else {
                    let _ = writeln!(out, "  - {} {}", shop.title, format!("[{}]", tags.join(", ")).dimmed());
                }
            }
        }
        HomeSection::Banner { items } => {
            heading(out, "Banners", items.len());
            for banner in items {
                let _ = writeln!(out, "  - {}", banner.image_url);
            }
        }
        HomeSection::FixedBanner { title, items } => {
            heading(out, title.as_deref().unwrap_or("Featured"), items.len());
            for banner in items {
                let _ = writeln!(out, "  - {}", banner.image_url);
            }
        }
    }
}

fn heading(out: &mut String, title: &str, count: usize) {
    let _ = writeln!(out, "{} {}", title.bold(), format!("({count})").dimmed());
}
