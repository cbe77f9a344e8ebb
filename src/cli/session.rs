//! Session command implementation.

use serde::Serialize;

use crate::cli::args::{OutputFormat, SessionCommand};
use crate::cli::context::AppContext;
use crate::cli::output::print_json;
use crate::core::auth::TokenGrant;
use crate::error::{Result, ShopError};
use crate::storage::session::StoredSession;
use crate::util::time::format_countdown;

/// What `session status` reports. Tokens themselves are never printed.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub logged_in: bool,
    pub has_refresh_token: bool,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub token_backend: &'static str,
}

impl SessionStatus {
    #[must_use]
    pub fn from_session(session: &StoredSession, token_backend: &'static str) -> Self {
        Self {
            logged_in: session.access_token.is_some(),
            has_refresh_token: session.refresh_token.is_some(),
            expires_at: session.expires_at,
            token_backend,
        }
    }
}

/// Execute session commands.
///
/// # Errors
/// Returns an error if the login arguments are empty or output fails.
pub fn execute(
    cmd: &SessionCommand,
    ctx: &AppContext,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    match cmd {
        SessionCommand::Login {
            access_token,
            refresh_token,
            expires_in,
        } => {
            if access_token.trim().is_empty() {
                return Err(ShopError::Config("access token must not be empty".to_string()));
            }
            ctx.auth.establish(&TokenGrant {
                access_token: access_token.clone(),
                refresh_token: refresh_token.clone(),
                expires_in: *expires_in,
            });
            tracing::info!(backend = ctx.config.token_backend.as_str(), "session stored");
            print_status("session login", ctx, format, pretty)
        }
        SessionCommand::Logout => {
            ctx.auth.logout();
            match format {
                OutputFormat::Json => {
                    print_json("session logout", &serde_json::json!({ "loggedIn": false }), pretty)
                }
                OutputFormat::Human => {
                    println!("Logged out.");
                    Ok(())
                }
            }
        }
        SessionCommand::Status => print_status("session status", ctx, format, pretty),
    }
}

fn print_status(command: &str, ctx: &AppContext, format: OutputFormat, pretty: bool) -> Result<()> {
    let status = SessionStatus::from_session(&ctx.auth.status(), ctx.config.token_backend.as_str());
    match format {
        OutputFormat::Json => print_json(command, &status, pretty),
        OutputFormat::Human => {
            println!("{}", describe(&status));
            Ok(())
        }
    }
}

/// One-line human summary.
#[must_use]
pub fn describe(status: &SessionStatus) -> String {
    if !status.logged_in {
        return "Not logged in.".to_string();
    }
    let expiry = status.expires_at.map_or_else(
        || "no expiry recorded".to_string(),
        |at| match format_countdown(at).as_str() {
            "now" => "expired, refresh on next request".to_string(),
            left => format!("expires {left}"),
        },
    );
    let refresh = if status.has_refresh_token {
        "refreshable"
    } else {
        "no refresh token"
    };
    format!("Logged in ({expiry}, {refresh}) via {}.", status.token_backend)
}
