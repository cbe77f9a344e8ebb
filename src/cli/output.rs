//! Output helpers shared by the commands.

use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::cli::args::OutputFormat;
use crate::core::auth::SessionEvent;
use crate::error::{Result, ShopError};

/// Version tag carried by every JSON document.
pub const SCHEMA_VERSION: &str = "shopdir.v1";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    data: &'a T,
}

/// Render `data` inside the standard envelope.
///
/// # Errors
/// Returns an error if `data` cannot be serialized.
pub fn render_json<T: Serialize>(command: &str, data: &T, pretty: bool) -> Result<String> {
    let envelope = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        data,
    };
    let out = if pretty {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    Ok(out)
}

/// Print `data` inside the standard envelope.
///
/// # Errors
/// Returns an error if `data` cannot be serialized.
pub fn print_json<T: Serialize>(command: &str, data: &T, pretty: bool) -> Result<()> {
    println!("{}", render_json(command, data, pretty)?);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    code: &'static str,
    category: String,
    message: String,
    exit_code: i32,
}

/// Render a command failure for stderr.
#[must_use]
pub fn render_error(err: &ShopError, format: OutputFormat, pretty: bool) -> String {
    match format {
        OutputFormat::Json => {
            let body = ErrorBody {
                code: err.error_code(),
                category: err.category().to_string(),
                message: err.to_string(),
                exit_code: err.exit_code().into(),
            };
            render_json("error", &body, pretty)
                .unwrap_or_else(|_| format!("{{\"error\":\"{}\"}}", err.error_code()))
        }
        OutputFormat::Human => format!("Error [{}]: {err}", err.error_code()),
    }
}

/// Tell the user on stderr if the session expired while the command ran.
///
/// Drains every pending event so repeated broadcasts produce one notice.
pub fn report_session_expiry(events: &mut broadcast::Receiver<SessionEvent>) -> bool {
    let mut expired = false;
    loop {
        match events.try_recv() {
            Ok(SessionEvent::Expired) | Err(TryRecvError::Lagged(_)) => expired = true,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    if expired {
        eprintln!("Session expired. Run `shopdir session login` to sign in again.");
    }
    expired
}
