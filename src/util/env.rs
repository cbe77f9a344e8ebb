//! Terminal detection.

use std::io::IsTerminal;

/// Check if stdout is a TTY.
#[must_use]
pub fn stdout_is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Whether human output should be colored.
///
/// Off when the flag is set, `NO_COLOR` is present, `TERM=dumb`, or stdout
/// is not a terminal.
#[must_use]
pub fn should_use_color(no_color_flag: bool) -> bool {
    if no_color_flag || std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var("TERM").is_ok_and(|t| t == "dumb") {
        return false;
    }
    stdout_is_tty()
}
