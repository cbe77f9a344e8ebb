//! Human phrasing for timestamps: cache ages, history entries, token expiry.

use chrono::{DateTime, TimeDelta, Utc};

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Coarsest whole unit of `span`, e.g. `2 hours`.
fn coarse_span(span: TimeDelta) -> String {
    let span = span.abs();
    match (span.num_days(), span.num_hours(), span.num_minutes()) {
        (d, _, _) if d > 0 => plural(d, "day"),
        (_, h, _) if h > 0 => plural(h, "hour"),
        (_, _, m) => plural(m, "minute"),
    }
}

/// Time left until `target`: `in 2 days`, `in 3h 20m`, `in 45s`, or `now`
/// once it has passed.
#[must_use]
pub fn format_countdown(target: DateTime<Utc>) -> String {
    let left = target - Utc::now();
    let secs = left.num_seconds();
    if secs <= 0 {
        return "now".to_string();
    }

    let hours = left.num_hours();
    let minutes = left.num_minutes() % 60;
    if hours > 24 {
        format!("in {}", plural(left.num_days(), "day"))
    } else if hours > 0 {
        format!("in {hours}h {minutes}m")
    } else if minutes > 0 {
        format!("in {minutes}m")
    } else {
        format!("in {secs}s")
    }
}

/// `5 minutes ago`, `in 2 hours`, or `just now` within a minute either way.
#[must_use]
pub fn format_relative_time(target: DateTime<Utc>) -> String {
    let elapsed = Utc::now() - target;
    if elapsed.num_seconds().abs() < 60 {
        "just now".to_string()
    } else if elapsed > TimeDelta::zero() {
        format!("{} ago", coarse_span(elapsed))
    } else {
        format!("in {}", coarse_span(elapsed))
    }
}
