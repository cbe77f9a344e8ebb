//! Utility functions.

pub mod env;
pub mod time;

pub use time::{format_countdown, format_relative_time};
