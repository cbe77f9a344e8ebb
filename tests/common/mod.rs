//! Common test utilities and fixtures for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: home payloads, token grants, and session/database builders
//! - `logger`: structured test logging
//! - `log_capture`: tracing capture for asserting on emitted diagnostics

pub mod fixtures;
pub mod log_capture;
pub mod logger;
