//! Closed failure taxonomy for the network client.
//!
//! Every request path ends in either a decoded value or exactly one of these
//! variants. Transport and decoder failures are converted here and never
//! cross the client boundary as anything else.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure kinds shared by the endpoint resolver, client, session manager,
/// and cache-first loader.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkError {
    #[error("The provided URL is invalid or malformed")]
    #[serde(rename = "invalidURL")]
    InvalidUrl,

    #[error("No data received from the server")]
    NoData,

    #[error("Failed to decode the server response")]
    DecodingFailed,

    #[error("The request was invalid or malformed")]
    BadRequest,

    #[error("The requested resource was not found")]
    NotFound,

    #[error("Authentication or authorization failed")]
    AuthorizationFailed,

    #[error("Internal server error occurred")]
    ServerError,

    /// Reserved for connectivity-layer signaling.
    #[error("The request timed out")]
    Timeout,

    /// Reserved for connectivity-layer signaling.
    #[error("No internet connection available")]
    NoInternetConnection,
}

impl NetworkError {
    /// Every variant, in declaration order.
    pub const ALL: &'static [Self] = &[
        Self::InvalidUrl,
        Self::NoData,
        Self::DecodingFailed,
        Self::BadRequest,
        Self::NotFound,
        Self::AuthorizationFailed,
        Self::ServerError,
        Self::Timeout,
        Self::NoInternetConnection,
    ];

    /// Fixed numeric code. HTTP-mapped kinds reuse the status they stand for;
    /// client-side kinds use negative codes.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::InvalidUrl => -1001,
            Self::NoData => -1002,
            Self::DecodingFailed => -1003,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::AuthorizationFailed => 401,
            Self::ServerError => 500,
            Self::Timeout => -1004,
            Self::NoInternetConnection => -1005,
        }
    }

    /// Stable camelCase identifier, matching the serialized form.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalidURL",
            Self::NoData => "noData",
            Self::DecodingFailed => "decodingFailed",
            Self::BadRequest => "badRequest",
            Self::NotFound => "notFound",
            Self::AuthorizationFailed => "authorizationFailed",
            Self::ServerError => "serverError",
            Self::Timeout => "timeout",
            Self::NoInternetConnection => "noInternetConnection",
        }
    }

    /// Whether the failure comes from reachability rather than the server.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Timeout | Self::NoInternetConnection | Self::NoData)
    }
}
