//! HTTP transport.
//!
//! The I/O boundary of the client: executes a [`ResolvedRequest`] and hands
//! back raw bytes plus status metadata. No retries and no status
//! interpretation happen here.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method};
use thiserror::Error;

use crate::core::endpoint::{HttpMethod, ResolvedRequest};

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw response as produced by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Body as UTF-8 text, lossily.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport-level failure. Mapped to `NetworkError::NoData` by the client.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// Executes resolved requests. Swappable so tests can return canned responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &ResolvedRequest) -> Result<RawResponse, TransportError>;
}

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client, TransportError> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(format!("shopdir/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TransportError::Other(e.to_string()))
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns error if the underlying client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }

    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &ResolvedRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_text_is_lossy() {
        let raw = RawResponse::new(200, vec![b'o', b'k', 0xff]);
        assert!(raw.body_text().starts_with("ok"));
    }

    #[test]
    fn builds_client_with_timeout() {
        assert!(ReqwestTransport::new(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn maps_every_method() {
        assert_eq!(to_reqwest_method(HttpMethod::Patch), Method::PATCH);
        assert_eq!(to_reqwest_method(HttpMethod::Delete), Method::DELETE);
    }
}
