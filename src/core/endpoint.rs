//! Declarative endpoint descriptors and their resolution into transport
//! requests.
//!
//! An [`Endpoint`] is an immutable value built per call site. Resolving it is
//! pure and synchronous: the base URL is validated, joined to the path with
//! exactly one `/`, default JSON headers are applied, and the body (if any)
//! is serialized to bytes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::NetworkError;

/// Header applied to every request unless the endpoint overrides it.
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("Accept", "application/json"),
    ("Content-Type", "application/json"),
];

/// HTTP method for an endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: &'static [Self] = &[Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub base_url: String,
    pub path: String,
    pub method: HttpMethod,
    /// Extra headers. A key that matches a default header (case-insensitively)
    /// replaces it.
    pub headers: BTreeMap<String, String>,
    pub body: Option<Map<String, Value>>,
    pub requires_auth: bool,
}

impl Endpoint {
    /// A GET endpoint with no extra headers, no body, and no auth.
    #[must_use]
    pub fn new(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            body: None,
            requires_auth: false,
        }
    }

    #[must_use]
    pub const fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub const fn with_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    /// Resolve into a [`ResolvedRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidUrl`] when the base URL is blank, lacks an
    /// `http://`/`https://` scheme, has no host, or the joined URL does not
    /// parse. Returns [`NetworkError::BadRequest`] if the body cannot be
    /// serialized.
    pub fn resolve(&self) -> Result<ResolvedRequest, NetworkError> {
        let base = validate_base_url(&self.base_url)?;
        let url = join_url(base, &self.path);

        if Url::parse(&url).is_err() {
            tracing::error!(base = %base, path = %self.path, "failed to construct URL");
            return Err(NetworkError::InvalidUrl);
        }
        tracing::trace!(url = %url, "constructed request URL");

        let body = self
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to serialize request body");
                NetworkError::BadRequest
            })?;

        Ok(ResolvedRequest {
            url,
            method: self.method,
            headers: merge_headers(&self.headers),
            body,
        })
    }
}

/// A request ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl ResolvedRequest {
    /// Look up a header case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set a header, replacing any existing key that matches case-insensitively.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.into());
    }
}

/// Validate a base URL and return it trimmed of surrounding whitespace.
fn validate_base_url(raw: &str) -> Result<&str, NetworkError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        tracing::error!("base URL is empty");
        return Err(NetworkError::InvalidUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        tracing::error!(base = %trimmed, "base URL must start with http:// or https://");
        return Err(NetworkError::InvalidUrl);
    }
    match Url::parse(trimmed) {
        Ok(parsed) if parsed.host_str().is_some_and(|h| !h.is_empty()) => Ok(trimmed),
        _ => {
            tracing::error!(base = %trimmed, "base URL is invalid or missing host");
            Err(NetworkError::InvalidUrl)
        }
    }
}

/// Join with exactly one `/` between base and path.
fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

fn merge_headers(extra: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = DEFAULT_HEADERS
        .iter()
        .filter(|(name, _)| !extra.keys().any(|k| k.eq_ignore_ascii_case(name)))
        .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
        .collect();
    headers.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    headers
}
