//! Typed request orchestration.
//!
//! [`NetworkClient::request`] resolves an [`Endpoint`], attaches a bearer
//! token when the endpoint asks for one, executes it on the [`Transport`],
//! triages the status code and decodes the body. Every failure comes back as
//! a [`NetworkError`] value; nothing is retried here.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::core::auth::AuthSessionManager;
use crate::core::decoder::ResponseDecoder;
use crate::core::endpoint::Endpoint;
use crate::core::transport::{RawResponse, Transport};
use crate::error::NetworkError;

/// Bytes of an error body kept in diagnostics.
const MAX_LOGGED_BODY: usize = 1024;

/// Generic HTTP client shared by every service.
#[derive(Clone)]
pub struct NetworkClient {
    transport: Arc<dyn Transport>,
    decoder: ResponseDecoder,
    auth: Option<AuthSessionManager>,
    logging_enabled: bool,
}

impl std::fmt::Debug for NetworkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkClient")
            .field("auth", &self.auth.is_some())
            .field("logging_enabled", &self.logging_enabled)
            .finish_non_exhaustive()
    }
}

impl NetworkClient {
    /// Client without a session manager. Authenticated endpoints fail with
    /// [`NetworkError::AuthorizationFailed`].
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            decoder: ResponseDecoder::new(),
            auth: None,
            logging_enabled: false,
        }
    }

    #[must_use]
    pub fn with_auth(mut self, auth: AuthSessionManager) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Log request and response details at debug level.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    #[must_use]
    pub const fn auth(&self) -> Option<&AuthSessionManager> {
        self.auth.as_ref()
    }

    /// Execute `endpoint` and decode a successful body as `T`.
    ///
    /// # Errors
    ///
    /// - [`NetworkError::BadRequest`] if the endpoint cannot be resolved or
    ///   the server answers with an unclassified status.
    /// - [`NetworkError::AuthorizationFailed`] if no token is available or the
    ///   server answers 401/403. Both clear the session.
    /// - [`NetworkError::NoData`] on transport failure.
    /// - [`NetworkError::NotFound`], [`NetworkError::ServerError`],
    ///   [`NetworkError::DecodingFailed`] per status and body.
    pub async fn request<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, NetworkError> {
        let mut request = endpoint.resolve().map_err(|err| {
            tracing::error!(path = %endpoint.path, error = %err, "failed to resolve endpoint");
            NetworkError::BadRequest
        })?;

        if endpoint.requires_auth {
            let token = self.bearer_token().await?;
            request.set_header("Authorization", format!("Bearer {token}"));
        }

        if self.logging_enabled {
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                body_bytes = request.body.as_ref().map_or(0, Vec::len),
                "sending request"
            );
        }

        let response = self.transport.execute(&request).await.map_err(|err| {
            tracing::warn!(url = %request.url, error = %err, "transport failure");
            NetworkError::NoData
        })?;

        if self.logging_enabled {
            tracing::debug!(
                url = %request.url,
                status = response.status,
                body_bytes = response.body.len(),
                "received response"
            );
        }

        self.triage(&request.url, response)
    }

    async fn bearer_token(&self) -> Result<String, NetworkError> {
        let Some(auth) = &self.auth else {
            tracing::warn!("endpoint requires auth but no session manager is configured");
            return Err(NetworkError::AuthorizationFailed);
        };
        match auth.get_valid_access_token().await {
            Ok(token) => Ok(token),
            Err(err) => {
                tracing::warn!(error = %err, "no usable access token");
                auth.handle_unauthorized();
                Err(NetworkError::AuthorizationFailed)
            }
        }
    }

    fn triage<T: DeserializeOwned>(&self, url: &str, response: RawResponse) -> Result<T, NetworkError> {
        match response.status {
            200..=299 => self.decoder.decode(&response.body),
            401 | 403 => {
                let body = response.body_text();
                tracing::warn!(
                    url,
                    status = response.status,
                    body = %truncate(&body),
                    "unauthorized response"
                );
                if let Some(auth) = &self.auth {
                    auth.handle_unauthorized();
                }
                Err(NetworkError::AuthorizationFailed)
            }
            404 => Err(NetworkError::NotFound),
            500..=599 => {
                tracing::warn!(url, status = response.status, "server error");
                Err(NetworkError::ServerError)
            }
            status => {
                tracing::warn!(url, status, "unexpected status");
                Err(NetworkError::BadRequest)
            }
        }
    }
}

fn truncate(text: &str) -> &str {
    if text.len() <= MAX_LOGGED_BODY {
        return text;
    }
    let mut end = MAX_LOGGED_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
