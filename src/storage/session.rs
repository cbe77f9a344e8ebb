//! Persisted session tokens on top of a [`TokenStorage`] backend.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::storage::token_store::TokenStorage;

const ACCESS_TOKEN_KEY: &str = "shopdir.accessToken";
const REFRESH_TOKEN_KEY: &str = "shopdir.refreshToken";
const EXPIRES_AT_KEY: &str = "shopdir.expiresAt";

/// Snapshot of what the backend currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Typed access to the three session keys.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn TokenStorage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self { storage }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Expiry, if one was stored and parses as RFC 3339.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.storage.get(EXPIRES_AT_KEY)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unparseable token expiry");
                None
            }
        }
    }

    #[must_use]
    pub fn load(&self) -> StoredSession {
        StoredSession {
            access_token: self.access_token(),
            refresh_token: self.refresh_token(),
            expires_at: self.expires_at(),
        }
    }

    /// Persist a new token set. A `None` refresh token keeps the current one.
    pub fn save(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.storage.store(access_token, ACCESS_TOKEN_KEY);
        if let Some(refresh) = refresh_token {
            self.storage.store(refresh, REFRESH_TOKEN_KEY);
        }
        match expires_at {
            Some(ts) => self.storage.store(&ts.to_rfc3339(), EXPIRES_AT_KEY),
            None => self.storage.remove(EXPIRES_AT_KEY),
        }
    }

    /// Remove every session key. Safe to call repeatedly.
    pub fn clear(&self) {
        self.storage.remove(ACCESS_TOKEN_KEY);
        self.storage.remove(REFRESH_TOKEN_KEY);
        self.storage.remove(EXPIRES_AT_KEY);
        tracing::info!("session cleared");
    }

    #[must_use]
    pub fn has_session(&self) -> bool {
        self.storage.exists(ACCESS_TOKEN_KEY) || self.storage.exists(REFRESH_TOKEN_KEY)
    }
}
