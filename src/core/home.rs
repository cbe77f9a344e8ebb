//! The home feed endpoint and its service.

use async_trait::async_trait;

use crate::core::client::NetworkClient;
use crate::core::endpoint::{Endpoint, HttpMethod};
use crate::core::loader::RemoteSource;
use crate::core::models::HomeResponse;
use crate::error::NetworkError;

/// Path of the home document.
pub const HOME_PATH: &str = "/ebcom/shop.json";

/// `GET /ebcom/shop.json`, unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeEndpoint {
    base_url: String,
}

impl HomeEndpoint {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(&self.base_url, HOME_PATH)
            .with_method(HttpMethod::Get)
            .with_auth(false)
    }
}

/// Fetches the home document through the shared client.
#[derive(Debug, Clone)]
pub struct HomeService {
    client: NetworkClient,
    endpoint: HomeEndpoint,
}

impl HomeService {
    #[must_use]
    pub fn new(client: NetworkClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: HomeEndpoint::new(base_url),
        }
    }

    /// # Errors
    ///
    /// Any [`NetworkError`] produced by the client.
    pub async fn fetch_home(&self) -> Result<HomeResponse, NetworkError> {
        tracing::debug!("fetching home document");
        self.client.request(&self.endpoint.endpoint()).await
    }
}

#[async_trait]
impl RemoteSource<HomeResponse> for HomeService {
    async fn fetch(&self) -> Result<HomeResponse, NetworkError> {
        self.fetch_home().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::RawResponse;
    use crate::test_utils::{MockTransport, SAMPLE_HOME_JSON};
    use std::sync::Arc;

    #[test]
    fn endpoint_shape() {
        let endpoint = HomeEndpoint::new("http://185.204.197.213:5906/").endpoint();
        assert_eq!(endpoint.method, HttpMethod::Get);
        assert!(!endpoint.requires_auth);
        assert_eq!(
            endpoint.resolve().unwrap().url,
            "http://185.204.197.213:5906/ebcom/shop.json"
        );
    }

    #[tokio::test]
    async fn fetch_home_decodes_payload() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(RawResponse::new(200, SAMPLE_HOME_JSON));
        let service = HomeService::new(NetworkClient::new(transport.clone()), "https://api.x.com");

        let home = service.fetch().await.unwrap();

        assert!(home.has_search());
        assert_eq!(transport.requests()[0].url, "https://api.x.com/ebcom/shop.json");
        assert!(transport.requests()[0].header("Authorization").is_none());
    }

    #[tokio::test]
    async fn fetch_home_propagates_not_found() {
        let transport = Arc::new(MockTransport::new());
        transport.push_response(RawResponse::new(404, ""));
        let service = HomeService::new(NetworkClient::new(transport), "https://api.x.com");

        assert_eq!(service.fetch_home().await, Err(NetworkError::NotFound));
    }
}
