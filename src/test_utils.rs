//! Test utilities for shopdir.
//!
//! Scripted doubles for every I/O seam (transport, token refresh, remote
//! source, snapshot cache) plus home payload factories.
//!
//! # Usage
//!
//! ```rust,ignore
//! use shopdir::test_utils::*;
//!
//! let transport = Arc::new(MockTransport::new());
//! transport.push_response(RawResponse::new(200, SAMPLE_HOME_JSON));
//! let home = make_test_home_response(&["Apple Store"]);
//! ```

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::auth::{TokenGrant, TokenRefresher};
use crate::core::endpoint::ResolvedRequest;
use crate::core::loader::RemoteSource;
use crate::core::models::{
    BannerModel, CategoryModel, HomePayload, HomeResponse, HomeSectionPayload, HomeSectionType,
    ShopModel,
};
use crate::core::transport::{RawResponse, Transport, TransportError};
use crate::error::NetworkError;
use crate::storage::cache::SnapshotRepository;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Payload Factories
// =============================================================================

/// A complete home document exercising every section type and optional field.
pub const SAMPLE_HOME_JSON: &str = r#"{
  "home": {
    "search": true,
    "faq": {
      "id": "faq-1",
      "title": "Questions",
      "sections": [{"title": "How do I pay?", "description": "At the counter."}]
    },
    "sections": [
      {"title": "Categories", "type": "CATEGORY", "list": ["cat-1", "cat-2"]},
      {"type": "BANNER", "subType": "SLIDER", "list": ["banner-1"]},
      {"title": "Popular", "type": "SHOP", "list": ["shop-1", "shop-2"]},
      {"title": "Offers", "type": "FIXEDBANNER", "list": ["banner-2"]}
    ]
  },
  "categories": [
    {"id": "cat-1", "title": "Food", "iconUrl": "https://cdn.example.com/food.png"},
    {"id": "cat-2", "title": "Tech", "iconUrl": "https://cdn.example.com/tech.png", "status": "ACTIVE"}
  ],
  "shops": [
    {
      "id": "shop-1",
      "title": "Apple Store",
      "iconUrl": "https://cdn.example.com/apple.png",
      "labels": ["label-1"],
      "tags": ["Electronics"],
      "categories": ["cat-2"],
      "about": {"title": "About", "description": "Phones and laptops"},
      "type": ["ONLINE"],
      "code": "APL",
      "status": "ACTIVE"
    },
    {"id": "shop-2", "title": "Banana Bakery", "iconUrl": "https://cdn.example.com/banana.png"}
  ],
  "banners": [
    {"id": "banner-1", "imageUrl": "https://cdn.example.com/b1.jpg"},
    {"id": "banner-2", "imageUrl": "https://cdn.example.com/b2.jpg"}
  ],
  "tags": [{"id": "tag-1", "title": "New"}],
  "labels": [{"id": "label-1", "title": "Verified"}]
}"#;

/// A shop with only the required fields.
#[must_use]
pub fn make_test_shop(id: &str, title: &str) -> ShopModel {
    ShopModel {
        id: id.to_string(),
        title: title.to_string(),
        icon_url: format!("https://cdn.example.com/{id}.png"),
        labels: None,
        tags: None,
        categories: None,
        about: None,
        shop_type: None,
        code: None,
        status: None,
    }
}

/// A home document with one category section, one shop section listing a
/// shop per title (ids `shop-1`, `shop-2`, ...), and one banner section.
#[must_use]
pub fn make_test_home_response(shop_titles: &[&str]) -> HomeResponse {
    let shops: Vec<ShopModel> = shop_titles
        .iter()
        .enumerate()
        .map(|(i, title)| make_test_shop(&format!("shop-{}", i + 1), title))
        .collect();

    HomeResponse {
        home: HomePayload {
            search: Some(true),
            faq: None,
            sections: vec![
                HomeSectionPayload {
                    title: Some("Categories".to_string()),
                    section_type: HomeSectionType::Category,
                    sub_type: None,
                    list: vec!["cat-1".to_string()],
                },
                HomeSectionPayload {
                    title: Some("Shops".to_string()),
                    section_type: HomeSectionType::Shop,
                    sub_type: None,
                    list: shops.iter().map(|s| s.id.clone()).collect(),
                },
                HomeSectionPayload {
                    title: None,
                    section_type: HomeSectionType::Banner,
                    sub_type: None,
                    list: vec!["banner-1".to_string()],
                },
            ],
        },
        categories: vec![CategoryModel {
            id: "cat-1".to_string(),
            title: "Test Category".to_string(),
            icon_url: "https://cdn.example.com/cat-1.png".to_string(),
            status: None,
        }],
        shops,
        banners: vec![BannerModel {
            id: "banner-1".to_string(),
            image_url: "https://cdn.example.com/banner-1.jpg".to_string(),
        }],
        tags: None,
        labels: None,
    }
}

/// A grant valid for an hour.
#[must_use]
pub fn make_test_grant(access_token: &str) -> TokenGrant {
    TokenGrant {
        access_token: access_token.to_string(),
        refresh_token: Some(format!("{access_token}-refresh")),
        expires_in: 3600,
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Transport that replays scripted outcomes in order and records requests.
///
/// Running out of script is a transport error.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Option<RawResponse>>>,
    requests: Mutex<Vec<ResolvedRequest>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: RawResponse) {
        lock(&self.script).push_back(Some(response));
    }

    pub fn push_error(&self) {
        lock(&self.script).push_back(None);
    }

    /// Requests seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ResolvedRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &ResolvedRequest) -> Result<RawResponse, TransportError> {
        lock(&self.requests).push(request.clone());
        match lock(&self.script).pop_front() {
            Some(Some(response)) => Ok(response),
            Some(None) => Err(TransportError::Connect("scripted failure".to_string())),
            None => Err(TransportError::Other("no scripted response".to_string())),
        }
    }
}

// =============================================================================
// Token refresh
// =============================================================================

/// Refresher returning a fixed outcome after an optional delay, counting calls.
#[derive(Debug)]
pub struct MockTokenRefresher {
    outcome: Result<TokenGrant, NetworkError>,
    delay: Duration,
    calls: AtomicUsize,
    last_refresh_token: Mutex<Option<String>>,
}

impl MockTokenRefresher {
    #[must_use]
    pub fn succeeding(grant: TokenGrant) -> Self {
        Self::with_outcome(Ok(grant))
    }

    #[must_use]
    pub fn failing(error: NetworkError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<TokenGrant, NetworkError>) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_refresh_token: Mutex::new(None),
        }
    }

    /// Hold each refresh open for `delay` so concurrent callers overlap.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_refresh_token(&self) -> Option<String> {
        lock(&self.last_refresh_token).clone()
    }
}

#[async_trait]
impl TokenRefresher for MockTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_refresh_token) = Some(refresh_token.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}

// =============================================================================
// Remote source and cache
// =============================================================================

/// Remote source with a swappable outcome and a call counter.
#[derive(Debug)]
pub struct MockRemote<T> {
    outcome: Mutex<Result<T, NetworkError>>,
    calls: AtomicUsize,
}

impl<T: Clone> MockRemote<T> {
    #[must_use]
    pub fn succeeding(value: T) -> Self {
        Self {
            outcome: Mutex::new(Ok(value)),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn failing(error: NetworkError) -> Self {
        Self {
            outcome: Mutex::new(Err(error)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_outcome(&self, outcome: Result<T, NetworkError>) {
        *lock(&self.outcome) = outcome;
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> RemoteSource<T> for MockRemote<T> {
    async fn fetch(&self) -> Result<T, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.outcome).clone()
    }
}

/// Snapshot cache held in memory. Saves can be made to fail.
#[derive(Debug)]
pub struct InMemorySnapshotRepository<T> {
    slot: Mutex<Option<(T, DateTime<Utc>)>>,
    fail_saves: AtomicBool,
}

impl<T> InMemorySnapshotRepository<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            fail_saves: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_value(value: T) -> Self {
        Self {
            slot: Mutex::new(Some((value, Utc::now()))),
            fail_saves: AtomicBool::new(false),
        }
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl<T> Default for InMemorySnapshotRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> SnapshotRepository<T> for InMemorySnapshotRepository<T> {
    fn fetch_cached(&self) -> Option<T> {
        lock(&self.slot).as_ref().map(|(value, _)| value.clone())
    }

    fn save(&self, value: &T) -> crate::error::Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(crate::error::ShopError::Storage("scripted save failure".to_string()));
        }
        *lock(&self.slot) = Some((value.clone(), Utc::now()));
        Ok(())
    }

    fn last_updated(&self) -> Option<DateTime<Utc>> {
        lock(&self.slot).as_ref().map(|(_, at)| *at)
    }
}

// =============================================================================
// Temporary Directories
// =============================================================================

/// Isolated temporary directory, removed on drop.
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Write a file, creating parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.inner.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write test file");
        path
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
///
/// ```rust,ignore
/// use shopdir::assert_contains;
///
/// assert_contains!("Hello, world!", "world");
/// ```
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack = $haystack;
        let needle = $needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain {:?}\n\nActual string:\n{:?}",
            needle,
            haystack
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_transport_replays_in_order() {
        let transport = MockTransport::new();
        transport.push_response(RawResponse::new(200, "a"));
        transport.push_error();
        let request = crate::core::endpoint::Endpoint::new("https://x.com", "/")
            .resolve()
            .unwrap();

        assert_eq!(transport.execute(&request).await.unwrap().body, b"a");
        assert!(transport.execute(&request).await.is_err());
        assert!(transport.execute(&request).await.is_err());
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn factory_ids_are_sequential() {
        let home = make_test_home_response(&["A", "B"]);
        assert_eq!(home.shops[1].id, "shop-2");
        assert_eq!(home.home.sections[1].list, ["shop-1", "shop-2"]);
    }

    #[test]
    fn test_dir_writes_files() {
        let dir = TestDir::new();
        let path = dir.create_file("nested/config.toml", "x = 1");
        assert_eq!(fs::read_to_string(path).unwrap(), "x = 1");
    }
}
