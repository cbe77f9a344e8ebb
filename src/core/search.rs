//! Shop search over the cached home document.
//!
//! Matching is a case-insensitive substring test on a shop's title and tags.
//! Queries shorter than [`MIN_QUERY_CHARS`] (after trimming) clear the results
//! without showing an empty state. Any search that finds something records
//! its term in the search history.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::loader::CacheFirstLoader;
use crate::core::models::{HomeResponse, ShopModel};
use crate::error::NetworkError;
use crate::storage::history::SearchHistoryRepository;

/// Minimum number of characters before a query is matched.
pub const MIN_QUERY_CHARS: usize = 3;

/// Whether `shop` matches `term` by title or any tag, ignoring case.
#[must_use]
pub fn matches_shop(shop: &ShopModel, term: &str) -> bool {
    let needle = term.to_lowercase();
    if shop.title.to_lowercase().contains(&needle) {
        return true;
    }
    shop.tags
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|tag| tag.to_lowercase().contains(&needle))
}

/// The trimmed query if it is long enough to search.
#[must_use]
pub fn searchable(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    (trimmed.chars().count() >= MIN_QUERY_CHARS).then_some(trimmed)
}

/// Observable search state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<ShopModel>,
    /// A searchable query matched nothing.
    pub show_empty_state: bool,
    pub loading: bool,
    pub error: Option<NetworkError>,
}

struct SearchInner {
    loader: CacheFirstLoader<HomeResponse>,
    history: Arc<dyn SearchHistoryRepository>,
    shops: RwLock<Vec<ShopModel>>,
    query: Mutex<String>,
    state: watch::Sender<SearchState>,
}

/// Search session: loaded shops, the current query, and debounced matching.
pub struct ShopSearch {
    inner: Arc<SearchInner>,
    debounce: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ShopSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopSearch")
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl ShopSearch {
    #[must_use]
    pub fn new(
        loader: CacheFirstLoader<HomeResponse>,
        history: Arc<dyn SearchHistoryRepository>,
        debounce: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            inner: Arc::new(SearchInner {
                loader,
                history,
                shops: RwLock::new(Vec::new()),
                query: Mutex::new(String::new()),
                state,
            }),
            debounce,
            pending: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        self.inner.state.borrow().clone()
    }

    /// Load the shop list (cache first) and re-run the current query.
    pub async fn load(&self) -> SearchState {
        self.inner.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let loaded = self.inner.loader.load().await;
        let shops = loaded.data.map(|home| home.shops).unwrap_or_default();
        tracing::debug!(shops = shops.len(), error = ?loaded.error, "search catalogue loaded");
        *self
            .inner
            .shops
            .write()
            .unwrap_or_else(PoisonError::into_inner) = shops;

        self.inner.state.send_modify(|s| {
            s.loading = false;
            s.error = loaded.error;
        });

        let query = self.inner.current_query();
        if searchable(&query).is_some() {
            self.inner.perform_search(&query);
        }
        self.state()
    }

    /// Set the query and match immediately.
    pub fn search(&self, query: &str) -> SearchState {
        self.cancel_pending();
        self.inner.set_query(query);
        if searchable(query).is_some() {
            self.inner.perform_search(query);
        } else {
            self.inner.clear_results();
        }
        self.state()
    }

    /// Set the query and match after the debounce delay.
    ///
    /// A pending search is cancelled first, so only the last query issued
    /// within the delay runs. Short queries clear the results immediately.
    pub fn on_query_changed(&self, query: &str) {
        self.cancel_pending();
        self.inner.set_query(query);

        let Some(term) = searchable(query) else {
            self.inner.clear_results();
            return;
        };

        let inner = Arc::clone(&self.inner);
        let term = term.to_string();
        let delay = self.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.perform_search(&term);
        });
        *self.lock_pending() = Some(handle);
    }

    /// Wait for a pending debounced search, if any.
    pub async fn settle(&self) -> SearchState {
        let handle = self.lock_pending().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "debounced search task failed");
                }
            }
        }
        self.state()
    }

    /// Empty the query and results and cancel any pending search.
    pub fn clear_query(&self) {
        self.cancel_pending();
        self.inner.set_query("");
        self.inner.clear_results();
    }

    /// Run a term from history as the new query.
    pub fn apply_history(&self, term: &str) {
        self.on_query_changed(term);
    }

    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.inner.history.fetch_terms()
    }

    fn cancel_pending(&self) {
        if let Some(handle) = self.lock_pending().take() {
            handle.abort();
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ShopSearch {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

impl SearchInner {
    fn current_query(&self) -> String {
        self.query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_query(&self, query: &str) {
        *self.query.lock().unwrap_or_else(PoisonError::into_inner) = query.to_string();
        self.state.send_modify(|s| s.query = query.to_string());
    }

    fn clear_results(&self) {
        self.state.send_modify(|s| {
            s.results.clear();
            s.show_empty_state = false;
        });
    }

    /// Match `term` against the loaded shops unless the query has moved on.
    fn perform_search(&self, term: &str) {
        let trimmed = term.trim();
        if self.current_query().trim() != trimmed {
            tracing::trace!(term = trimmed, "dropping stale search");
            return;
        }
        if searchable(trimmed).is_none() {
            self.clear_results();
            return;
        }

        let matches: Vec<ShopModel> = self
            .shops
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|shop| matches_shop(shop, trimmed))
            .cloned()
            .collect();
        tracing::debug!(term = trimmed, matches = matches.len(), "search complete");

        if !matches.is_empty() {
            if let Err(e) = self.history.add(trimmed) {
                tracing::warn!(error = %e, "failed to record search term");
            }
        }
        self.state.send_modify(|s| {
            s.show_empty_state = matches.is_empty();
            s.results = matches;
        });
    }
}
