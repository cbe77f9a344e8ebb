//! Test fixtures: home payloads, token grants, and storage builders.
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};

use shopdir::core::auth::{AuthSessionManager, SessionSignal, TokenRefresher};
use shopdir::storage::db::Database;
use shopdir::storage::session::SessionStore;
use shopdir::storage::token_store::PreferenceStorage;

// =============================================================================
// Home payloads
// =============================================================================

/// A home document listing one shop per `(id, title, tags)` in a single
/// shop section.
#[must_use]
pub fn home_json(shops: &[(&str, &str, &[&str])]) -> Value {
    let shop_values: Vec<Value> = shops
        .iter()
        .map(|(id, title, tags)| {
            json!({
                "id": id,
                "title": title,
                "iconUrl": format!("https://cdn.example.com/{id}.png"),
                "tags": tags,
            })
        })
        .collect();
    let ids: Vec<&str> = shops.iter().map(|(id, _, _)| *id).collect();

    json!({
        "home": {
            "search": true,
            "sections": [
                {"title": "Categories", "type": "CATEGORY", "list": ["cat-1"]},
                {"title": "Shops", "type": "SHOP", "list": ids},
            ]
        },
        "categories": [
            {"id": "cat-1", "title": "Food", "iconUrl": "https://cdn.example.com/food.png"}
        ],
        "shops": shop_values,
        "banners": [],
    })
}

/// Token endpoint response body.
#[must_use]
pub fn grant_json(access: &str, refresh: Option<&str>, expires_in: u64) -> Value {
    let mut body = json!({"accessToken": access, "expiresIn": expires_in});
    if let Some(refresh) = refresh {
        body["refreshToken"] = json!(refresh);
    }
    body
}

// =============================================================================
// Storage builders
// =============================================================================

#[must_use]
pub fn memory_db() -> Database {
    Database::open_in_memory().expect("in-memory database")
}

#[must_use]
pub fn memory_session_store() -> SessionStore {
    SessionStore::new(Arc::new(PreferenceStorage::in_memory()))
}

/// Session manager over an in-memory store.
#[must_use]
pub fn session_manager(
    store: SessionStore,
    refresher: Arc<dyn TokenRefresher>,
) -> (AuthSessionManager, SessionSignal) {
    let signal = SessionSignal::new();
    let manager = AuthSessionManager::new(store, refresher, signal.clone());
    (manager, signal)
}
