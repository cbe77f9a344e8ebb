//! Single-row snapshot cache.
//!
//! Each cache type owns one row in `cached_snapshots`, keyed by a fixed id.
//! `save` overwrites that row in place; there is never more than one.
//!
//! The cache is advisory: a row that fails to decode reads as absent.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::models::HomeResponse;
use crate::error::Result;
use crate::storage::db::Database;

/// Row id of the home document snapshot.
pub const HOME_SNAPSHOT_ID: &str = "home";

/// Persisted last-known value of one remote payload.
pub trait SnapshotRepository<T>: Send + Sync {
    /// The stored value, or `None` if never written or undecodable.
    fn fetch_cached(&self) -> Option<T>;

    /// Replace the stored value and bump its timestamp.
    ///
    /// # Errors
    /// Returns an error if encoding or the database write fails.
    fn save(&self, value: &T) -> Result<()>;

    /// When the stored value was last written.
    fn last_updated(&self) -> Option<DateTime<Utc>>;
}

/// [`SnapshotRepository`] backed by the `cached_snapshots` table.
pub struct SqliteSnapshotRepository<T> {
    db: Database,
    id: String,
    _payload: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for SqliteSnapshotRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSnapshotRepository")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<T> SqliteSnapshotRepository<T> {
    #[must_use]
    pub fn new(db: Database, id: impl Into<String>) -> Self {
        Self {
            db,
            id: id.into(),
            _payload: PhantomData,
        }
    }

    /// Number of snapshot rows across every cache type.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn snapshot_count(&self) -> Result<usize> {
        let count: i64 = self
            .db
            .lock()
            .query_row("SELECT COUNT(*) FROM cached_snapshots", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl SqliteSnapshotRepository<HomeResponse> {
    /// The home document cache.
    #[must_use]
    pub fn home(db: Database) -> Self {
        Self::new(db, HOME_SNAPSHOT_ID)
    }
}

impl<T> SnapshotRepository<T> for SqliteSnapshotRepository<T>
where
    T: Serialize + DeserializeOwned,
{
    fn fetch_cached(&self) -> Option<T> {
        let row: Option<Vec<u8>> = match self
            .db
            .lock()
            .query_row(
                "SELECT payload FROM cached_snapshots WHERE id = ?1",
                [&self.id],
                |row| row.get(0),
            )
            .optional()
        {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "failed to read snapshot");
                return None;
            }
        };

        let payload = row?;
        match serde_json::from_slice(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "discarding undecodable snapshot");
                None
            }
        }
    }

    fn save(&self, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        let now = Utc::now().to_rfc3339();
        self.db.lock().execute(
            "INSERT INTO cached_snapshots (id, payload, last_updated) VALUES (?1, ?2, ?3) \
             ON CONFLICT(id) DO UPDATE SET \
                payload = excluded.payload, \
                last_updated = excluded.last_updated",
            params![self.id, payload, now],
        )?;
        tracing::debug!(id = %self.id, bytes = payload.len(), "saved snapshot");
        Ok(())
    }

    fn last_updated(&self) -> Option<DateTime<Utc>> {
        let raw: String = self
            .db
            .lock()
            .query_row(
                "SELECT last_updated FROM cached_snapshots WHERE id = ?1",
                [&self.id],
                |row| row.get(0),
            )
            .optional()
            .ok()
            .flatten()?;
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_test_home_response;

    fn repo() -> SqliteSnapshotRepository<HomeResponse> {
        SqliteSnapshotRepository::home(Database::open_in_memory().unwrap())
    }

    #[test]
    fn empty_cache_reads_none() {
        let repo = repo();
        assert!(repo.fetch_cached().is_none());
        assert!(repo.last_updated().is_none());
    }

    #[test]
    fn save_then_fetch() {
        let repo = repo();
        let response = make_test_home_response(&["Test Shop"]);
        repo.save(&response).unwrap();

        assert_eq!(repo.fetch_cached(), Some(response));
        assert!(repo.last_updated().is_some());
    }

    #[test]
    fn save_overwrites_single_row() {
        let repo = repo();
        repo.save(&make_test_home_response(&["Old Shop"])).unwrap();
        let first = repo.last_updated().unwrap();
        repo.save(&make_test_home_response(&["New Shop"])).unwrap();

        assert_eq!(repo.snapshot_count().unwrap(), 1);
        assert_eq!(repo.fetch_cached().unwrap().shops[0].title, "New Shop");
        assert!(repo.last_updated().unwrap() >= first);
    }

    #[test]
    fn undecodable_row_reads_none() {
        let db = Database::open_in_memory().unwrap();
        db.lock()
            .execute(
                "INSERT INTO cached_snapshots (id, payload, last_updated) VALUES ('home', X'7B7D', '2026-01-01T00:00:00Z')",
                [],
            )
            .unwrap();
        let repo = SqliteSnapshotRepository::<HomeResponse>::home(db);
        assert!(repo.fetch_cached().is_none());
    }

    #[test]
    fn separate_ids_do_not_collide() {
        let db = Database::open_in_memory().unwrap();
        let a = SqliteSnapshotRepository::<Vec<String>>::new(db.clone(), "a");
        let b = SqliteSnapshotRepository::<Vec<String>>::new(db, "b");
        a.save(&vec!["x".to_string()]).unwrap();

        assert_eq!(a.fetch_cached(), Some(vec!["x".to_string()]));
        assert_eq!(b.fetch_cached(), None);
        assert_eq!(a.snapshot_count().unwrap(), 1);
    }
}
