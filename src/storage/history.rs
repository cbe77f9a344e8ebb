//! Recent search terms.
//!
//! Terms are unique case-insensitively: adding a term removes any existing
//! variant first, so the re-added term moves to the front with a fresh
//! timestamp. The list is trimmed to the configured limit after every insert.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;
use serde::Serialize;

use crate::error::Result;
use crate::storage::db::Database;

/// Default number of terms kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// One stored search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHistoryEntry {
    pub term: String,
    pub created_at: DateTime<Utc>,
}

/// Search history operations.
pub trait SearchHistoryRepository: Send + Sync {
    /// Terms, most recent first. Read failures yield an empty list.
    fn fetch_terms(&self) -> Vec<String>;

    /// Record `term` (trimmed). Blank terms are ignored.
    ///
    /// # Errors
    /// Returns an error if the database write fails.
    fn add(&self, term: &str) -> Result<()>;

    /// Remove every entry matching any of `terms`, ignoring case. Returns the
    /// number of rows removed.
    ///
    /// # Errors
    /// Returns an error if the database write fails.
    fn delete(&self, terms: &[String]) -> Result<usize>;

    /// Remove everything.
    ///
    /// # Errors
    /// Returns an error if the database write fails.
    fn clear(&self) -> Result<usize>;
}

/// [`SearchHistoryRepository`] on the `search_history` table.
#[derive(Debug, Clone)]
pub struct SearchHistoryStore {
    db: Database,
    limit: usize,
}

impl SearchHistoryStore {
    /// A store keeping at most `limit` terms (at least one).
    #[must_use]
    pub fn new(db: Database, limit: usize) -> Self {
        Self {
            db,
            limit: limit.max(1),
        }
    }

    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Entries with timestamps, most recent first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn entries(&self) -> Result<Vec<SearchHistoryEntry>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT term, created_at FROM search_history ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (term, created_at) = row?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map(|ts| ts.with_timezone(&Utc))
                .unwrap_or_default();
            entries.push(SearchHistoryEntry { term, created_at });
        }
        Ok(entries)
    }
}

impl SearchHistoryRepository for SearchHistoryStore {
    fn fetch_terms(&self) -> Vec<String> {
        match self.entries() {
            Ok(entries) => entries.into_iter().map(|e| e.term).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read search history");
                Vec::new()
            }
        }
    }

    fn add(&self, term: &str) -> Result<()> {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        let removed = delete_matching(&tx, &[trimmed.to_string()])?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        tx.execute(
            "INSERT INTO search_history (term, created_at) VALUES (?1, ?2)",
            params![trimmed, now],
        )?;
        let limit = i64::try_from(self.limit).unwrap_or(i64::MAX);
        let evicted = tx.execute(
            "DELETE FROM search_history WHERE id NOT IN (\
                SELECT id FROM search_history ORDER BY created_at DESC, id DESC LIMIT ?1\
            )",
            [limit],
        )?;
        tx.commit()?;

        tracing::debug!(term = trimmed, replaced = removed, evicted, "recorded search term");
        Ok(())
    }

    fn delete(&self, terms: &[String]) -> Result<usize> {
        let mut conn = self.db.lock();
        let tx = conn.transaction()?;
        let removed = delete_matching(&tx, terms)?;
        tx.commit()?;
        Ok(removed)
    }

    fn clear(&self) -> Result<usize> {
        let removed = self.db.lock().execute("DELETE FROM search_history", [])?;
        tracing::info!(removed, "cleared search history");
        Ok(removed)
    }
}

/// Delete rows whose term equals any of `terms` ignoring case.
///
/// Compared in Rust so non-ASCII case folding matches `str::to_lowercase`.
fn delete_matching(conn: &rusqlite::Connection, terms: &[String]) -> Result<usize> {
    let wanted: Vec<String> = terms.iter().map(|t| t.trim().to_lowercase()).collect();
    if wanted.is_empty() {
        return Ok(0);
    }

    let ids: Vec<i64> = {
        let mut stmt = conn.prepare_cached("SELECT id, term FROM search_history")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
        let mut ids = Vec::new();
        for row in rows {
            let (id, term) = row?;
            if wanted.contains(&term.to_lowercase()) {
                ids.push(id);
            }
        }
        ids
    };

    let mut removed = 0;
    for id in ids {
        removed += conn.execute("DELETE FROM search_history WHERE id = ?1", [id])?;
    }
    Ok(removed)
}
