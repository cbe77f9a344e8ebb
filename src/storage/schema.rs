//! Database schema and migrations.
//!
//! Versions are recorded in `schema_migrations`; each pending migration runs
//! in its own transaction.

use anyhow::Context;
use rusqlite::Connection;

use crate::error::Result;

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("../../migrations/001_cached_snapshots.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("../../migrations/002_search_history.sql"),
    },
];

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: i32,
    sql: &'static str,
}

/// Bring the schema up to date and return the resulting version.
///
/// # Errors
/// Returns an error if reading the schema version or applying any migration
/// fails.
pub fn run_migrations(conn: &mut Connection) -> Result<i32> {
    run_pending(conn, MIGRATIONS)
}

/// Latest version this build knows about.
#[must_use]
pub fn latest_version() -> i32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

fn run_pending(conn: &mut Connection, migrations: &[Migration]) -> Result<i32> {
    ensure_schema_migrations_table(conn)?;
    let start = schema_version(conn)?;

    let mut current = start;
    for migration in migrations.iter().filter(|m| m.version > start) {
        apply_migration(conn, migration)?;
        current = migration.version;
    }
    Ok(current)
}

fn ensure_schema_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (\
            version INTEGER PRIMARY KEY,\
            applied_at TEXT DEFAULT (datetime('now'))\
        );",
    )
    .context("create schema_migrations")?;
    Ok(())
}

fn schema_version(conn: &Connection) -> Result<i32> {
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
        .context("read schema version")?;
    Ok(version.unwrap_or(0))
}

fn apply_migration(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let tx = conn.transaction().context("begin migration")?;
    tx.execute_batch(migration.sql)
        .with_context(|| format!("apply migration {}", migration.version))?;
    tx.execute(
        "INSERT INTO schema_migrations (version) VALUES (?1)",
        [migration.version],
    )
    .with_context(|| format!("record migration {}", migration.version))?;
    tx.commit()
        .with_context(|| format!("commit migration {}", migration.version))?;
    tracing::debug!(version = migration.version, "applied migration");
    Ok(())
}
