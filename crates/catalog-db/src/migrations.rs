//! Embedded SQL migration runner.
//!
//! Migrations are SQL files embedded at compile time. They run sequentially
//! on startup, tracked by the `_catalog_migrations` table. A migration that
//! is already recorded there is skipped.

use rusqlite::Connection;
use std::collections::HashSet;
use thiserror::Error;

/// A single embedded migration.
struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. New migrations are appended here.
const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001_categories",
        sql: include_str!("migrations/001_categories.sql"),
    },
    Migration {
        name: "002_products",
        sql: include_str!("migrations/002_products.sql"),
    },
];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A SQL statement within a migration failed.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// The name of the migration that failed.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to query migration state.
    #[error("failed to check migration state: {0}")]
    StateQuery(rusqlite::Error),
}

/// Runs all pending migrations against the given connection.
///
/// Returns the number of migrations applied by this call.
///
/// # Errors
///
/// Returns `MigrationError` if any migration fails to execute or if the
/// migration tracking table cannot be queried.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    run_migrations_from_list(conn, MIGRATIONS)
}

fn run_migrations_from_list(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<usize, MigrationError> {
    ensure_tracking_table(conn)?;
    let done = applied_names(conn)?;

    let pending: Vec<&Migration> = migrations
        .iter()
        .filter(|m| !done.contains(m.name))
        .collect();
    if pending.is_empty() {
        tracing::debug!(known = done.len(), "catalog schema is up to date");
        return Ok(0);
    }

    for migration in &pending {
        apply_migration(conn, migration)?;
    }
    Ok(pending.len())
}

fn ensure_tracking_table(conn: &Connection) -> Result<(), MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _catalog_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|source| MigrationError::ExecutionFailed {
        name: "_catalog_migrations".to_string(),
        source,
    })
}

/// Names already recorded in `_catalog_migrations`.
fn applied_names(conn: &Connection) -> Result<HashSet<String>, MigrationError> {
    let mut stmt = conn
        .prepare("SELECT name FROM _catalog_migrations")
        .map_err(MigrationError::StateQuery)?;
    let names = stmt
        .query_map([], |row| row.get(0))
        .map_err(MigrationError::StateQuery)?
        .collect::<rusqlite::Result<HashSet<String>>>()
        .map_err(MigrationError::StateQuery)?;
    Ok(names)
}

/// Runs one migration and records it; a failure leaves no trace of either.
fn apply_migration(conn: &Connection, migration: &Migration) -> Result<(), MigrationError> {
    tracing::info!(migration = migration.name, "applying catalog migration");

    let failed = |source: rusqlite::Error| MigrationError::ExecutionFailed {
        name: migration.name.to_string(),
        source,
    };

    let tx = conn.unchecked_transaction().map_err(failed)?;
    tx.execute_batch(migration.sql).map_err(failed)?;
    tx.execute(
        "INSERT INTO _catalog_migrations (name) VALUES (?1)",
        [migration.name],
    )
    .map_err(failed)?;
    tx.commit().map_err(failed)
}
