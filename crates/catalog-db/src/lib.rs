//! Database layer for the catalog.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization
//! and embedded SQL migrations. The `categories` and `products` tables are
//! only ever created through the versioned migrations in this crate.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: the catalog is a single local file. WAL lets
//!   page renders read while a form submission writes.
//! - **`r2d2` connection pool**: bounded connection reuse for the blocking
//!   tasks the HTTP handlers spawn.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, so the schema always matches the queries that use it.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
