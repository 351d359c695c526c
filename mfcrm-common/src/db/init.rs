//! Database initialization
//!
//! Opens (or creates) the SQLite database and brings its schema up to
//! date in four phases:
//! 1. `schema_version` bookkeeping table
//! 2. Declarative schema sync (create tables, add missing columns)
//! 3. Versioned data migrations
//! 4. Secondary indexes

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open a database from a `sqlite:` URL and prepare its schema
pub async fn init_database(url: &str) -> Result<SqlitePool> {
    let in_memory = url.contains(":memory:") || url.contains("mode=memory");

    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    // Each connection to an in-memory database is a separate database, so the
    // pool keeps exactly one connection alive for its whole lifetime.
    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options.journal_mode(SqliteJournalMode::Wal))
            .await?
    };

    info!("Opened database {}", url);

    prepare_schema(&pool).await?;
    Ok(pool)
}

/// Bring an open database up to the current schema (idempotent)
pub async fn prepare_schema(pool: &SqlitePool) -> Result<()> {
    crate::db::migrations::create_schema_version_table(pool).await?;
    crate::db::table_schemas::sync_all_table_schemas(pool).await?;
    crate::db::migrations::run_migrations(pool).await?;
    crate::db::table_schemas::create_indexes(pool).await?;
    Ok(())
}
