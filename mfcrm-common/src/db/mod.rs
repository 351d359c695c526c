//! Database schema management and per-entity queries

pub mod contacts;
pub mod deal_roles;
pub mod deals;
pub mod init;
pub mod migrations;
pub mod owners;
pub mod properties;
pub mod schema_sync;
pub mod search;
pub mod table_schemas;
pub mod tasks;
pub mod touchpoints;

pub use init::{init_database, prepare_schema};

/// Escape `%`, `_` and `\` for a LIKE pattern using `ESCAPE '\'`
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Shared in-memory database for unit tests
#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    init_database("sqlite::memory:")
        .await
        .expect("in-memory database should initialize")
}
