//! Versioned data migrations
//!
//! Column additions are handled by schema sync; this module covers data
//! fix-ups that cannot be expressed declaratively. Each migration must be
//! idempotent, and existing migrations are never edited once released.
//!
//! Applied versions are recorded in `schema_version`.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Highest migration this build knows about
pub const CURRENT_SCHEMA_VERSION: i64 = 4;

pub async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Latest applied version, 0 for a database that has never been migrated
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i64> {
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run every migration newer than the recorded version
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current = get_schema_version(pool).await?;

    if current == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current);
        return Ok(());
    }

    if current > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than this build ({}); leaving it untouched",
            current, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current, CURRENT_SCHEMA_VERSION
    );

    if current < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    if current < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
    }

    if current < 3 {
        migrate_v3(pool).await?;
        set_schema_version(pool, 3).await?;
    }

    if current < 4 {
        migrate_v4(pool).await?;
        set_schema_version(pool, 4).await?;
    }

    info!("All migrations completed");
    Ok(())
}

/// v1: properties created before names were required display blank; name
/// now defaults to the street address.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    let result = sqlx::query(
        "UPDATE properties SET name = address WHERE name IS NULL OR TRIM(name) = ''",
    )
    .execute(pool)
    .await?;

    info!(
        "Migration v1: backfilled {} property name(s) from address",
        result.rows_affected()
    );
    Ok(())
}

/// Legacy spellings written by older forms, mapped to wire values.
/// Matching is case-insensitive with spaces and dashes folded to underscores.
const STAGE_ALIASES: &[(&str, &str)] = &[
    ("lead", "Lead"),
    ("new", "Lead"),
    ("contacted", "Contacted"),
    ("underwriting", "Underwriting"),
    ("loi_sent", "LOI_Sent"),
    ("loi", "LOI_Sent"),
    ("loi_accepted", "LOI_Accepted"),
    ("psa", "PSA"),
    ("under_contract", "PSA"),
    ("closed_won", "Closed_Won"),
    ("won", "Closed_Won"),
    ("closed_lost", "Closed_Lost"),
    ("lost", "Closed_Lost"),
    ("dead", "Closed_Lost"),
];

const STATUS_ALIASES: &[(&str, &str)] = &[
    ("open", "Open"),
    ("done", "Done"),
    ("complete", "Done"),
    ("completed", "Done"),
    ("snoozed", "Snoozed"),
];

const PRIORITY_ALIASES: &[(&str, &str)] = &[
    ("low", "Low"),
    ("medium", "Medium"),
    ("normal", "Medium"),
    ("high", "High"),
    ("urgent", "High"),
];

const TOUCHPOINT_ALIASES: &[(&str, &str)] = &[
    ("call", "Call"),
    ("phone", "Call"),
    ("email", "Email"),
    ("e_mail", "Email"),
    ("text", "Text"),
    ("sms", "Text"),
    ("meeting", "Meeting"),
    ("note", "Note"),
];

const ROLE_ALIASES: &[(&str, &str)] = &[
    ("listing_broker", "Listing_Broker"),
    ("broker", "Listing_Broker"),
    ("owner", "Owner"),
    ("property_manager", "Property_Manager"),
    ("manager", "Property_Manager"),
    ("lender", "Lender"),
    ("vendor", "Vendor"),
    ("other", "Other"),
];

/// SQL expression folding a column to its alias key
fn fold_key(column: &str) -> String {
    format!(
        "LOWER(REPLACE(REPLACE(TRIM({}), ' ', '_'), '-', '_'))",
        column
    )
}

/// Rewrite aliases to canonical values; optionally force a fallback for
/// anything still unrecognised. Returns rows changed.
async fn normalize_column(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    aliases: &[(&str, &str)],
    fallback: Option<&str>,
) -> Result<u64> {
    let mut changed = 0;
    let key = fold_key(column);

    for (alias, canonical) in aliases {
        let sql = format!(
            "UPDATE {table} SET {column} = ? WHERE {key} = ? AND {column} <> ?"
        );
        changed += sqlx::query(&sql)
            .bind(canonical)
            .bind(alias)
            .bind(canonical)
            .execute(pool)
            .await?
            .rows_affected();
    }

    if let Some(fallback) = fallback {
        let mut canon: Vec<&str> = aliases.iter().map(|(_, c)| *c).collect();
        canon.sort_unstable();
        canon.dedup();
        let placeholders = vec!["?"; canon.len()].join(", ");
        let sql = format!(
            "UPDATE {table} SET {column} = ? WHERE {column} IS NULL OR {column} NOT IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql).bind(fallback);
        for value in canon {
            query = query.bind(value);
        }
        changed += query.execute(pool).await?.rows_affected();
    }

    Ok(changed)
}

/// v2: older forms accepted any text for enumerated columns.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    let stages = normalize_column(pool, "deals", "stage", STAGE_ALIASES, Some("Lead")).await?;
    let statuses = normalize_column(pool, "tasks", "status", STATUS_ALIASES, Some("Open")).await?;
    let priorities =
        normalize_column(pool, "tasks", "priority", PRIORITY_ALIASES, Some("Medium")).await?;
    let kinds = normalize_column(
        pool,
        "touchpoints",
        "touchpoint_type",
        TOUCHPOINT_ALIASES,
        Some("Note"),
    )
    .await?;
    let roles =
        normalize_column(pool, "deal_contact_roles", "role", ROLE_ALIASES, Some("Other")).await?;

    info!(
        "Migration v2: normalized {} stage, {} status, {} priority, {} touchpoint type, {} role value(s)",
        stages, statuses, priorities, kinds, roles
    );
    Ok(())
}

/// v3: drop duplicate link rows (keeping the oldest) so the unique indexes
/// on property_owners and deal_contact_roles can be created.
async fn migrate_v3(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;

    let owners = sqlx::query(
        r#"
        DELETE FROM property_owners
        WHERE id NOT IN (
            SELECT MIN(id) FROM property_owners GROUP BY property_id, contact_id
        )
        "#,
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let roles = sqlx::query(
        r#"
        DELETE FROM deal_contact_roles
        WHERE id NOT IN (
            SELECT MIN(id) FROM deal_contact_roles GROUP BY deal_id, contact_id, role
        )
        "#,
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    info!(
        "Migration v3: removed {} duplicate owner link(s), {} duplicate deal role(s)",
        owners, roles
    );
    Ok(())
}

/// Tables with an `updated_at` column next to `created_at`
const UPDATED_TABLES: &[&str] = &["contacts", "properties", "deals", "tasks"];

/// Tables carrying only `created_at`
const CREATED_ONLY_TABLES: &[&str] = &["property_owners", "deal_contact_roles", "touchpoints"];

/// v4: the first release declared created_at/updated_at nullable and some
/// rows were written without them.
async fn migrate_v4(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;
    let mut filled = 0;

    for table in UPDATED_TABLES {
        let sql = format!(
            "UPDATE {table} SET created_at = COALESCE(NULLIF(TRIM(updated_at), ''), CURRENT_TIMESTAMP) \
             WHERE created_at IS NULL OR TRIM(created_at) = ''"
        );
        filled += sqlx::query(&sql).execute(&mut *tx).await?.rows_affected();
    }

    for table in CREATED_ONLY_TABLES {
        let sql = format!(
            "UPDATE {table} SET created_at = CURRENT_TIMESTAMP \
             WHERE created_at IS NULL OR TRIM(created_at) = ''"
        );
        filled += sqlx::query(&sql).execute(&mut *tx).await?.rows_affected();
    }

    for table in UPDATED_TABLES {
        let sql = format!(
            "UPDATE {table} SET updated_at = created_at \
             WHERE updated_at IS NULL OR TRIM(updated_at) = ''"
        );
        filled += sqlx::query(&sql).execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;

    info!("Migration v4: backfilled {} missing timestamp(s)", filled);
    Ok(())
}
