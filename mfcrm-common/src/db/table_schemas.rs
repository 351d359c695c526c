//! Table schema definitions
//!
//! Single source of truth for every CRM table. Columns added in later
//! releases carry a comment; older databases receive them through
//! [`sync_all_table_schemas`].

use crate::db::schema_sync::{sync_table, ColumnDef, OnDelete, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

pub struct ContactsTable;

impl TableSchema for ContactsTable {
    fn table_name() -> &'static str {
        "contacts"
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", "INTEGER").primary_key(),
            ColumnDef::new("name", "TEXT").not_null(),
            ColumnDef::new("company", "TEXT"),
            ColumnDef::new("role_type", "TEXT"),
            ColumnDef::new("phone", "TEXT"),
            ColumnDef::new("email", "TEXT"),
            ColumnDef::new("notes", "TEXT"),
            // Added with tag filtering
            ColumnDef::new("tags", "TEXT"),
            ColumnDef::new("created_at", "TIMESTAMP").not_null().default("CURRENT_TIMESTAMP"),
            ColumnDef::new("updated_at", "TIMESTAMP").not_null().default("CURRENT_TIMESTAMP"),
        ]
    }
}

pub struct PropertiesTable;

impl TableSchema for PropertiesTable {
    fn table_name() -> &'static str {
        "properties"
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", "INTEGER").primary_key(),
            ColumnDef::new("name", "TEXT"),
            ColumnDef::new("address", "TEXT").not_null(),
            ColumnDef::new("city", "TEXT"),
            ColumnDef::new("state", "TEXT"),
            ColumnDef::new("zip_code", "TEXT"),
            ColumnDef::new("units", "INTEGER"),
            ColumnDef::new("year_built", "INTEGER"),
            ColumnDef::new("property_class", "TEXT"),
            // Valuation and scoring columns arrived after the first release
            ColumnDef::new("estimated_value_min", "REAL"),
            ColumnDef::new("estimated_value_max", "REAL"),
            ColumnDef::new("buyer_interest", "INTEGER"),
            ColumnDef::new("seller_motivation", "INTEGER"),
            ColumnDef::new("notes", "TEXT"),
            ColumnDef::new("created_at", "TIMESTAMP").not_null().default("CURRENT_TIMESTAMP"),
            ColumnDef::new("updated_at", "TIMESTAMP").not_null().default("CURRENT_TIMESTAMP"),
        ]
    }
}

pub struct PropertyOwnersTable;

impl TableSchema for PropertyOwnersTable {
    fn table_name() -> &'static str {
        "property_owners"
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", "INTEGER").primary_key(),
            ColumnDef::new("property_id", "INTEGER")
                .not_null()
                .references("properties", OnDelete::Cascade),
            ColumnDef::new("contact_id", "INTEGER")
                .not_null()
                .references("contacts", OnDelete::Cascade),
            ColumnDef::new("ownership_percentage", "REAL"),
            ColumnDef::new("notes", "TEXT"),
            ColumnDef::new("created_at", "TIMESTAMP").not_null().default("CURRENT_TIMESTAMP"),
        ]
    }
}

pub struct DealsTable;

impl TableSchema for DealsTable {
    fn table_name() -> &'static str {
        "deals"
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", "INTEGER").primary_key(),
            ColumnDef::new("deal_name", "TEXT").not_null(),
            // Properties with deals cannot be deleted; RESTRICT backs up the handler check
            ColumnDef::new("property_id", "INTEGER")
                .not_null()
                .references("properties", OnDelete::Restrict),
            ColumnDef::new("stage", "TEXT").not_null().default("'Lead'"),
            ColumnDef::new("target_close_date", "DATE"),
            ColumnDef::new("asking_price", "REAL"),
            ColumnDef::new("links", "TEXT"),
            ColumnDef::new("notes", "TEXT"),
            ColumnDef::new("created_at", "TIMESTAMP").not_null().default("CURRENT_TIMESTAMP"),
            ColumnDef::new("updated_at", "TIMESTAMP").not_null().default("CURRENT_TIMESTAMP"),
        ]
    }
}

pub struct DealContactRolesTable;

impl TableSchema for DealContactRolesTable {
    fn table_name() -> &'static str {
        "deal_contact_roles"
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", "INTEGER").primary_key(),
            ColumnDef::new("deal_id", "INTEGER")
                .not_null()
                .references("deals", OnDelete::Cascade),
            ColumnDef::new("contact_id", "INTEGER")
                .not_null()
                .references("contacts", OnDelete::Restrict),
            ColumnDef::new("role", "TEXT").not_null(),
            ColumnDef::new("notes", "TEXT"),
            ColumnDef::new("created_at", "TIMESTAMP").not_null().default("CURRENT_TIMESTAMP"),
        ]
    }
}

pub struct TouchpointsTable;

impl TableSchema for TouchpointsTable {
    fn table_name() -> &'static str {
        "touchpoints"
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", "INTEGER").primary_key(),
            ColumnDef::new("deal_id", "INTEGER").references("deals", OnDelete::Cascade),
            ColumnDef::new("contact_id", "INTEGER").references("contacts", OnDelete::Cascade),
            ColumnDef::new("touchpoint_type", "TEXT").not_null(),
            ColumnDef::new("occurred_at", "TIMESTAMP").not_null().default("CURRENT_TIMESTAMP"),
            ColumnDef::new("summary", "TEXT").not_null(),
            ColumnDef::new("next_step", "TEXT"),
            ColumnDef::new("created_at", "TIMESTAMP").not_null().default("CURRENT_TIMESTAMP"),
        ]
    }
}

pub struct TasksTable;

impl TableSchema for TasksTable {
    fn table_name() -> &'static str {
        "tasks"
    }

    fn columns() -> Vec<ColumnDef> {
        vec![
            ColumnDef::new("id", "INTEGER").primary_key(),
            ColumnDef::new("description", "TEXT").not_null(),
            ColumnDef::new("due_date", "DATE").not_null(),
            ColumnDef::new("status", "TEXT").not_null().default("'Open'"),
            ColumnDef::new("priority", "TEXT").not_null().default("'Medium'"),
            ColumnDef::new("deal_id", "INTEGER").references("deals", OnDelete::Cascade),
            ColumnDef::new("contact_id", "INTEGER").references("contacts", OnDelete::Cascade),
            // Property links were added after deal/contact links
            ColumnDef::new("property_id", "INTEGER").references("properties", OnDelete::SetNull),
            ColumnDef::new("completed_at", "TIMESTAMP"),
            ColumnDef::new("created_at", "TIMESTAMP").not_null().default("CURRENT_TIMESTAMP"),
            ColumnDef::new("updated_at", "TIMESTAMP").not_null().default("CURRENT_TIMESTAMP"),
        ]
    }
}

/// Secondary indexes, created after migrations have removed duplicate links
pub const INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_property_owners_unique ON property_owners(property_id, contact_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_deal_contact_roles_unique ON deal_contact_roles(deal_id, contact_id, role)",
    "CREATE INDEX IF NOT EXISTS idx_deals_property ON deals(property_id)",
    "CREATE INDEX IF NOT EXISTS idx_deals_stage ON deals(stage)",
    "CREATE INDEX IF NOT EXISTS idx_touchpoints_contact ON touchpoints(contact_id, occurred_at)",
    "CREATE INDEX IF NOT EXISTS idx_touchpoints_deal ON touchpoints(deal_id, occurred_at)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_status_due ON tasks(status, due_date)",
];

/// Create missing tables and add missing columns, parents before children
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    info!("Synchronizing table schemas");

    let reports = [
        ("contacts", sync_table::<ContactsTable>(pool).await?),
        ("properties", sync_table::<PropertiesTable>(pool).await?),
        ("property_owners", sync_table::<PropertyOwnersTable>(pool).await?),
        ("deals", sync_table::<DealsTable>(pool).await?),
        ("deal_contact_roles", sync_table::<DealContactRolesTable>(pool).await?),
        ("touchpoints", sync_table::<TouchpointsTable>(pool).await?),
        ("tasks", sync_table::<TasksTable>(pool).await?),
    ];

    let added: usize = reports.iter().map(|(_, r)| r.added_columns.len()).sum();
    let unresolved: usize = reports.iter().map(|(_, r)| r.unresolved).sum();
    if added > 0 || unresolved > 0 {
        info!(
            "Schema sync added {} column(s); {} drift item(s) need manual migration",
            added, unresolved
        );
    }

    Ok(())
}

/// Create secondary indexes
pub async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    for sql in INDEXES {
        sqlx::query(sql).execute(pool).await?;
    }
    Ok(())
}
