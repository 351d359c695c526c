//! Declarative table schemas and automatic column sync
//!
//! Every table is described once, as a list of [`ColumnDef`]s. The same
//! description renders the `CREATE TABLE` statement for fresh databases and
//! drives in-place patching of older databases:
//!
//! 1. `CREATE TABLE IF NOT EXISTS` from the definition
//! 2. Compare `PRAGMA table_info` against the definition
//! 3. `ALTER TABLE ... ADD COLUMN` for anything missing
//!
//! Type and constraint drift is reported but never fixed automatically;
//! SQLite can only change those by rebuilding the table.
//!
//! ```rust,ignore
//! pub struct NotesTable;
//!
//! impl TableSchema for NotesTable {
//!     fn table_name() -> &'static str { "notes" }
//!
//!     fn columns() -> Vec<ColumnDef> {
//!         vec![
//!             ColumnDef::new("id", "INTEGER").primary_key(),
//!             ColumnDef::new("body", "TEXT").not_null(),
//!             ColumnDef::new("pinned", "INTEGER").not_null().default("0"), // new column
//!         ]
//!     }
//! }
//!
//! sync_table::<NotesTable>(&pool).await?;
//! ```

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};

/// Action taken on child rows when the referenced row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
    Restrict,
}

impl OnDelete {
    fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::Restrict => "RESTRICT",
        }
    }
}

/// Foreign key target of a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete: OnDelete,
}

/// Expected column with its SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: &'static str,
    /// SQL type (`TEXT`, `INTEGER`, `REAL`, `DATE`, `TIMESTAMP`)
    pub sql_type: &'static str,
    pub not_null: bool,
    /// Rendered as `INTEGER PRIMARY KEY AUTOINCREMENT` for integer columns
    pub primary_key: bool,
    pub unique: bool,
    /// Raw SQL default expression (`'Open'`, `CURRENT_TIMESTAMP`, `0`)
    pub default_value: Option<&'static str>,
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    pub fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            not_null: false,
            primary_key: false,
            unique: false,
            default_value: None,
            references: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default(mut self, expr: &'static str) -> Self {
        self.default_value = Some(expr);
        self
    }

    pub fn references(mut self, table: &'static str, on_delete: OnDelete) -> Self {
        self.references = Some(ForeignKey {
            table,
            column: "id",
            on_delete,
        });
        self
    }

    /// Column clause for `CREATE TABLE`
    pub fn create_clause(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
            if self.sql_type.eq_ignore_ascii_case("INTEGER") {
                sql.push_str(" AUTOINCREMENT");
            }
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = self.default_value {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if let Some(fk) = &self.references {
            sql.push_str(&format!(
                " REFERENCES {}({}) ON DELETE {}",
                fk.table,
                fk.column,
                fk.on_delete.as_sql()
            ));
        }
        sql
    }

    /// `ALTER TABLE ... ADD COLUMN` clause, downgraded to what SQLite allows.
    ///
    /// Returns the clause plus the constraints that had to be dropped. A
    /// non-constant default (`CURRENT_TIMESTAMP`, a parenthesised expression)
    /// is dropped along with NOT NULL; see [`ColumnDef::backfill_expr`].
    pub fn add_column_clause(&self) -> (String, Vec<&'static str>) {
        let mut dropped = Vec::new();
        let mut sql = format!("{} {}", self.name, self.sql_type);

        if self.primary_key {
            dropped.push("PRIMARY KEY");
        }
        if self.unique {
            dropped.push("UNIQUE");
        }

        let default = self.default_value.filter(|d| is_constant_default(d));
        if self.default_value.is_some() && default.is_none() {
            dropped.push("DEFAULT");
        }

        match (self.not_null, default) {
            (true, Some(default)) => sql.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (true, None) => dropped.push("NOT NULL"),
            (false, Some(default)) => sql.push_str(&format!(" DEFAULT {}", default)),
            (false, None) => {}
        }

        // SQLite accepts REFERENCES on an added column only when its default is NULL
        if let Some(fk) = &self.references {
            if default.is_none() {
                sql.push_str(&format!(
                    " REFERENCES {}({}) ON DELETE {}",
                    fk.table,
                    fk.column,
                    fk.on_delete.as_sql()
                ));
            } else {
                dropped.push("REFERENCES");
            }
        }

        (sql, dropped)
    }

    /// Default that ALTER TABLE cannot apply, to be written into existing
    /// rows once the column exists
    pub fn backfill_expr(&self) -> Option<&'static str> {
        self.default_value.filter(|d| !is_constant_default(d))
    }
}

/// ALTER TABLE ADD COLUMN only takes literal defaults
fn is_constant_default(expr: &str) -> bool {
    let expr = expr.trim();
    if expr.starts_with('(') {
        return false;
    }
    !["CURRENT_TIMESTAMP", "CURRENT_DATE", "CURRENT_TIME"]
        .iter()
        .any(|k| expr.eq_ignore_ascii_case(k))
}

/// Expected schema of one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    /// Column order is the order used for fresh tables
    fn columns() -> Vec<ColumnDef>;

    fn create_sql() -> String {
        let body = Self::columns()
            .iter()
            .map(|c| format!("    {}", c.create_clause()))
            .collect::<Vec<_>>()
            .join(",\n");
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            Self::table_name(),
            body
        )
    }
}

/// Column as reported by `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i64,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub pk: bool,
}

/// Difference between a definition and the live table
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDrift {
    /// Fixable with `ADD COLUMN`
    MissingColumn { table: String, column: ColumnDef },
    /// Needs a manual rebuild
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
    /// Needs a manual rebuild
    ConstraintMismatch {
        table: String,
        column: String,
        constraint: &'static str,
    },
}

/// Outcome of syncing one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub added_columns: Vec<String>,
    pub unresolved: usize,
}

pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?)",
    )
    .bind(table_name)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Read live columns, ordered by position
pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
    let rows = sqlx::query(
        "SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid",
    )
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    let columns = rows
        .iter()
        .map(|row| ActualColumn {
            cid: row.get("cid"),
            name: row.get("name"),
            type_name: row.get("type"),
            not_null: row.get::<i64, _>("notnull") != 0,
            default_value: row.get("dflt_value"),
            pk: row.get::<i64, _>("pk") != 0,
        })
        .collect();

    Ok(columns)
}

/// Compare a definition against the live columns
pub fn diff(table_name: &str, expected: &[ColumnDef], actual: &[ActualColumn]) -> Vec<SchemaDrift> {
    let mut drift = Vec::new();

    for col in expected {
        let Some(live) = actual.iter().find(|a| a.name.eq_ignore_ascii_case(col.name)) else {
            drift.push(SchemaDrift::MissingColumn {
                table: table_name.to_string(),
                column: col.clone(),
            });
            continue;
        };

        if !types_compatible(col.sql_type, &live.type_name) {
            drift.push(SchemaDrift::TypeMismatch {
                table: table_name.to_string(),
                column: col.name.to_string(),
                expected: col.sql_type.to_string(),
                actual: live.type_name.clone(),
            });
        }

        if col.primary_key && !live.pk {
            drift.push(SchemaDrift::ConstraintMismatch {
                table: table_name.to_string(),
                column: col.name.to_string(),
                constraint: "PRIMARY KEY",
            });
        }

        // PRAGMA reports notnull = 0 for INTEGER PRIMARY KEY even though it can never be NULL
        if col.not_null && !live.not_null && !live.pk {
            drift.push(SchemaDrift::ConstraintMismatch {
                table: table_name.to_string(),
                column: col.name.to_string(),
                constraint: "NOT NULL",
            });
        }
    }

    drift
}

/// SQLite type affinity of a declared type
fn affinity(sql_type: &str) -> &'static str {
    let t = sql_type.to_ascii_uppercase();
    if t.contains("INT") {
        "INTEGER"
    } else if t.contains("CHAR") || t.contains("CLOB") || t.contains("TEXT") {
        "TEXT"
    } else if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") {
        "REAL"
    } else if t.is_empty() || t.contains("BLOB") {
        "BLOB"
    } else {
        "NUMERIC"
    }
}

/// Same affinity, so values round-trip unchanged.
///
/// DATE/TIMESTAMP/NUMERIC columns written by older releases as TEXT are
/// accepted too: every date this crate stores is ISO-8601 text.
fn types_compatible(expected: &str, actual: &str) -> bool {
    let (exp, act) = (affinity(expected), affinity(actual));
    exp == act || (exp == "NUMERIC" && act == "TEXT") || (exp == "TEXT" && act == "NUMERIC")
}

/// Create the table if needed, then add any missing columns
pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<SyncReport> {
    let table = T::table_name();
    let expected = T::columns();

    if !table_exists(pool, table).await? {
        sqlx::query(&T::create_sql()).execute(pool).await?;
        info!("Created table '{}'", table);
        return Ok(SyncReport::default());
    }

    let actual = introspect_table(pool, table).await?;
    let drift = diff(table, &expected, &actual);

    if drift.is_empty() {
        debug!("Schema up to date for '{}'", table);
        return Ok(SyncReport::default());
    }

    let mut report = SyncReport::default();
    for item in drift {
        match item {
            SchemaDrift::MissingColumn { table, column } => {
                if add_column(pool, &table, &column).await? {
                    report.added_columns.push(column.name.to_string());
                }
            }
            SchemaDrift::TypeMismatch { table, column, expected, actual } => {
                warn!(
                    "Type mismatch in {}.{}: expected '{}', found '{}'. Manual migration required.",
                    table, column, expected, actual
                );
                report.unresolved += 1;
            }
            SchemaDrift::ConstraintMismatch { table, column, constraint } => {
                warn!(
                    "Constraint mismatch in {}.{}: missing '{}'. Manual migration required.",
                    table, column, constraint
                );
                report.unresolved += 1;
            }
        }
    }

    Ok(report)
}

/// Returns false when another connection added the column first
async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDef) -> Result<bool> {
    let (clause, dropped) = column.add_column_clause();
    for constraint in &dropped {
        warn!(
            "Adding {}.{} without {} (not supported by ALTER TABLE)",
            table, column.name, constraint
        );
    }

    let sql = format!("ALTER TABLE {} ADD COLUMN {}", table, clause);
    match sqlx::query(&sql).execute(pool).await {
        Ok(_) => {
            info!("Added column {}.{} ({})", table, column.name, column.sql_type);
            if let Some(expr) = column.backfill_expr() {
                let sql = format!(
                    "UPDATE {} SET {} = {} WHERE {} IS NULL",
                    table, column.name, expr, column.name
                );
                let filled = sqlx::query(&sql).execute(pool).await?.rows_affected();
                info!("Backfilled {}.{} = {} on {} row(s)", table, column.name, expr, filled);
            }
            Ok(true)
        }
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
            debug!("Column {}.{} already present", table, column.name);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    struct Widgets;

    impl TableSchema for Widgets {
        fn table_name() -> &'static str {
            "widgets"
        }

        fn columns() -> Vec<ColumnDef> {
            vec![
                ColumnDef::new("id", "INTEGER").primary_key(),
                ColumnDef::new("name", "TEXT").not_null(),
                ColumnDef::new("weight", "REAL"),
                ColumnDef::new("status", "TEXT").not_null().default("'new'"),
            ]
        }
    }

    #[test]
    fn test_create_clause() {
        let col = ColumnDef::new("deal_id", "INTEGER")
            .not_null()
            .references("deals", OnDelete::Cascade);
        assert_eq!(
            col.create_clause(),
            "deal_id INTEGER NOT NULL REFERENCES deals(id) ON DELETE CASCADE"
        );

        let pk = ColumnDef::new("id", "INTEGER").primary_key();
        assert_eq!(pk.create_clause(), "id INTEGER PRIMARY KEY AUTOINCREMENT");
    }

    #[test]
    fn test_add_column_clause_drops_unsupported_constraints() {
        let (sql, dropped) = ColumnDef::new("code", "TEXT").not_null().unique().add_column_clause();
        assert_eq!(sql, "code TEXT");
        assert_eq!(dropped, vec!["UNIQUE", "NOT NULL"]);

        let (sql, dropped) = ColumnDef::new("status", "TEXT")
            .not_null()
            .default("'Open'")
            .add_column_clause();
        assert_eq!(sql, "status TEXT NOT NULL DEFAULT 'Open'");
        assert!(dropped.is_empty());

        let (sql, dropped) = ColumnDef::new("property_id", "INTEGER")
            .references("properties", OnDelete::SetNull)
            .add_column_clause();
        assert_eq!(
            sql,
            "property_id INTEGER REFERENCES properties(id) ON DELETE SET NULL"
        );
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_add_column_clause_defers_non_constant_default() {
        let col = ColumnDef::new("updated_at", "TIMESTAMP")
            .not_null()
            .default("CURRENT_TIMESTAMP");
        let (sql, dropped) = col.add_column_clause();
        assert_eq!(sql, "updated_at TIMESTAMP");
        assert_eq!(dropped, vec!["DEFAULT", "NOT NULL"]);
        assert_eq!(col.backfill_expr(), Some("CURRENT_TIMESTAMP"));

        let expr = ColumnDef::new("stamp", "TEXT").default("(datetime('now'))");
        assert_eq!(expr.add_column_clause().0, "stamp TEXT");
        assert_eq!(expr.backfill_expr(), Some("(datetime('now'))"));

        let literal = ColumnDef::new("status", "TEXT").not_null().default("'Open'");
        assert_eq!(literal.backfill_expr(), None);
    }

    #[tokio::test]
    async fn test_sync_backfills_timestamp_column() {
        let pool = setup_test_db().await;
        sqlx::query("CREATE TABLE stamped (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO stamped (name) VALUES ('a'), ('b')")
            .execute(&pool)
            .await
            .unwrap();

        struct Stamped;
        impl TableSchema for Stamped {
            fn table_name() -> &'static str {
                "stamped"
            }
            fn columns() -> Vec<ColumnDef> {
                vec![
                    ColumnDef::new("id", "INTEGER").primary_key(),
                    ColumnDef::new("name", "TEXT").not_null(),
                    ColumnDef::new("updated_at", "TIMESTAMP")
                        .not_null()
                        .default("CURRENT_TIMESTAMP"),
                ]
            }
        }

        let report = sync_table::<Stamped>(&pool).await.unwrap();
        assert_eq!(report.added_columns, vec!["updated_at"]);

        let missing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stamped WHERE updated_at IS NULL")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(missing, 0);

        // The NOT NULL that could not be added is reported, not fatal
        let again = sync_table::<Stamped>(&pool).await.unwrap();
        assert!(again.added_columns.is_empty());
        assert_eq!(again.unresolved, 1);
    }

    #[test]
    fn test_types_compatible() {
        assert!(types_compatible("TEXT", "VARCHAR(200)"));
        assert!(types_compatible("INTEGER", "INT"));
        assert!(types_compatible("REAL", "FLOAT"));
        assert!(types_compatible("TIMESTAMP", "DATETIME"));
        assert!(types_compatible("DATE", "TEXT"));
        assert!(types_compatible("REAL", "DOUBLE PRECISION"));
        assert!(!types_compatible("TEXT", "INTEGER"));
        assert!(!types_compatible("REAL", "TEXT"));
    }

    #[tokio::test]
    async fn test_sync_creates_missing_table() {
        let pool = setup_test_db().await;

        let report = sync_table::<Widgets>(&pool).await.unwrap();
        assert!(report.added_columns.is_empty());

        let columns = introspect_table(&pool, "widgets").await.unwrap();
        assert_eq!(columns.len(), 4);
        assert!(columns[0].pk);
        assert!(columns[1].not_null);
        assert_eq!(columns[3].default_value.as_deref(), Some("'new'"));
    }

    #[tokio::test]
    async fn test_sync_adds_missing_columns() {
        let pool = setup_test_db().await;
        sqlx::query("CREATE TABLE widgets (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO widgets (name) VALUES ('sprocket')")
            .execute(&pool)
            .await
            .unwrap();

        let report = sync_table::<Widgets>(&pool).await.unwrap();
        assert_eq!(report.added_columns, vec!["weight", "status"]);
        assert_eq!(report.unresolved, 0);

        // Existing rows pick up the default
        let status: String = sqlx::query_scalar("SELECT status FROM widgets WHERE name = 'sprocket'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(status, "new");

        // Second run is a no-op
        let again = sync_table::<Widgets>(&pool).await.unwrap();
        assert_eq!(again, SyncReport::default());
    }

    #[tokio::test]
    async fn test_drift_reports_type_mismatch() {
        let pool = setup_test_db().await;
        sqlx::query("CREATE TABLE widgets (id INTEGER PRIMARY KEY, name TEXT NOT NULL, weight TEXT, status TEXT NOT NULL DEFAULT 'new')")
            .execute(&pool)
            .await
            .unwrap();

        let actual = introspect_table(&pool, "widgets").await.unwrap();
        let drift = diff("widgets", &Widgets::columns(), &actual);

        assert_eq!(drift.len(), 1);
        match &drift[0] {
            SchemaDrift::TypeMismatch { column, expected, actual, .. } => {
                assert_eq!(column, "weight");
                assert_eq!(expected, "REAL");
                assert_eq!(actual, "TEXT");
            }
            other => panic!("Expected TypeMismatch, got {:?}", other),
        }

        let report = sync_table::<Widgets>(&pool).await.unwrap();
        assert_eq!(report.unresolved, 1);
    }

    #[tokio::test]
    async fn test_drift_reports_nullable_column() {
        let pool = setup_test_db().await;
        sqlx::query("CREATE TABLE widgets (id INTEGER PRIMARY KEY, name TEXT, weight REAL, status TEXT NOT NULL DEFAULT 'new')")
            .execute(&pool)
            .await
            .unwrap();

        let actual = introspect_table(&pool, "widgets").await.unwrap();
        let drift = diff("widgets", &Widgets::columns(), &actual);

        assert_eq!(
            drift,
            vec![SchemaDrift::ConstraintMismatch {
                table: "widgets".to_string(),
                column: "name".to_string(),
                constraint: "NOT NULL",
            }]
        );
    }

    #[tokio::test]
    async fn test_table_exists() {
        let pool = setup_test_db().await;
        assert!(!table_exists(&pool, "widgets").await.unwrap());
        sync_table::<Widgets>(&pool).await.unwrap();
        assert!(table_exists(&pool, "widgets").await.unwrap());
    }
}
