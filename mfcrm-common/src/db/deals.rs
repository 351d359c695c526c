//! Deal persistence and pipeline grouping

use crate::db::properties;
use crate::models::{Deal, DealListing, DealStage};
use crate::{Error, Result};
use chrono::NaiveDate;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::info;

pub(crate) const DEAL_LISTING_SQL: &str = r#"
    SELECT d.id, d.deal_name, d.property_id, d.stage, d.target_close_date,
           CAST(d.asking_price AS REAL) AS asking_price,
           d.links, d.notes, d.created_at, d.updated_at,
           COALESCE(NULLIF(TRIM(p.name), ''), p.address) AS property_label
    FROM deals d
    JOIN properties p ON p.id = d.property_id
"#;

/// Editable deal fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DealInput {
    pub deal_name: String,
    pub property_id: Option<i64>,
    pub stage: DealStage,
    pub target_close_date: Option<NaiveDate>,
    pub asking_price: Option<f64>,
    pub links: Option<String>,
    pub notes: Option<String>,
}

impl DealInput {
    /// Field checks plus the property lookup, returning the property id
    async fn validate<'e, E>(&self, db: E) -> Result<i64>
    where
        E: SqliteExecutor<'e>,
    {
        if self.deal_name.trim().is_empty() {
            return Err(Error::InvalidInput("Deal name is required.".to_string()));
        }
        let property_id = self
            .property_id
            .ok_or_else(|| Error::InvalidInput("Property is required.".to_string()))?;
        if !properties::property_exists(db, property_id).await? {
            return Err(Error::InvalidInput("Invalid property selected.".to_string()));
        }
        Ok(property_id)
    }
}

/// Deals newest first, optionally limited to one stage
pub async fn list_deals(pool: &SqlitePool, stage: Option<DealStage>) -> Result<Vec<DealListing>> {
    let deals = match stage {
        Some(stage) => {
            let sql = format!("{} WHERE d.stage = ? ORDER BY d.created_at DESC, d.id DESC", DEAL_LISTING_SQL);
            sqlx::query_as::<_, DealListing>(&sql)
                .bind(stage)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("{} ORDER BY d.created_at DESC, d.id DESC", DEAL_LISTING_SQL);
            sqlx::query_as::<_, DealListing>(&sql).fetch_all(pool).await?
        }
    };

    Ok(deals)
}

/// Bucket deals by stage in pipeline order; every stage appears, possibly empty
pub fn group_by_stage(deals: &[DealListing]) -> Vec<(DealStage, Vec<&DealListing>)> {
    DealStage::ALL
        .iter()
        .map(|stage| {
            let bucket = deals.iter().filter(|d| d.deal.stage == *stage).collect();
            (*stage, bucket)
        })
        .collect()
}

pub async fn get_deal(pool: &SqlitePool, id: i64) -> Result<Option<DealListing>> {
    let sql = format!("{} WHERE d.id = ?", DEAL_LISTING_SQL);
    let deal = sqlx::query_as::<_, DealListing>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(deal)
}

pub async fn deal_exists<'e, E>(db: E, id: i64) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM deals WHERE id = ?)")
        .bind(id)
        .fetch_one(db)
        .await?;

    Ok(exists)
}

pub async fn deals_for_property(pool: &SqlitePool, property_id: i64) -> Result<Vec<Deal>> {
    let deals = sqlx::query_as::<_, Deal>(
        r#"
        SELECT id, deal_name, property_id, stage, target_close_date,
               CAST(asking_price AS REAL) AS asking_price,
               links, notes, created_at, updated_at
        FROM deals
        WHERE property_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(property_id)
    .fetch_all(pool)
    .await?;

    Ok(deals)
}

pub async fn create_deal(pool: &SqlitePool, input: &DealInput) -> Result<i64> {
    let property_id = input.validate(pool).await?;

    let id = sqlx::query(
        r#"
        INSERT INTO deals (deal_name, property_id, stage, target_close_date, asking_price, links, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.deal_name.trim())
    .bind(property_id)
    .bind(input.stage)
    .bind(input.target_close_date)
    .bind(input.asking_price)
    .bind(&input.links)
    .bind(&input.notes)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!("Created deal {} ({}) at stage {}", id, input.deal_name.trim(), input.stage);
    Ok(id)
}

pub async fn update_deal(pool: &SqlitePool, id: i64, input: &DealInput) -> Result<()> {
    let property_id = input.validate(pool).await?;

    let result = sqlx::query(
        r#"
        UPDATE deals
        SET deal_name = ?, property_id = ?, stage = ?, target_close_date = ?, asking_price = ?,
            links = ?, notes = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(input.deal_name.trim())
    .bind(property_id)
    .bind(input.stage)
    .bind(input.target_close_date)
    .bind(input.asking_price)
    .bind(&input.links)
    .bind(&input.notes)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Deal {}", id)));
    }
    Ok(())
}

/// Delete a deal with its contact roles, touchpoints and tasks
pub async fn delete_deal(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    if !deal_exists(&mut *tx, id).await? {
        return Err(Error::NotFound(format!("Deal {}", id)));
    }

    for sql in [
        "DELETE FROM deal_contact_roles WHERE deal_id = ?",
        "DELETE FROM touchpoints WHERE deal_id = ?",
        "DELETE FROM tasks WHERE deal_id = ?",
        "DELETE FROM deals WHERE id = ?",
    ] {
        sqlx::query(sql).bind(id).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    info!("Deleted deal {}", id);
    Ok(())
}
