//! Property persistence

use crate::db::escape_like;
use crate::models::Property;
use crate::{Error, Result};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use tracing::info;

/// Money columns were NUMERIC in the first release, where SQLite keeps
/// whole amounts as INTEGER; CAST keeps them decoding as f64.
pub(crate) const PROPERTY_SELECT: &str = r#"
    SELECT id, name, address, city, state, zip_code, units, year_built, property_class,
           CAST(estimated_value_min AS REAL) AS estimated_value_min,
           CAST(estimated_value_max AS REAL) AS estimated_value_max,
           buyer_interest, seller_motivation, notes, created_at, updated_at
    FROM properties
"#;

/// Editable property fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyInput {
    /// Defaults to the address when blank
    pub name: Option<String>,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub units: Option<i64>,
    pub year_built: Option<i64>,
    pub property_class: Option<String>,
    pub estimated_value_min: Option<f64>,
    pub estimated_value_max: Option<f64>,
    pub buyer_interest: Option<i64>,
    pub seller_motivation: Option<i64>,
    pub notes: Option<String>,
}

impl PropertyInput {
    fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::InvalidInput("Address is required.".to_string()));
        }

        for value in [self.estimated_value_min, self.estimated_value_max]
            .into_iter()
            .flatten()
        {
            if value < 0.0 {
                return Err(Error::InvalidInput(
                    "Estimated values cannot be negative.".to_string(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.estimated_value_min, self.estimated_value_max) {
            if min > max {
                return Err(Error::InvalidInput(
                    "Estimated value min must be less than or equal to max.".to_string(),
                ));
            }
        }

        check_score("Buyer interest", self.buyer_interest)?;
        check_score("Seller motivation", self.seller_motivation)?;
        Ok(())
    }

    fn resolved_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.address.trim().to_string(),
        }
    }
}

fn check_score(field: &str, value: Option<i64>) -> Result<()> {
    match value {
        Some(v) if !(1..=10).contains(&v) => Err(Error::InvalidInput(format!(
            "{} must be between 1 and 10.",
            field
        ))),
        _ => Ok(()),
    }
}

/// Listing filter; bounds are inclusive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilter {
    /// Case-insensitive substring of the city
    pub city: Option<String>,
    pub min_units: Option<i64>,
    pub max_units: Option<i64>,
}

/// Properties matching the filter, newest first
pub async fn list_properties(pool: &SqlitePool, filter: &PropertyFilter) -> Result<Vec<Property>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!("{} WHERE 1 = 1", PROPERTY_SELECT));

    if let Some(city) = filter.city.as_deref().filter(|c| !c.is_empty()) {
        qb.push(" AND city LIKE ")
            .push_bind(format!("%{}%", escape_like(city)))
            .push(" ESCAPE '\\'");
    }
    if let Some(min) = filter.min_units {
        qb.push(" AND units >= ").push_bind(min);
    }
    if let Some(max) = filter.max_units {
        qb.push(" AND units <= ").push_bind(max);
    }
    qb.push(" ORDER BY created_at DESC, id DESC");

    let properties = qb.build_query_as::<Property>().fetch_all(pool).await?;
    Ok(properties)
}

/// All properties by address, for pickers
pub async fn list_by_address(pool: &SqlitePool) -> Result<Vec<Property>> {
    let sql = format!("{} ORDER BY address COLLATE NOCASE, id", PROPERTY_SELECT);
    let properties = sqlx::query_as::<_, Property>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(properties)
}

pub async fn get_property<'e, E>(db: E, id: i64) -> Result<Option<Property>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("{} WHERE id = ?", PROPERTY_SELECT);
    let property = sqlx::query_as::<_, Property>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(property)
}

pub async fn property_exists<'e, E>(db: E, id: i64) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM properties WHERE id = ?)")
        .bind(id)
        .fetch_one(db)
        .await?;

    Ok(exists)
}

pub async fn create_property(pool: &SqlitePool, input: &PropertyInput) -> Result<i64> {
    input.validate()?;

    let id = sqlx::query(
        r#"
        INSERT INTO properties (
            name, address, city, state, zip_code, units, year_built, property_class,
            estimated_value_min, estimated_value_max, buyer_interest, seller_motivation, notes
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.resolved_name())
    .bind(input.address.trim())
    .bind(&input.city)
    .bind(&input.state)
    .bind(&input.zip_code)
    .bind(input.units)
    .bind(input.year_built)
    .bind(&input.property_class)
    .bind(input.estimated_value_min)
    .bind(input.estimated_value_max)
    .bind(input.buyer_interest)
    .bind(input.seller_motivation)
    .bind(&input.notes)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!("Created property {} ({})", id, input.address.trim());
    Ok(id)
}

pub async fn update_property(pool: &SqlitePool, id: i64, input: &PropertyInput) -> Result<()> {
    input.validate()?;

    let result = sqlx::query(
        r#"
        UPDATE properties
        SET name = ?, address = ?, city = ?, state = ?, zip_code = ?, units = ?,
            year_built = ?, property_class = ?, estimated_value_min = ?,
            estimated_value_max = ?, buyer_interest = ?, seller_motivation = ?, notes = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(input.resolved_name())
    .bind(input.address.trim())
    .bind(&input.city)
    .bind(&input.state)
    .bind(&input.zip_code)
    .bind(input.units)
    .bind(input.year_built)
    .bind(&input.property_class)
    .bind(input.estimated_value_min)
    .bind(input.estimated_value_max)
    .bind(input.buyer_interest)
    .bind(input.seller_motivation)
    .bind(&input.notes)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Property {}", id)));
    }
    Ok(())
}

/// Delete a property and its owner links; tasks keep their row with the
/// property link cleared. Refused while any deal references the property.
pub async fn delete_property(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    if !property_exists(&mut *tx, id).await? {
        return Err(Error::NotFound(format!("Property {}", id)));
    }

    let deals: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deals WHERE property_id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    if deals > 0 {
        return Err(Error::Conflict(
            "Cannot delete property that has associated deals.".to_string(),
        ));
    }

    sqlx::query("UPDATE tasks SET property_id = NULL WHERE property_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM property_owners WHERE property_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM properties WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!("Deleted property {}", id);
    Ok(())
}
