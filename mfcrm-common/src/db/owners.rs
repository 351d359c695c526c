//! Property ownership links

use crate::db::{contacts, properties};
use crate::models::OwnerListing;
use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;

const OWNER_LISTING_SQL: &str = r#"
    SELECT o.id, o.property_id, o.contact_id,
           CAST(o.ownership_percentage AS REAL) AS ownership_percentage, o.notes, o.created_at,
           c.name AS contact_name,
           COALESCE(NULLIF(TRIM(p.name), ''), p.address) AS property_label
    FROM property_owners o
    JOIN contacts c ON c.id = o.contact_id
    JOIN properties p ON p.id = o.property_id
"#;

pub async fn owners_for_property(pool: &SqlitePool, property_id: i64) -> Result<Vec<OwnerListing>> {
    let sql = format!("{} WHERE o.property_id = ? ORDER BY c.name COLLATE NOCASE, o.id", OWNER_LISTING_SQL);
    let owners = sqlx::query_as::<_, OwnerListing>(&sql)
        .bind(property_id)
        .fetch_all(pool)
        .await?;

    Ok(owners)
}

pub async fn ownerships_for_contact(pool: &SqlitePool, contact_id: i64) -> Result<Vec<OwnerListing>> {
    let sql = format!("{} WHERE o.contact_id = ? ORDER BY property_label COLLATE NOCASE, o.id", OWNER_LISTING_SQL);
    let owners = sqlx::query_as::<_, OwnerListing>(&sql)
        .bind(contact_id)
        .fetch_all(pool)
        .await?;

    Ok(owners)
}

/// Link a contact as owner of a property
///
/// `ownership_percentage` must lie within 0-100 when given.
pub async fn add_owner(
    pool: &SqlitePool,
    property_id: i64,
    contact_id: i64,
    ownership_percentage: Option<f64>,
    notes: Option<&str>,
) -> Result<i64> {
    if let Some(pct) = ownership_percentage {
        if !(0.0..=100.0).contains(&pct) {
            return Err(Error::InvalidInput(
                "Ownership percentage must be between 0 and 100.".to_string(),
            ));
        }
    }

    let mut tx = pool.begin().await?;

    if !properties::property_exists(&mut *tx, property_id).await? {
        return Err(Error::NotFound(format!("Property {}", property_id)));
    }
    if !contacts::contact_exists(&mut *tx, contact_id).await? {
        return Err(Error::InvalidInput("Invalid contact selected.".to_string()));
    }

    let existing: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM property_owners WHERE property_id = ? AND contact_id = ?)",
    )
    .bind(property_id)
    .bind(contact_id)
    .fetch_one(&mut *tx)
    .await?;
    if existing {
        return Err(Error::Conflict(
            "This contact is already an owner of this property.".to_string(),
        ));
    }

    let id = sqlx::query(
        "INSERT INTO property_owners (property_id, contact_id, ownership_percentage, notes) VALUES (?, ?, ?, ?)",
    )
    .bind(property_id)
    .bind(contact_id)
    .bind(ownership_percentage)
    .bind(notes)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;
    info!("Contact {} added as owner of property {}", contact_id, property_id);
    Ok(id)
}

/// Remove an owner link, which must belong to `property_id`
pub async fn remove_owner(pool: &SqlitePool, property_id: i64, owner_id: i64) -> Result<()> {
    let owner_property: Option<i64> =
        sqlx::query_scalar("SELECT property_id FROM property_owners WHERE id = ?")
            .bind(owner_id)
            .fetch_optional(pool)
            .await?;

    match owner_property {
        None => Err(Error::NotFound(format!("Owner {}", owner_id))),
        Some(pid) if pid != property_id => Err(Error::InvalidInput("Invalid owner.".to_string())),
        Some(_) => {
            sqlx::query("DELETE FROM property_owners WHERE id = ?")
                .bind(owner_id)
                .execute(pool)
                .await?;
            info!("Removed owner {} from property {}", owner_id, property_id);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn seed(pool: &SqlitePool) {
        for sql in [
            "INSERT INTO properties (id, name, address) VALUES (1, NULL, '1 Elm St')",
            "INSERT INTO properties (id, name, address) VALUES (2, 'Oak Court', '2 Oak St')",
            "INSERT INTO contacts (id, name) VALUES (1, 'Dana')",
            "INSERT INTO contacts (id, name) VALUES (2, 'Avery')",
        ] {
            sqlx::query(sql).execute(pool).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_add_and_list_owners() {
        let pool = test_pool().await;
        seed(&pool).await;

        add_owner(&pool, 1, 1, Some(60.0), None).await.unwrap();
        add_owner(&pool, 1, 2, Some(40.0), Some("LLC member")).await.unwrap();
        add_owner(&pool, 2, 1, None, None).await.unwrap();

        let owners = owners_for_property(&pool, 1).await.unwrap();
        let names: Vec<&str> = owners.iter().map(|o| o.contact_name.as_str()).collect();
        assert_eq!(names, vec!["Avery", "Dana"]);
        assert_eq!(owners[0].owner.notes.as_deref(), Some("LLC member"));
        assert_eq!(owners[0].property_label, "1 Elm St");

        let held = ownerships_for_contact(&pool, 1).await.unwrap();
        let labels: Vec<&str> = held.iter().map(|o| o.property_label.as_str()).collect();
        assert_eq!(labels, vec!["1 Elm St", "Oak Court"]);
    }

    #[tokio::test]
    async fn test_duplicate_owner_rejected() {
        let pool = test_pool().await;
        seed(&pool).await;

        add_owner(&pool, 1, 1, None, None).await.unwrap();
        let err = add_owner(&pool, 1, 1, Some(10.0), None).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "This contact is already an owner of this property."
        );
    }

    #[tokio::test]
    async fn test_percentage_bounds() {
        let pool = test_pool().await;
        seed(&pool).await;

        assert!(add_owner(&pool, 1, 1, Some(100.5), None).await.is_err());
        assert!(add_owner(&pool, 1, 1, Some(-1.0), None).await.is_err());
        add_owner(&pool, 1, 1, Some(100.0), None).await.unwrap();
        add_owner(&pool, 1, 2, Some(0.0), None).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_contact_rejected() {
        let pool = test_pool().await;
        seed(&pool).await;

        let err = add_owner(&pool, 1, 99, None, None).await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid contact selected.");
    }

    #[tokio::test]
    async fn test_remove_owner_checks_property() {
        let pool = test_pool().await;
        seed(&pool).await;
        let owner_id = add_owner(&pool, 1, 1, None, None).await.unwrap();

        let err = remove_owner(&pool, 2, owner_id).await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid owner.");
        assert_eq!(owners_for_property(&pool, 1).await.unwrap().len(), 1);

        remove_owner(&pool, 1, owner_id).await.unwrap();
        assert!(owners_for_property(&pool, 1).await.unwrap().is_empty());
    }
}
