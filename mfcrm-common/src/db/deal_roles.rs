//! Contact roles on deals

use crate::db::{contacts, deals};
use crate::models::{ContactRole, RoleListing};
use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;

const ROLE_LISTING_SQL: &str = r#"
    SELECT r.id, r.deal_id, r.contact_id, r.role, r.notes, r.created_at,
           c.name AS contact_name,
           d.deal_name AS deal_name
    FROM deal_contact_roles r
    JOIN contacts c ON c.id = r.contact_id
    JOIN deals d ON d.id = r.deal_id
"#;

pub async fn roles_for_deal(pool: &SqlitePool, deal_id: i64) -> Result<Vec<RoleListing>> {
    let sql = format!("{} WHERE r.deal_id = ? ORDER BY r.created_at, r.id", ROLE_LISTING_SQL);
    let roles = sqlx::query_as::<_, RoleListing>(&sql)
        .bind(deal_id)
        .fetch_all(pool)
        .await?;

    Ok(roles)
}

pub async fn roles_for_contact(pool: &SqlitePool, contact_id: i64) -> Result<Vec<RoleListing>> {
    let sql = format!("{} WHERE r.contact_id = ? ORDER BY r.created_at, r.id", ROLE_LISTING_SQL);
    let roles = sqlx::query_as::<_, RoleListing>(&sql)
        .bind(contact_id)
        .fetch_all(pool)
        .await?;

    Ok(roles)
}

/// Link a contact to a deal in the given role
pub async fn add_role(
    pool: &SqlitePool,
    deal_id: i64,
    contact_id: i64,
    role: ContactRole,
    notes: Option<&str>,
) -> Result<i64> {
    let mut tx = pool.begin().await?;

    if !deals::deal_exists(&mut *tx, deal_id).await? {
        return Err(Error::NotFound(format!("Deal {}", deal_id)));
    }
    if !contacts::contact_exists(&mut *tx, contact_id).await? {
        return Err(Error::InvalidInput("Invalid contact selected.".to_string()));
    }

    let existing: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM deal_contact_roles WHERE deal_id = ? AND contact_id = ? AND role = ?)",
    )
    .bind(deal_id)
    .bind(contact_id)
    .bind(role)
    .fetch_one(&mut *tx)
    .await?;
    if existing {
        return Err(Error::Conflict(
            "This contact is already linked with this role.".to_string(),
        ));
    }

    let id = sqlx::query(
        "INSERT INTO deal_contact_roles (deal_id, contact_id, role, notes) VALUES (?, ?, ?, ?)",
    )
    .bind(deal_id)
    .bind(contact_id)
    .bind(role)
    .bind(notes)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    tx.commit().await?;
    info!("Contact {} linked to deal {} as {}", contact_id, deal_id, role);
    Ok(id)
}

/// Remove a role, which must belong to `deal_id`
pub async fn remove_role(pool: &SqlitePool, deal_id: i64, role_id: i64) -> Result<()> {
    let role_deal: Option<i64> =
        sqlx::query_scalar("SELECT deal_id FROM deal_contact_roles WHERE id = ?")
            .bind(role_id)
            .fetch_optional(pool)
            .await?;

    match role_deal {
        None => Err(Error::NotFound(format!("Relationship {}", role_id))),
        Some(did) if did != deal_id => {
            Err(Error::InvalidInput("Invalid relationship.".to_string()))
        }
        Some(_) => {
            sqlx::query("DELETE FROM deal_contact_roles WHERE id = ?")
                .bind(role_id)
                .execute(pool)
                .await?;
            info!("Removed role {} from deal {}", role_id, deal_id);
            Ok(())
        }
    }
}
