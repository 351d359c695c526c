//! Contact persistence

use crate::models::Contact;
use crate::{Error, Result};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::info;

/// Editable contact fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactInput {
    pub name: String,
    pub company: Option<String>,
    pub role_type: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<String>,
}

impl ContactInput {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("Name is required.".to_string()));
        }
        Ok(())
    }
}

/// All contacts by name
pub async fn list_contacts(pool: &SqlitePool) -> Result<Vec<Contact>> {
    let contacts = sqlx::query_as::<_, Contact>(
        "SELECT * FROM contacts ORDER BY name COLLATE NOCASE, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(contacts)
}

pub async fn get_contact<'e, E>(db: E, id: i64) -> Result<Option<Contact>>
where
    E: SqliteExecutor<'e>,
{
    let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(contact)
}

pub async fn contact_exists<'e, E>(db: E, id: i64) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM contacts WHERE id = ?)")
        .bind(id)
        .fetch_one(db)
        .await?;

    Ok(exists)
}

/// Insert a contact, returning its id
pub async fn create_contact(pool: &SqlitePool, input: &ContactInput) -> Result<i64> {
    input.validate()?;

    let id = sqlx::query(
        r#"
        INSERT INTO contacts (name, company, role_type, phone, email, notes, tags)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.name.trim())
    .bind(&input.company)
    .bind(&input.role_type)
    .bind(&input.phone)
    .bind(&input.email)
    .bind(&input.notes)
    .bind(&input.tags)
    .execute(pool)
    .await?
    .last_insert_rowid();

    info!("Created contact {} ({})", id, input.name.trim());
    Ok(id)
}

pub async fn update_contact(pool: &SqlitePool, id: i64, input: &ContactInput) -> Result<()> {
    input.validate()?;

    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET name = ?, company = ?, role_type = ?, phone = ?, email = ?, notes = ?, tags = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(input.name.trim())
    .bind(&input.company)
    .bind(&input.role_type)
    .bind(&input.phone)
    .bind(&input.email)
    .bind(&input.notes)
    .bind(&input.tags)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Contact {}", id)));
    }
    Ok(())
}

/// Number of deal roles referencing the contact
#[cfg(test)]
pub(crate) async fn count_deal_roles(pool: &SqlitePool, id: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deal_contact_roles WHERE contact_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Delete a contact with its ownerships, touchpoints and tasks.
///
/// Refused while the contact is linked to any deal.
pub async fn delete_contact(pool: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    if !contact_exists(&mut *tx, id).await? {
        return Err(Error::NotFound(format!("Contact {}", id)));
    }

    let roles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deal_contact_roles WHERE contact_id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    if roles > 0 {
        return Err(Error::Conflict(
            "Cannot delete contact that is linked to deals. Remove relationships first."
                .to_string(),
        ));
    }

    // Explicit child deletes: databases from older releases lack ON DELETE CASCADE
    for sql in [
        "DELETE FROM property_owners WHERE contact_id = ?",
        "DELETE FROM touchpoints WHERE contact_id = ?",
        "DELETE FROM tasks WHERE contact_id = ?",
        "DELETE FROM contacts WHERE id = ?",
    ] {
        sqlx::query(sql).bind(id).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    info!("Deleted contact {}", id);
    Ok(())
}
