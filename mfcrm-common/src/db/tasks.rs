//! Task persistence
//!
//! Open-task listings sort by due date, then by priority with High first.

use crate::db::{contacts, deals, properties};
use crate::models::{TaskListing, TaskPriority, TaskStatus};
use crate::{Error, Result};
use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

const TASK_LISTING_SQL: &str = r#"
    SELECT t.id, t.description, t.due_date, t.status, t.priority, t.deal_id, t.contact_id,
           t.property_id, t.completed_at, t.created_at, t.updated_at,
           c.name AS contact_name,
           d.deal_name AS deal_name,
           COALESCE(NULLIF(TRIM(p.name), ''), p.address) AS property_label
    FROM tasks t
    LEFT JOIN contacts c ON c.id = t.contact_id
    LEFT JOIN deals d ON d.id = t.deal_id
    LEFT JOIN properties p ON p.id = t.property_id
"#;

const OPEN_ORDER: &str = r#"
    ORDER BY t.due_date,
             CASE t.priority WHEN 'High' THEN 0 WHEN 'Medium' THEN 1 ELSE 2 END,
             t.id
"#;

/// New task fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskInput {
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: TaskPriority,
    pub deal_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub property_id: Option<i64>,
}

/// Every open task across the CRM
pub async fn open_tasks(pool: &SqlitePool) -> Result<Vec<TaskListing>> {
    let sql = format!("{} WHERE t.status = 'Open' {}", TASK_LISTING_SQL, OPEN_ORDER);
    let tasks = sqlx::query_as::<_, TaskListing>(&sql).fetch_all(pool).await?;
    Ok(tasks)
}

/// Snoozed tasks, in the same order as the open list
pub async fn snoozed_tasks(pool: &SqlitePool) -> Result<Vec<TaskListing>> {
    let sql = format!("{} WHERE t.status = 'Snoozed' {}", TASK_LISTING_SQL, OPEN_ORDER);
    let tasks = sqlx::query_as::<_, TaskListing>(&sql).fetch_all(pool).await?;
    Ok(tasks)
}

pub async fn open_tasks_for_contact(pool: &SqlitePool, contact_id: i64) -> Result<Vec<TaskListing>> {
    let sql = format!(
        "{} WHERE t.status = 'Open' AND t.contact_id = ? {}",
        TASK_LISTING_SQL, OPEN_ORDER
    );
    let tasks = sqlx::query_as::<_, TaskListing>(&sql)
        .bind(contact_id)
        .fetch_all(pool)
        .await?;
    Ok(tasks)
}

pub async fn open_tasks_for_deal(pool: &SqlitePool, deal_id: i64) -> Result<Vec<TaskListing>> {
    let sql = format!(
        "{} WHERE t.status = 'Open' AND t.deal_id = ? {}",
        TASK_LISTING_SQL, OPEN_ORDER
    );
    let tasks = sqlx::query_as::<_, TaskListing>(&sql)
        .bind(deal_id)
        .fetch_all(pool)
        .await?;
    Ok(tasks)
}

#[cfg(test)]
pub(crate) async fn get_task(pool: &SqlitePool, id: i64) -> Result<Option<crate::models::Task>> {
    let task = sqlx::query_as::<_, crate::models::Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(task)
}

/// Validate and insert on an open connection or transaction
pub async fn insert_task(conn: &mut SqliteConnection, input: &TaskInput) -> Result<i64> {
    let description = input.description.trim();
    if description.is_empty() {
        return Err(Error::InvalidInput("Task description is required.".to_string()));
    }
    let due_date = input
        .due_date
        .ok_or_else(|| Error::InvalidInput("Due date is required.".to_string()))?;

    if let Some(contact_id) = input.contact_id {
        if !contacts::contact_exists(&mut *conn, contact_id).await? {
            return Err(Error::InvalidInput("Invalid contact selected.".to_string()));
        }
    }
    if let Some(deal_id) = input.deal_id {
        if !deals::deal_exists(&mut *conn, deal_id).await? {
            return Err(Error::InvalidInput("Invalid deal selected.".to_string()));
        }
    }
    if let Some(property_id) = input.property_id {
        if !properties::property_exists(&mut *conn, property_id).await? {
            return Err(Error::InvalidInput("Invalid property selected.".to_string()));
        }
    }

    let id = sqlx::query(
        r#"
        INSERT INTO tasks (description, due_date, status, priority, deal_id, contact_id, property_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(description)
    .bind(due_date)
    .bind(TaskStatus::Open)
    .bind(input.priority)
    .bind(input.deal_id)
    .bind(input.contact_id)
    .bind(input.property_id)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    info!("Created task {} due {}", id, due_date);
    Ok(id)
}

pub async fn create_task(pool: &SqlitePool, input: &TaskInput) -> Result<i64> {
    let mut tx = pool.begin().await?;
    let id = insert_task(&mut *tx, input).await?;
    tx.commit().await?;
    Ok(id)
}

/// Move a task to `status`. Done stamps `completed_at`; any other status clears it.
pub async fn set_status(pool: &SqlitePool, id: i64, status: TaskStatus) -> Result<()> {
    let sql = match status {
        TaskStatus::Done => {
            "UPDATE tasks SET status = ?, completed_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP WHERE id = ?"
        }
        TaskStatus::Open | TaskStatus::Snoozed => {
            "UPDATE tasks SET status = ?, completed_at = NULL, updated_at = CURRENT_TIMESTAMP WHERE id = ?"
        }
    };

    let result = sqlx::query(sql).bind(status).bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Task {}", id)));
    }

    info!("Task {} is now {}", id, status);
    Ok(())
}

pub async fn delete_task(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Task {}", id)));
    }
    Ok(())
}
