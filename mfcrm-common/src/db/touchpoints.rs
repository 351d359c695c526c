//! Touchpoint logging

use crate::db::tasks::{insert_task, TaskInput};
use crate::db::{contacts, deals};
use crate::models::{TaskPriority, TouchpointListing, TouchpointType};
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;
use tracing::info;

/// Latest touchpoints shown on a contact page
pub const CONTACT_TOUCHPOINT_LIMIT: i64 = 20;

/// Default follow-up description length taken from the summary
const SUMMARY_EXCERPT_CHARS: usize = 100;

const TOUCHPOINT_LISTING_SQL: &str = r#"
    SELECT tp.id, tp.deal_id, tp.contact_id, tp.touchpoint_type, tp.occurred_at, tp.summary,
           tp.next_step, tp.created_at,
           c.name AS contact_name,
           d.deal_name AS deal_name
    FROM touchpoints tp
    LEFT JOIN contacts c ON c.id = tp.contact_id
    LEFT JOIN deals d ON d.id = tp.deal_id
"#;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchpointInput {
    pub contact_id: Option<i64>,
    pub deal_id: Option<i64>,
    pub touchpoint_type: Option<TouchpointType>,
    /// Defaults to now (UTC)
    pub occurred_at: Option<NaiveDateTime>,
    pub summary: String,
    pub next_step: Option<String>,
}

/// Follow-up task created together with a touchpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowUp {
    pub due_date: Option<NaiveDate>,
    /// Defaults to the next step, else the start of the summary
    pub description: Option<String>,
    pub priority: TaskPriority,
}

/// Ids written by [`log_touchpoint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logged {
    pub touchpoint_id: i64,
    pub task_id: Option<i64>,
}

pub async fn list_touchpoints(pool: &SqlitePool) -> Result<Vec<TouchpointListing>> {
    let sql = format!("{} ORDER BY tp.occurred_at DESC, tp.id DESC", TOUCHPOINT_LISTING_SQL);
    let touchpoints = sqlx::query_as::<_, TouchpointListing>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(touchpoints)
}

/// Most recent touchpoints for a contact, capped at [`CONTACT_TOUCHPOINT_LIMIT`]
pub async fn recent_for_contact(pool: &SqlitePool, contact_id: i64) -> Result<Vec<TouchpointListing>> {
    let sql = format!(
        "{} WHERE tp.contact_id = ? ORDER BY tp.occurred_at DESC, tp.id DESC LIMIT ?",
        TOUCHPOINT_LISTING_SQL
    );
    let touchpoints = sqlx::query_as::<_, TouchpointListing>(&sql)
        .bind(contact_id)
        .bind(CONTACT_TOUCHPOINT_LIMIT)
        .fetch_all(pool)
        .await?;
    Ok(touchpoints)
}

pub async fn for_deal(pool: &SqlitePool, deal_id: i64) -> Result<Vec<TouchpointListing>> {
    let sql = format!(
        "{} WHERE tp.deal_id = ? ORDER BY tp.occurred_at DESC, tp.id DESC",
        TOUCHPOINT_LISTING_SQL
    );
    let touchpoints = sqlx::query_as::<_, TouchpointListing>(&sql)
        .bind(deal_id)
        .fetch_all(pool)
        .await?;
    Ok(touchpoints)
}

/// Record a touchpoint and, when `follow_up` is given, an open task for the
/// same contact and deal. Both rows are written or neither is.
pub async fn log_touchpoint(
    pool: &SqlitePool,
    input: &TouchpointInput,
    follow_up: Option<&FollowUp>,
) -> Result<Logged> {
    let touchpoint_type = input
        .touchpoint_type
        .ok_or_else(|| Error::InvalidInput("Touchpoint type is required.".to_string()))?;
    let summary = input.summary.trim();
    if summary.is_empty() {
        return Err(Error::InvalidInput("Summary is required.".to_string()));
    }
    let contact_id = input
        .contact_id
        .ok_or_else(|| Error::InvalidInput("A contact must be selected.".to_string()))?;
    if let Some(follow_up) = follow_up {
        if follow_up.due_date.is_none() {
            return Err(Error::InvalidInput(
                "Task due date is required when creating a task.".to_string(),
            ));
        }
    }

    let mut tx = pool.begin().await?;

    if !contacts::contact_exists(&mut *tx, contact_id).await? {
        return Err(Error::InvalidInput("Invalid contact selected.".to_string()));
    }
    if let Some(deal_id) = input.deal_id {
        if !deals::deal_exists(&mut *tx, deal_id).await? {
            return Err(Error::InvalidInput("Invalid deal selected.".to_string()));
        }
    }

    let occurred_at = input
        .occurred_at
        .unwrap_or_else(|| chrono::Utc::now().naive_utc());

    let touchpoint_id = sqlx::query(
        r#"
        INSERT INTO touchpoints (deal_id, contact_id, touchpoint_type, occurred_at, summary, next_step)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.deal_id)
    .bind(contact_id)
    .bind(touchpoint_type)
    .bind(occurred_at)
    .bind(summary)
    .bind(&input.next_step)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    let task_id = match follow_up {
        Some(follow_up) => {
            let task = TaskInput {
                description: follow_up_description(follow_up, input.next_step.as_deref(), summary),
                due_date: follow_up.due_date,
                priority: follow_up.priority,
                deal_id: input.deal_id,
                contact_id: Some(contact_id),
                property_id: None,
            };
            Some(insert_task(&mut *tx, &task).await?)
        }
        None => None,
    };

    tx.commit().await?;
    info!(
        "Logged {} touchpoint {} for contact {}",
        touchpoint_type, touchpoint_id, contact_id
    );

    Ok(Logged {
        touchpoint_id,
        task_id,
    })
}

fn follow_up_description(follow_up: &FollowUp, next_step: Option<&str>, summary: &str) -> String {
    let explicit = follow_up.description.as_deref().map(str::trim);
    let next_step = next_step.map(str::trim);
    match (explicit, next_step) {
        (Some(d), _) if !d.is_empty() => d.to_string(),
        (_, Some(n)) if !n.is_empty() => n.to_string(),
        _ => summary.chars().take(SUMMARY_EXCERPT_CHARS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tasks;
    use crate::db::test_pool;

    async fn seed(pool: &SqlitePool) {
        for sql in [
            "INSERT INTO contacts (id, name) VALUES (1, 'Dana')",
            "INSERT INTO properties (id, address) VALUES (1, '1 Elm St')",
            "INSERT INTO deals (id, deal_name, property_id) VALUES (1, 'Elm', 1)",
        ] {
            sqlx::query(sql).execute(pool).await.unwrap();
        }
    }

    fn call(summary: &str) -> TouchpointInput {
        TouchpointInput {
            contact_id: Some(1),
            touchpoint_type: Some(TouchpointType::Call),
            summary: summary.to_string(),
            ..Default::default()
        }
    }

    fn at(day: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 4, day).and_then(|d| d.and_hms_opt(9, 30, 0))
    }

    #[tokio::test]
    async fn test_log_without_follow_up() {
        let pool = test_pool().await;
        seed(&pool).await;

        let mut input = call("Intro call");
        input.occurred_at = at(3);
        let logged = log_touchpoint(&pool, &input, None).await.unwrap();
        assert!(logged.task_id.is_none());

        let all = list_touchpoints(&pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].touchpoint.occurred_at, at(3).unwrap());
        assert_eq!(all[0].contact_name.as_deref(), Some("Dana"));
        assert!(all[0].deal_name.is_none());
    }

    #[tokio::test]
    async fn test_follow_up_defaults_to_summary_excerpt() {
        let pool = test_pool().await;
        seed(&pool).await;

        let long_summary = "x".repeat(150);
        let mut input = call(&long_summary);
        input.deal_id = Some(1);
        let follow_up = FollowUp {
            due_date: NaiveDate::from_ymd_opt(2024, 4, 10),
            ..Default::default()
        };

        let logged = log_touchpoint(&pool, &input, Some(&follow_up)).await.unwrap();
        let task = tasks::get_task(&pool, logged.task_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(task.description.chars().count(), 100);
        assert_eq!(task.contact_id, Some(1));
        assert_eq!(task.deal_id, Some(1));
    }

    #[tokio::test]
    async fn test_follow_up_prefers_next_step() {
        let pool = test_pool().await;
        seed(&pool).await;

        let mut input = call("Talked pricing");
        input.next_step = Some("Send rent roll".to_string());
        let follow_up = FollowUp {
            due_date: NaiveDate::from_ymd_opt(2024, 4, 10),
            priority: TaskPriority::High,
            ..Default::default()
        };

        let logged = log_touchpoint(&pool, &input, Some(&follow_up)).await.unwrap();
        let task = tasks::get_task(&pool, logged.task_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(task.description, "Send rent roll");
        assert_eq!(task.priority, TaskPriority::High);
    }

    #[tokio::test]
    async fn test_follow_up_without_due_date_writes_nothing() {
        let pool = test_pool().await;
        seed(&pool).await;

        let err = log_touchpoint(&pool, &call("x"), Some(&FollowUp::default()))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Task due date is required when creating a task.");
        assert!(list_touchpoints(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_required_fields() {
        let pool = test_pool().await;
        seed(&pool).await;

        let mut input = call("x");
        input.touchpoint_type = None;
        assert_eq!(
            log_touchpoint(&pool, &input, None).await.unwrap_err().user_message(),
            "Touchpoint type is required."
        );

        let mut input = call("x");
        input.contact_id = None;
        assert_eq!(
            log_touchpoint(&pool, &input, None).await.unwrap_err().user_message(),
            "A contact must be selected."
        );

        let mut input = call("x");
        input.contact_id = Some(42);
        assert_eq!(
            log_touchpoint(&pool, &input, None).await.unwrap_err().user_message(),
            "Invalid contact selected."
        );
    }

    #[tokio::test]
    async fn test_contact_history_newest_first_and_capped() {
        let pool = test_pool().await;
        seed(&pool).await;

        for day in 1..=25 {
            let mut input = call(&format!("day {}", day));
            input.occurred_at = at(day);
            log_touchpoint(&pool, &input, None).await.unwrap();
        }

        let recent = recent_for_contact(&pool, 1).await.unwrap();
        assert_eq!(recent.len(), CONTACT_TOUCHPOINT_LIMIT as usize);
        assert_eq!(recent[0].touchpoint.summary, "day 25");
        assert!(for_deal(&pool, 1).await.unwrap().is_empty());
    }
}
