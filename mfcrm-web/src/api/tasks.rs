//! Task handlers
//!
//! Every mutation returns to the referring page, else the dashboard.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Form, Router,
};
use mfcrm_common::db::tasks::TaskInput;
use mfcrm_common::db::{contacts, deals, properties, tasks};
use mfcrm_common::models::{today, TaskPriority, TaskStatus};
use mfcrm_common::Result;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::flash::{self, Flash};
use crate::forms;
use crate::views::tasks::{self as view, TaskLinks};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LinkQuery {
    pub deal_id: Option<String>,
    pub contact_id: Option<String>,
    pub property_id: Option<String>,
}

impl LinkQuery {
    /// Preselections; unparseable ids are ignored
    fn links(&self) -> TaskLinks {
        let id = |raw: &Option<String>| forms::id(raw, "").ok().flatten();
        TaskLinks {
            deal_id: id(&self.deal_id),
            contact_id: id(&self.contact_id),
            property_id: id(&self.property_id),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskForm {
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub deal_id: Option<String>,
    pub contact_id: Option<String>,
    pub property_id: Option<String>,
}

impl TaskForm {
    fn input(&self) -> Result<TaskInput> {
        forms::require(&self.description, "Task description is required.")?;
        forms::require(&self.due_date, "Due date is required.")?;
        Ok(TaskInput {
            description: forms::required_text(&self.description),
            due_date: forms::date(&self.due_date, "Invalid date format.")?,
            priority: forms::choice(&self.priority, TaskPriority::default())?,
            deal_id: forms::id(&self.deal_id, "Invalid deal selected.")?,
            contact_id: forms::id(&self.contact_id, "Invalid contact selected.")?,
            property_id: forms::id(&self.property_id, "Invalid property selected.")?,
        })
    }
}

/// GET /tasks/create?deal_id=&contact_id=&property_id=
pub async fn create_form(
    State(state): State<AppState>,
    Query(query): Query<LinkQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let all_contacts = contacts::list_contacts(&state.db).await?;
    let all_deals = deals::list_deals(&state.db, None).await?;
    let all_properties = properties::list_by_address(&state.db).await?;

    let shown = flash::take(&headers);
    let html = view::create_form(
        query.links(),
        &all_contacts,
        &all_deals,
        &all_properties,
        today(),
        shown.as_ref(),
    );
    Ok(flash::page(html, shown.as_ref()))
}

/// POST /tasks/create
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TaskForm>,
) -> ApiResult<Response> {
    let back = flash::back_or(&headers, "/");
    let result = match form.input() {
        Ok(input) => tasks::create_task(&state.db, &input).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => Ok(flash::redirect(&back, Flash::success("Task created successfully."))),
        Err(e) => flash::failure(e, "creating task", &back),
    }
}

async fn change_status(
    state: &AppState,
    headers: &HeaderMap,
    id: i64,
    status: TaskStatus,
    message: &str,
) -> ApiResult<Response> {
    let back = flash::back_or(headers, "/");
    match tasks::set_status(&state.db, id, status).await {
        Ok(()) => Ok(flash::redirect(&back, Flash::success(message))),
        Err(e) => flash::failure(e, "updating task", &back),
    }
}

/// POST /tasks/:id/complete
pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    change_status(&state, &headers, id, TaskStatus::Done, "Task marked as complete.").await
}

/// POST /tasks/:id/snooze
pub async fn snooze(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    change_status(&state, &headers, id, TaskStatus::Snoozed, "Task snoozed.").await
}

/// POST /tasks/:id/reopen
pub async fn reopen(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    change_status(&state, &headers, id, TaskStatus::Open, "Task reopened.").await
}

/// POST /tasks/:id/delete
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let back = flash::back_or(&headers, "/");
    match tasks::delete_task(&state.db, id).await {
        Ok(()) => Ok(flash::redirect(&back, Flash::success("Task deleted."))),
        Err(e) => flash::failure(e, "deleting task", &back),
    }
}

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks/create", get(create_form).post(create))
        .route("/tasks/:id/complete", post(complete))
        .route("/tasks/:id/snooze", post(snooze))
        .route("/tasks/:id/reopen", post(reopen))
        .route("/tasks/:id/delete", post(delete))
}
