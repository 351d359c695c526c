//! Dashboard handler

use axum::{extract::State, http::HeaderMap, response::Response, routing::get, Router};
use mfcrm_common::db::tasks;
use mfcrm_common::models::today;

use crate::error::ApiResult;
use crate::{flash, views, AppState};

/// GET /
///
/// Open tasks by due date then priority, with overdue and due-today counts.
/// Snoozed tasks follow in their own section so they can be reopened.
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let shown = flash::take(&headers);
    let open = tasks::open_tasks(&state.db).await?;
    let snoozed = tasks::snoozed_tasks(&state.db).await?;
    let html = views::dashboard::render(&open, &snoozed, today(), shown.as_ref());
    Ok(flash::page(html, shown.as_ref()))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}
