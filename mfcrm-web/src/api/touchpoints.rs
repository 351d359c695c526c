//! Touchpoint handlers

use axum::{
    extract::State,
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Form, Router,
};
use mfcrm_common::db::touchpoints::{FollowUp, TouchpointInput};
use mfcrm_common::db::{contacts, deals, touchpoints};
use mfcrm_common::models::{TaskPriority, TouchpointType};
use mfcrm_common::Result;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::flash::{self, Flash};
use crate::forms;
use crate::views::touchpoints as view;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TouchpointForm {
    pub contact_id: Option<String>,
    pub deal_id: Option<String>,
    pub touchpoint_type: Option<String>,
    pub occurred_at: Option<String>,
    pub summary: Option<String>,
    pub next_step: Option<String>,
    pub create_task: Option<String>,
    pub task_due_date: Option<String>,
    pub task_description: Option<String>,
    pub task_priority: Option<String>,
}

impl TouchpointForm {
    fn input(&self) -> Result<TouchpointInput> {
        forms::require(&self.touchpoint_type, "Touchpoint type is required.")?;
        forms::require(&self.summary, "Summary is required.")?;
        forms::require(&self.contact_id, "A contact must be selected.")?;
        let touchpoint_type = match forms::text(&self.touchpoint_type) {
            None => None,
            Some(raw) => Some(raw.parse::<TouchpointType>()?),
        };
        Ok(TouchpointInput {
            contact_id: forms::id(&self.contact_id, "Invalid contact selected.")?,
            deal_id: forms::id(&self.deal_id, "Invalid deal selected.")?,
            touchpoint_type,
            occurred_at: forms::datetime(&self.occurred_at, "Invalid date/time format.")?,
            summary: forms::required_text(&self.summary),
            next_step: forms::text(&self.next_step),
        })
    }

    fn follow_up(&self) -> Result<Option<FollowUp>> {
        if !forms::flag(&self.create_task) {
            return Ok(None);
        }
        Ok(Some(FollowUp {
            due_date: forms::date(&self.task_due_date, "Invalid task due date format.")?,
            description: forms::text(&self.task_description),
            priority: forms::choice(&self.task_priority, TaskPriority::default())?,
        }))
    }
}

/// GET /touchpoints/
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let history = touchpoints::list_touchpoints(&state.db).await?;
    let all_contacts = contacts::list_contacts(&state.db).await?;
    let all_deals = deals::list_deals(&state.db, None).await?;

    let shown = flash::take(&headers);
    let html = view::list(&history, &all_contacts, &all_deals, shown.as_ref());
    Ok(flash::page(html, shown.as_ref()))
}

/// POST /touchpoints/create
///
/// Logs the touchpoint and, with `create_task=yes`, its follow-up task in
/// the same transaction.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<TouchpointForm>,
) -> ApiResult<Response> {
    let back = flash::back_or(&headers, "/");

    let parsed = form
        .input()
        .and_then(|input| Ok((input, form.follow_up()?)));
    let result = match parsed {
        Ok((input, follow_up)) => {
            touchpoints::log_touchpoint(&state.db, &input, follow_up.as_ref()).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(logged) => {
            let mut message = String::from("Touchpoint logged successfully.");
            if logged.task_id.is_some() {
                message.push_str(" Follow-up task created.");
            }
            Ok(flash::redirect(&back, Flash::success(message)))
        }
        Err(e) => flash::failure(e, "logging touchpoint", &back),
    }
}

pub fn touchpoint_routes() -> Router<AppState> {
    Router::new()
        .route("/touchpoints", get(list))
        .route("/touchpoints/", get(list))
        .route("/touchpoints/create", post(create))
}
