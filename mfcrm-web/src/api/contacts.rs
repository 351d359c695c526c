//! Contact handlers

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Form, Router,
};
use mfcrm_common::db::{contacts, deal_roles, deals, owners, tasks, touchpoints};
use mfcrm_common::db::contacts::ContactInput;
use mfcrm_common::models::today;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::flash::{self, Flash};
use crate::forms;
use crate::views::contacts::{self as view, ContactDetail};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    pub name: Option<String>,
    pub company: Option<String>,
    pub role_type: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tags: Option<String>,
    pub notes: Option<String>,
}

impl ContactForm {
    fn input(&self) -> ContactInput {
        ContactInput {
            name: forms::required_text(&self.name),
            company: forms::text(&self.company),
            role_type: forms::text(&self.role_type),
            phone: forms::text(&self.phone),
            email: forms::text(&self.email),
            notes: forms::text(&self.notes),
            tags: forms::text(&self.tags),
        }
    }
}

/// GET /contacts/
pub async fn list(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let shown = flash::take(&headers);
    let all = contacts::list_contacts(&state.db).await?;
    Ok(flash::page(view::list(&all, shown.as_ref()), shown.as_ref()))
}

/// GET /contacts/:id
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let contact = contacts::get_contact(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Contact {}", id)))?;

    let roles = deal_roles::roles_for_contact(&state.db, id).await?;
    let ownerships = owners::ownerships_for_contact(&state.db, id).await?;
    let open_tasks = tasks::open_tasks_for_contact(&state.db, id).await?;
    let recent = touchpoints::recent_for_contact(&state.db, id).await?;
    let all_contacts = contacts::list_contacts(&state.db).await?;
    let all_deals = deals::list_deals(&state.db, None).await?;

    let shown = flash::take(&headers);
    let html = view::detail(
        &ContactDetail {
            contact: &contact,
            roles: &roles,
            ownerships: &ownerships,
            open_tasks: &open_tasks,
            touchpoints: &recent,
            all_contacts: &all_contacts,
            deals: &all_deals,
        },
        today(),
        shown.as_ref(),
    );
    Ok(flash::page(html, shown.as_ref()))
}

/// GET /contacts/create
pub async fn create_form(headers: HeaderMap) -> Response {
    let shown = flash::take(&headers);
    flash::page(view::form(None, shown.as_ref()), shown.as_ref())
}

/// POST /contacts/create
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<ContactForm>,
) -> ApiResult<Response> {
    match contacts::create_contact(&state.db, &form.input()).await {
        Ok(id) => Ok(flash::redirect(
            &format!("/contacts/{}", id),
            Flash::success("Contact created successfully."),
        )),
        Err(e) => flash::failure(e, "creating contact", "/contacts/create"),
    }
}

/// GET /contacts/:id/edit
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let contact = contacts::get_contact(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Contact {}", id)))?;
    let shown = flash::take(&headers);
    Ok(flash::page(view::form(Some(&contact), shown.as_ref()), shown.as_ref()))
}

/// POST /contacts/:id/edit
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<ContactForm>,
) -> ApiResult<Response> {
    match contacts::update_contact(&state.db, id, &form.input()).await {
        Ok(()) => Ok(flash::redirect(
            &format!("/contacts/{}", id),
            Flash::success("Contact updated successfully."),
        )),
        Err(e) => flash::failure(e, "updating contact", &format!("/contacts/{}/edit", id)),
    }
}

/// POST /contacts/:id/delete
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Response> {
    match contacts::delete_contact(&state.db, id).await {
        Ok(()) => Ok(flash::redirect("/contacts/", Flash::success("Contact deleted."))),
        Err(e) => flash::failure(e, "deleting contact", &format!("/contacts/{}", id)),
    }
}

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(list))
        .route("/contacts/", get(list))
        .route("/contacts/create", get(create_form).post(create))
        .route("/contacts/:id", get(detail))
        .route("/contacts/:id/edit", get(edit_form).post(edit))
        .route("/contacts/:id/delete", post(delete))
}
