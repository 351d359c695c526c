//! Deal handlers

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Form, Router,
};
use mfcrm_common::db::deals::DealInput;
use mfcrm_common::db::{contacts, deal_roles, deals, properties, tasks, touchpoints};
use mfcrm_common::models::{today, ContactRole, DealStage};
use mfcrm_common::Result;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::flash::{self, Flash};
use crate::forms;
use crate::views::deals::{self as view, DealDetail};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct StageQuery {
    pub stage: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DealForm {
    pub deal_name: Option<String>,
    pub property_id: Option<String>,
    pub stage: Option<String>,
    pub target_close_date: Option<String>,
    pub asking_price: Option<String>,
    pub links: Option<String>,
    pub notes: Option<String>,
}

impl DealForm {
    fn input(&self) -> Result<DealInput> {
        forms::require(&self.deal_name, "Deal name is required.")?;
        forms::require(&self.property_id, "Property is required.")?;
        Ok(DealInput {
            deal_name: forms::required_text(&self.deal_name),
            property_id: forms::id(&self.property_id, "Invalid property selected.")?,
            stage: forms::choice(&self.stage, DealStage::default())?,
            target_close_date: forms::date(
                &self.target_close_date,
                "Invalid target close date format.",
            )?,
            asking_price: forms::money(&self.asking_price, "Invalid asking price format.")?,
            links: forms::text(&self.links),
            notes: forms::text(&self.notes),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RoleForm {
    pub contact_id: Option<String>,
    pub role: Option<String>,
    pub notes: Option<String>,
}

impl RoleForm {
    fn parse(&self) -> Result<(i64, ContactRole)> {
        let contact_id = forms::id(&self.contact_id, "Invalid contact selected.")?.ok_or_else(
            || mfcrm_common::Error::InvalidInput("Contact is required.".to_string()),
        )?;
        let role = forms::required_choice(&self.role, "Role is required.")?;
        Ok((contact_id, role))
    }
}

/// GET /deals/?stage=
///
/// An unrecognised stage is reported and the full pipeline shown.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<StageQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let (stage, notice) = match forms::text(&query.stage) {
        None => (None, None),
        Some(raw) => match raw.parse::<DealStage>() {
            Ok(stage) => (Some(stage), None),
            Err(e) => (None, Some(e.user_message())),
        },
    };

    let listed = deals::list_deals(&state.db, stage).await?;
    let shown = flash::take(&headers);
    let html = view::list(&listed, stage, notice.as_deref(), shown.as_ref());
    Ok(flash::page(html, shown.as_ref()))
}

/// GET /deals/:id
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let deal = deals::get_deal(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Deal {}", id)))?;

    let roles = deal_roles::roles_for_deal(&state.db, id).await?;
    let open_tasks = tasks::open_tasks_for_deal(&state.db, id).await?;
    let history = touchpoints::for_deal(&state.db, id).await?;
    let all_contacts = contacts::list_contacts(&state.db).await?;
    let all_deals = deals::list_deals(&state.db, None).await?;

    let shown = flash::take(&headers);
    let html = view::detail(
        &DealDetail {
            deal: &deal,
            roles: &roles,
            open_tasks: &open_tasks,
            touchpoints: &history,
            all_contacts: &all_contacts,
            all_deals: &all_deals,
        },
        today(),
        shown.as_ref(),
    );
    Ok(flash::page(html, shown.as_ref()))
}

/// GET /deals/create
pub async fn create_form(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let by_address = properties::list_by_address(&state.db).await?;
    let shown = flash::take(&headers);
    Ok(flash::page(
        view::form(None, &by_address, shown.as_ref()),
        shown.as_ref(),
    ))
}

/// POST /deals/create
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<DealForm>,
) -> ApiResult<Response> {
    let result = match form.input() {
        Ok(input) => deals::create_deal(&state.db, &input).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(id) => Ok(flash::redirect(
            &format!("/deals/{}", id),
            Flash::success("Deal created successfully."),
        )),
        Err(e) => flash::failure(e, "creating deal", "/deals/create"),
    }
}

/// GET /deals/:id/edit
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let deal = deals::get_deal(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Deal {}", id)))?;
    let by_address = properties::list_by_address(&state.db).await?;
    let shown = flash::take(&headers);
    Ok(flash::page(
        view::form(Some(&deal), &by_address, shown.as_ref()),
        shown.as_ref(),
    ))
}

/// POST /deals/:id/edit
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<DealForm>,
) -> ApiResult<Response> {
    let result = match form.input() {
        Ok(input) => deals::update_deal(&state.db, id, &input).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => Ok(flash::redirect(
            &format!("/deals/{}", id),
            Flash::success("Deal updated successfully."),
        )),
        Err(e) => flash::failure(e, "updating deal", &format!("/deals/{}/edit", id)),
    }
}

/// POST /deals/:id/delete
///
/// Removes the deal's contact roles, touchpoints and tasks with it.
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Response> {
    match deals::delete_deal(&state.db, id).await {
        Ok(()) => Ok(flash::redirect("/deals/", Flash::success("Deal deleted."))),
        Err(e) => flash::failure(e, "deleting deal", &format!("/deals/{}", id)),
    }
}

/// POST /deals/:id/add_contact
pub async fn add_contact(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<RoleForm>,
) -> ApiResult<Response> {
    let location = format!("/deals/{}", id);
    let (contact_id, role) = match form.parse() {
        Ok(parsed) => parsed,
        Err(e) => return flash::failure(e, "adding contact", &location),
    };

    let notes = forms::text(&form.notes);
    match deal_roles::add_role(&state.db, id, contact_id, role, notes.as_deref()).await {
        Ok(_) => Ok(flash::redirect(&location, Flash::success("Contact added to deal."))),
        Err(e) => flash::failure(e, "adding contact", &location),
    }
}

/// POST /deals/:id/remove_contact/:role_id
pub async fn remove_contact(
    State(state): State<AppState>,
    Path((id, role_id)): Path<(i64, i64)>,
) -> ApiResult<Response> {
    let location = format!("/deals/{}", id);
    match deal_roles::remove_role(&state.db, id, role_id).await {
        Ok(()) => Ok(flash::redirect(&location, Flash::success("Contact removed from deal."))),
        Err(e) => flash::failure(e, "removing contact", &location),
    }
}

pub fn deal_routes() -> Router<AppState> {
    Router::new()
        .route("/deals", get(list))
        .route("/deals/", get(list))
        .route("/deals/create", get(create_form).post(create))
        .route("/deals/:id", get(detail))
        .route("/deals/:id/edit", get(edit_form).post(edit))
        .route("/deals/:id/delete", post(delete))
        .route("/deals/:id/add_contact", post(add_contact))
        .route("/deals/:id/remove_contact/:role_id", post(remove_contact))
}
