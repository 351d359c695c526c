//! Property handlers

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Form, Router,
};
use mfcrm_common::db::properties::{PropertyFilter, PropertyInput};
use mfcrm_common::db::{contacts, deals, owners, properties};
use mfcrm_common::Result;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::flash::{self, Flash};
use crate::forms;
use crate::views::properties::{self as view, FilterEcho};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PropertyQuery {
    pub city: Option<String>,
    pub min_units: Option<String>,
    pub max_units: Option<String>,
}

/// Listing filter plus the messages for any bound that was ignored
pub fn parse_filter(query: &PropertyQuery) -> (PropertyFilter, Vec<String>) {
    let mut messages = Vec::new();

    let mut bound = |raw: &Option<String>, message: &str| match forms::integer(raw, message) {
        Ok(value) => value,
        Err(e) => {
            messages.push(e.user_message());
            None
        }
    };
    let mut min_units = bound(&query.min_units, "Min units must be a number.");
    let mut max_units = bound(&query.max_units, "Max units must be a number.");

    if let (Some(min), Some(max)) = (min_units, max_units) {
        if max < min {
            messages.push("Max units must be greater than or equal to min units.".to_string());
            min_units = None;
            max_units = None;
        }
    }

    let filter = PropertyFilter {
        city: forms::text(&query.city),
        min_units,
        max_units,
    };
    (filter, messages)
}

#[derive(Debug, Default, Deserialize)]
pub struct PropertyForm {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub units: Option<String>,
    pub year_built: Option<String>,
    pub property_class: Option<String>,
    pub estimated_value_min: Option<String>,
    pub estimated_value_max: Option<String>,
    pub buyer_interest: Option<String>,
    pub seller_motivation: Option<String>,
    pub notes: Option<String>,
}

impl PropertyForm {
    fn input(&self) -> Result<PropertyInput> {
        forms::require(&self.address, "Address is required.")?;
        Ok(PropertyInput {
            name: forms::text(&self.name),
            address: forms::required_text(&self.address),
            city: forms::text(&self.city),
            state: forms::text(&self.state),
            zip_code: forms::text(&self.zip_code),
            units: forms::integer(&self.units, "Invalid units format.")?,
            year_built: forms::integer(&self.year_built, "Invalid year built format.")?,
            property_class: forms::text(&self.property_class),
            estimated_value_min: forms::money(
                &self.estimated_value_min,
                "Invalid estimated value format.",
            )?,
            estimated_value_max: forms::money(
                &self.estimated_value_max,
                "Invalid estimated value format.",
            )?,
            buyer_interest: forms::integer(
                &self.buyer_interest,
                "Buyer interest must be between 1 and 10.",
            )?,
            seller_motivation: forms::integer(
                &self.seller_motivation,
                "Seller motivation must be between 1 and 10.",
            )?,
            notes: forms::text(&self.notes),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OwnerForm {
    pub contact_id: Option<String>,
    pub ownership_percentage: Option<String>,
    pub notes: Option<String>,
}

/// GET /properties/
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PropertyQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let (filter, messages) = parse_filter(&query);
    let found = properties::list_properties(&state.db, &filter).await?;

    let echo = FilterEcho {
        city: forms::required_text(&query.city),
        min_units: forms::required_text(&query.min_units),
        max_units: forms::required_text(&query.max_units),
    };
    let shown = flash::take(&headers);
    let html = view::list(&found, &echo, &messages, shown.as_ref());
    Ok(flash::page(html, shown.as_ref()))
}

/// GET /properties/:id
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let property = properties::get_property(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Property {}", id)))?;
    let property_deals = deals::deals_for_property(&state.db, id).await?;
    let property_owners = owners::owners_for_property(&state.db, id).await?;
    let all_contacts = contacts::list_contacts(&state.db).await?;

    let shown = flash::take(&headers);
    let html = view::detail(
        &property,
        &property_deals,
        &property_owners,
        &all_contacts,
        shown.as_ref(),
    );
    Ok(flash::page(html, shown.as_ref()))
}

/// GET /properties/create
pub async fn create_form(headers: HeaderMap) -> Response {
    let shown = flash::take(&headers);
    flash::page(view::form(None, shown.as_ref()), shown.as_ref())
}

/// POST /properties/create
///
/// Returns to the referring page so a property can be added mid-way
/// through creating a deal.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<PropertyForm>,
) -> ApiResult<Response> {
    let result = match form.input() {
        Ok(input) => properties::create_property(&state.db, &input).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(_) => Ok(flash::redirect(
            &flash::back_or(&headers, "/deals/create"),
            Flash::success("Property created successfully."),
        )),
        Err(e) => flash::failure(e, "creating property", "/properties/create"),
    }
}

/// GET /properties/:id/edit
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let property = properties::get_property(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Property {}", id)))?;
    let shown = flash::take(&headers);
    Ok(flash::page(view::form(Some(&property), shown.as_ref()), shown.as_ref()))
}

/// POST /properties/:id/edit
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<PropertyForm>,
) -> ApiResult<Response> {
    let result = match form.input() {
        Ok(input) => properties::update_property(&state.db, id, &input).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => Ok(flash::redirect(
            &format!("/properties/{}", id),
            Flash::success("Property updated successfully."),
        )),
        Err(e) => flash::failure(e, "updating property", &format!("/properties/{}/edit", id)),
    }
}

/// POST /properties/:id/delete
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Response> {
    match properties::delete_property(&state.db, id).await {
        Ok(()) => Ok(flash::redirect(
            "/properties/",
            Flash::success("Property deleted successfully."),
        )),
        Err(e) => flash::failure(e, "deleting property", &format!("/properties/{}", id)),
    }
}

/// POST /properties/:id/add_owner
pub async fn add_owner(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<OwnerForm>,
) -> ApiResult<Response> {
    let location = format!("/properties/{}", id);

    let parsed = forms::id(&form.contact_id, "Invalid contact selected.").and_then(|contact| {
        let pct = forms::decimal(
            &form.ownership_percentage,
            "Invalid ownership percentage format.",
        )?;
        Ok((contact, pct))
    });
    let (contact_id, pct) = match parsed {
        Ok((Some(contact_id), pct)) => (contact_id, pct),
        Ok((None, _)) => {
            return Ok(flash::redirect(&location, Flash::error("Please select a contact.")))
        }
        Err(e) => return flash::failure(e, "adding owner", &location),
    };

    let notes = forms::text(&form.notes);
    match owners::add_owner(&state.db, id, contact_id, pct, notes.as_deref()).await {
        Ok(_) => Ok(flash::redirect(&location, Flash::success("Owner added successfully."))),
        Err(e) => flash::failure(e, "adding owner", &location),
    }
}

/// POST /properties/:id/remove_owner/:owner_id
pub async fn remove_owner(
    State(state): State<AppState>,
    Path((id, owner_id)): Path<(i64, i64)>,
) -> ApiResult<Response> {
    let location = format!("/properties/{}", id);
    match owners::remove_owner(&state.db, id, owner_id).await {
        Ok(()) => Ok(flash::redirect(&location, Flash::success("Owner removed successfully."))),
        Err(e) => flash::failure(e, "removing owner", &location),
    }
}

pub fn property_routes() -> Router<AppState> {
    Router::new()
        .route("/properties", get(list))
        .route("/properties/", get(list))
        .route("/properties/create", get(create_form).post(create))
        .route("/properties/:id", get(detail))
        .route("/properties/:id/edit", get(edit_form).post(edit))
        .route("/properties/:id/delete", post(delete))
        .route("/properties/:id/add_owner", post(add_owner))
        .route("/properties/:id/remove_owner/:owner_id", post(remove_owner))
}
