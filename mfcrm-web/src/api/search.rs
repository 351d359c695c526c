//! Global search handler

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use mfcrm_common::db::search;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::{flash, views, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /search/?q=
pub async fn search_page(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let q = query.q.unwrap_or_default();
    let results = search::search(&state.db, &q).await?;
    let shown = flash::take(&headers);
    let html = views::search::render(&q, &results, shown.as_ref());
    Ok(flash::page(html, shown.as_ref()))
}

pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_page))
        .route("/search/", get(search_page))
}
