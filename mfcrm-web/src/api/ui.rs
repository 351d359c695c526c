//! Static asset routes

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::AppState;

const CRM_CSS: &str = include_str!("../../static/crm.css");

/// GET /static/crm.css
pub async fn serve_crm_css() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        CRM_CSS,
    )
        .into_response()
}

pub fn ui_routes() -> Router<AppState> {
    Router::new().route("/static/crm.css", get(serve_crm_css))
}
