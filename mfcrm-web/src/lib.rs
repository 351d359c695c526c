//! mfcrm-web library - HTML interface for the multifamily CRM
//!
//! Server-rendered pages and form handlers. Every mutating POST answers
//! with a 303 redirect carrying a one-shot flash message.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod flash;
pub mod forms;
pub mod views;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::dashboard_routes())
        .merge(api::contact_routes())
        .merge(api::property_routes())
        .merge(api::deal_routes())
        .merge(api::task_routes())
        .merge(api::touchpoint_routes())
        .merge(api::search_routes())
        .merge(api::backup_routes())
        .merge(api::ui_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
