//! HTTP handlers for mfcrm-web
//!
//! One module per page group; each exposes a `*_routes()` builder merged
//! by [`crate::build_router`].

pub mod backup;
pub mod contacts;
pub mod dashboard;
pub mod deals;
pub mod health;
pub mod properties;
pub mod search;
pub mod tasks;
pub mod touchpoints;
pub mod ui;

pub use backup::backup_routes;
pub use contacts::contact_routes;
pub use dashboard::dashboard_routes;
pub use deals::deal_routes;
pub use health::health_routes;
pub use properties::property_routes;
pub use search::search_routes;
pub use tasks::task_routes;
pub use touchpoints::touchpoint_routes;
pub use ui::ui_routes;
