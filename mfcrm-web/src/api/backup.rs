//! Database snapshot download and CSV exports

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::NaiveDateTime;
use mfcrm_common::db::properties::PropertyFilter;
use mfcrm_common::db::{contacts, deals, properties};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CONTACT_HEADERS: [&str; 8] = ["ID", "Name", "Company", "Role", "Phone", "Email", "Tags", "Created"];

const PROPERTY_HEADERS: [&str; 12] = [
    "ID",
    "Name",
    "Address",
    "City",
    "State",
    "Zip",
    "Units",
    "Year Built",
    "Class",
    "Est. Value Min",
    "Est. Value Max",
    "Created",
];

const DEAL_HEADERS: [&str; 7] = [
    "ID",
    "Deal Name",
    "Property",
    "Stage",
    "Target Close",
    "Asking Price",
    "Created",
];

fn stamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn attachment(content_type: &'static str, filename: &str, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Header row followed by one record per row
fn write_csv<const N: usize>(headers: [&str; N], rows: Vec<[String; N]>) -> ApiResult<Vec<u8>> {
    let csv_err = |e: csv::Error| ApiError::Internal(format!("CSV export failed: {}", e));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers).map_err(csv_err)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_err)?;
    }
    writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("CSV export failed: {}", e)))
}

/// GET /backup/download_db
///
/// `VACUUM INTO` writes a consistent copy even while other requests hold
/// the pool, so the live file is never streamed directly.
pub async fn download_db(State(state): State<AppState>) -> ApiResult<Response> {
    let snapshot = std::env::temp_dir().join(format!("mfcrm-backup-{}.db", uuid::Uuid::new_v4()));
    let target = snapshot.to_string_lossy().to_string();

    sqlx::query("VACUUM INTO ?")
        .bind(&target)
        .execute(&state.db)
        .await
        .map_err(mfcrm_common::Error::from)?;

    let bytes = tokio::fs::read(&snapshot).await;
    if let Err(e) = tokio::fs::remove_file(&snapshot).await {
        warn!("Could not remove backup snapshot {}: {}", target, e);
    }
    let bytes = bytes.map_err(mfcrm_common::Error::from)?;

    info!("Served database backup ({} bytes)", bytes.len());
    Ok(attachment("application/octet-stream", "crm_backup.db", bytes))
}

/// GET /backup/export_contacts
pub async fn export_contacts(State(state): State<AppState>) -> ApiResult<Response> {
    let rows = contacts::list_contacts(&state.db)
        .await?
        .into_iter()
        .map(|c| {
            [
                c.id.to_string(),
                c.name,
                c.company.unwrap_or_default(),
                c.role_type.unwrap_or_default(),
                c.phone.unwrap_or_default(),
                c.email.unwrap_or_default(),
                c.tags.unwrap_or_default(),
                stamp(c.created_at),
            ]
        })
        .collect();

    let body = write_csv(CONTACT_HEADERS, rows)?;
    Ok(attachment("text/csv; charset=utf-8", "contacts_export.csv", body))
}

/// GET /backup/export_properties
pub async fn export_properties(State(state): State<AppState>) -> ApiResult<Response> {
    let rows = properties::list_properties(&state.db, &PropertyFilter::default())
        .await?
        .into_iter()
        .map(|p| {
            [
                p.id.to_string(),
                p.name.unwrap_or_default(),
                p.address,
                p.city.unwrap_or_default(),
                p.state.unwrap_or_default(),
                p.zip_code.unwrap_or_default(),
                cell(p.units),
                cell(p.year_built),
                p.property_class.unwrap_or_default(),
                cell(p.estimated_value_min),
                cell(p.estimated_value_max),
                stamp(p.created_at),
            ]
        })
        .collect();

    let body = write_csv(PROPERTY_HEADERS, rows)?;
    Ok(attachment("text/csv; charset=utf-8", "properties_export.csv", body))
}

/// GET /backup/export_deals
pub async fn export_deals(State(state): State<AppState>) -> ApiResult<Response> {
    let rows = deals::list_deals(&state.db, None)
        .await?
        .into_iter()
        .map(|d| {
            [
                d.deal.id.to_string(),
                d.deal.deal_name,
                d.property_label,
                d.deal.stage.as_str().to_string(),
                cell(d.deal.target_close_date),
                cell(d.deal.asking_price),
                stamp(d.deal.created_at),
            ]
        })
        .collect();

    let body = write_csv(DEAL_HEADERS, rows)?;
    Ok(attachment("text/csv; charset=utf-8", "deals_export.csv", body))
}

pub fn backup_routes() -> Router<AppState> {
    Router::new()
        .route("/backup/download_db", get(download_db))
        .route("/backup/export_contacts", get(export_contacts))
        .route("/backup/export_properties", get(export_properties))
        .route("/backup/export_deals", get(export_deals))
}
