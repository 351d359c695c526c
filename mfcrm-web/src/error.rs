//! Error types for mfcrm-web

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::views::layout;

/// Handler error rendered as an HTML error page
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// mfcrm-common error
    #[error("Common error: {0}")]
    Common(#[from] mfcrm_common::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) | ApiError::Common(mfcrm_common::Error::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::BadRequest(_)
            | ApiError::Common(mfcrm_common::Error::InvalidInput(_))
            | ApiError::Common(mfcrm_common::Error::Conflict(_)) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) | ApiError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::Internal(msg) => {
                msg.clone()
            }
            ApiError::Common(err) => err.user_message(),
        };

        if status.is_server_error() {
            error!("{}", self);
        }

        let html = layout::error_page(status, &message);
        (status, Html(html)).into_response()
    }
}

/// Result type for HTTP handlers
pub type ApiResult<T> = Result<T, ApiError>;
