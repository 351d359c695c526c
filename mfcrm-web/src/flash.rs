//! One-shot flash messages and post/redirect/get helpers
//!
//! A flash travels in the `mfcrm_flash` cookie as URL-safe base64 JSON. It
//! is set on the redirect that ends a form POST and cleared by the next page
//! that renders it.

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{ApiError, ApiResult};

pub const COOKIE_NAME: &str = "mfcrm_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

pub fn encode(flash: &Flash) -> String {
    // Serializing a two-field struct of plain strings cannot fail
    let json = serde_json::to_vec(flash).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

pub fn decode(value: &str) -> Option<Flash> {
    let bytes = URL_SAFE_NO_PAD.decode(value.trim()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Flash carried by the request, if any
pub fn take(headers: &HeaderMap) -> Option<Flash> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .and_then(|(_, value)| decode(value))
}

/// 303 redirect that sets the flash cookie
pub fn redirect(location: &str, flash: Flash) -> Response {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        COOKIE_NAME,
        encode(&flash)
    );
    let mut response = Redirect::to(location).into_response();
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!("Dropping unencodable flash cookie: {}", e),
    }
    response
}

/// HTML page response; clears the flash cookie when one was shown
pub fn page(html: String, shown: Option<&Flash>) -> Response {
    let mut response = Html(html).into_response();
    if shown.is_some() {
        let clear = format!("{}=; Path=/; Max-Age=0", COOKIE_NAME);
        if let Ok(value) = HeaderValue::from_str(&clear) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Path and query of the `Referer` header, else `fallback`.
///
/// Only the path portion is ever used, so a foreign referer can never
/// redirect off-site.
pub fn back_or(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(referer_path)
        .unwrap_or_else(|| fallback.to_string())
}

fn referer_path(referer: &str) -> Option<String> {
    let referer = referer.trim();
    let path = match referer.find("://") {
        Some(idx) => {
            let after_scheme = &referer[idx + 3..];
            &after_scheme[after_scheme.find('/')?..]
        }
        None => referer,
    };

    let path = path.split('#').next().unwrap_or(path);
    if !path.starts_with('/') || path.starts_with("//") || path.contains('\\') {
        return None;
    }
    Some(path.to_string())
}

/// Turn a failed mutation into its response.
///
/// Missing records become a 404 page; validation and blocking errors flash
/// their message; persistence errors are logged and flashed as
/// "Error <action>: <detail>". Every flash redirects to `location`.
pub fn failure(err: mfcrm_common::Error, action: &str, location: &str) -> ApiResult<Response> {
    match err {
        mfcrm_common::Error::NotFound(_) => Err(ApiError::Common(err)),
        err if err.is_validation() => Ok(redirect(location, Flash::error(err.user_message()))),
        err => {
            error!("Error {}: {}", action, err);
            Ok(redirect(location, Flash::error(format!("Error {}: {}", action, err))))
        }
    }
}
