//! Form field parsing
//!
//! Every form struct deserializes its fields as optional strings so that a
//! blank or malformed field reaches these helpers and produces a readable
//! message instead of an extractor rejection.

use chrono::{NaiveDate, NaiveDateTime};
use mfcrm_common::{Error, Result};
use std::str::FromStr;

/// Trimmed value, `None` when absent or blank
pub fn text(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Trimmed value, empty string when absent
pub fn required_text(raw: &Option<String>) -> String {
    text(raw).unwrap_or_default()
}

/// Fails with `message` when the field is absent or blank
pub fn require(raw: &Option<String>, message: &str) -> Result<()> {
    match text(raw) {
        Some(_) => Ok(()),
        None => invalid(message),
    }
}

fn invalid<T>(message: &str) -> Result<T> {
    Err(Error::InvalidInput(message.to_string()))
}

/// `YYYY-MM-DD`
pub fn date(raw: &Option<String>, message: &str) -> Result<Option<NaiveDate>> {
    match text(raw) {
        None => Ok(None),
        Some(s) => match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
            Ok(d) => Ok(Some(d)),
            Err(_) => invalid(message),
        },
    }
}

/// `YYYY-MM-DDTHH:MM` (datetime-local input) or a bare `YYYY-MM-DD` at midnight
pub fn datetime(raw: &Option<String>, message: &str) -> Result<Option<NaiveDateTime>> {
    let Some(s) = text(raw) else {
        return Ok(None);
    };
    if let Ok(dt) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M") {
        return Ok(Some(dt));
    }
    match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        Ok(d) => Ok(d.and_hms_opt(0, 0, 0)),
        Err(_) => invalid(message),
    }
}

pub fn integer(raw: &Option<String>, message: &str) -> Result<Option<i64>> {
    match text(raw) {
        None => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).or_else(|_| invalid(message)),
    }
}

/// Row id from a select; blank means no selection
pub fn id(raw: &Option<String>, message: &str) -> Result<Option<i64>> {
    integer(raw, message)
}

pub fn decimal(raw: &Option<String>, message: &str) -> Result<Option<f64>> {
    match text(raw) {
        None => Ok(None),
        Some(s) => match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => invalid(message),
        },
    }
}

/// Dollar amount; `$` and thousands separators are ignored
pub fn money(raw: &Option<String>, message: &str) -> Result<Option<f64>> {
    let cleaned = raw.as_deref().map(|s| s.replace(|c: char| c == '$' || c == ',', ""));
    decimal(&cleaned, message)
}

/// Enumerated value by its wire name; blank yields `default`
pub fn choice<T>(raw: &Option<String>, default: T) -> Result<T>
where
    T: FromStr<Err = Error>,
{
    match text(raw) {
        None => Ok(default),
        Some(s) => s.parse(),
    }
}

/// Enumerated value that must be present
pub fn required_choice<T>(raw: &Option<String>, missing: &str) -> Result<T>
where
    T: FromStr<Err = Error>,
{
    match text(raw) {
        None => invalid(missing),
        Some(s) => s.parse(),
    }
}

/// Checkbox or `yes` flag
pub fn flag(raw: &Option<String>) -> bool {
    matches!(text(raw).as_deref(), Some("yes" | "on" | "true" | "1"))
}
