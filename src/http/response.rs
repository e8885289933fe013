//! Error responses.
//!
//! Errors render as plain text unless the client asks for JSON with
//! `Accept: application/json` or `format=json`.

use axum::http::header::{HeaderMap, ACCEPT};
use axum::response::{IntoResponse, Json, Response};

use crate::error::ProxyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// Pick the error format. An explicit `format` parameter wins over `Accept`.
pub fn negotiate(headers: &HeaderMap, format_param: Option<&str>) -> ResponseFormat {
    match format_param.map(str::trim) {
        Some(f) if f.eq_ignore_ascii_case("json") => return ResponseFormat::Json,
        Some(f) if f.eq_ignore_ascii_case("text") => return ResponseFormat::Text,
        _ => {}
    }

    let wants_json = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|media| {
            media
                .split(';')
                .next()
                .map(|m| m.trim().eq_ignore_ascii_case("application/json"))
                .unwrap_or(false)
        });

    if wants_json {
        ResponseFormat::Json
    } else {
        ResponseFormat::Text
    }
}

pub fn error_response(err: &ProxyError, format: ResponseFormat) -> Response {
    let status = err.status_code();
    match format {
        ResponseFormat::Json => (status, Json(err.body())).into_response(),
        ResponseFormat::Text => (status, err.to_string()).into_response(),
    }
}
