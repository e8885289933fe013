//! Header sanitization and CORS.
//!
//! # Responsibilities
//! - Strip headers that stop browsers from loading proxied content cross-origin
//! - Strip hop-by-hop headers from relayed responses
//! - Build the CORS layer that decorates every response and answers preflights
//! - Force a download with `Content-Disposition` when a filename is known
//!
//! # Design Decisions
//! - Framing headers (`Content-Length`, `Content-Type`, `Content-Range`) are never
//!   touched; clients need them to stream and resume

use std::time::Duration;

use axum::http::header::{
    self, HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_EXPOSE_HEADERS, CONTENT_DISPOSITION,
};
use axum::http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tower_http::cors::{Any, CorsLayer};

/// Response headers removed before relaying to the client.
pub const DENIED_RESPONSE_HEADERS: [HeaderName; 3] = [
    header::CONTENT_SECURITY_POLICY,
    header::X_FRAME_OPTIONS,
    header::X_CONTENT_TYPE_OPTIONS,
];

const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(86400);

/// `attr-char` from RFC 5987; everything else is percent-encoded.
const RFC5987_ATTR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Switches applied on top of the mandatory sanitization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Add `Access-Control-Expose-Headers: *`.
    pub expose_headers: bool,
    /// Add `Content-Disposition: attachment` when a filename is known.
    pub force_download: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            expose_headers: true,
            force_download: true,
        }
    }
}

/// Build the header set for a relayed upstream response.
pub fn sanitize_headers(
    upstream: &HeaderMap,
    file_name: Option<&str>,
    options: SanitizeOptions,
) -> HeaderMap {
    let mut headers = upstream.clone();

    for name in DENIED_RESPONSE_HEADERS.iter() {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }

    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    if options.expose_headers {
        headers.insert(ACCESS_CONTROL_EXPOSE_HEADERS, HeaderValue::from_static("*"));
    }
    if options.force_download {
        if let Some(value) = file_name.and_then(content_disposition) {
            headers.insert(CONTENT_DISPOSITION, value);
        }
    }

    headers
}

/// `attachment; filename="<name>"`, plus `filename*` when the name is not plain ASCII.
///
/// Returns `None` for names that are empty after cleaning.
pub fn content_disposition(file_name: &str) -> Option<HeaderValue> {
    let cleaned: String = file_name
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let mut fallback = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        match c {
            '"' | '\\' => {
                fallback.push('\\');
                fallback.push(c);
            }
            c if c.is_ascii() => fallback.push(c),
            _ => fallback.push('_'),
        }
    }

    let mut value = format!("attachment; filename=\"{}\"", fallback);
    if !cleaned.is_ascii() {
        value.push_str("; filename*=UTF-8''");
        value.push_str(&utf8_percent_encode(&cleaned, RFC5987_ATTR).to_string());
    }

    HeaderValue::from_str(&value).ok()
}

/// CORS for every route: any origin, and `OPTIONS` on any path is answered
/// as a preflight with an empty body.
///
/// `Access-Control-Expose-Headers` is left to [`sanitize_headers`] so it
/// follows the delivery settings.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::RANGE, header::IF_RANGE])
        .max_age(PREFLIGHT_MAX_AGE)
}
