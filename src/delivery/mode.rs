//! Response-mode selection: redirect or proxy-stream.

use axum::body::Body;
use axum::http::header::{HeaderValue, LOCATION};
use axum::http::StatusCode;
use axum::response::Response;
use url::Url;

use crate::config::DeliveryMode;

/// Pick the mode from the `proxy` query flag, falling back to `default`.
///
/// Unrecognized flag values keep the default.
pub fn select_mode(proxy_flag: Option<&str>, default: DeliveryMode) -> DeliveryMode {
    match proxy_flag.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1" | "yes" | "on") => DeliveryMode::Proxy,
        Some("false" | "0" | "no" | "off") => DeliveryMode::Redirect,
        _ => default,
    }
}

/// Where a redirect-mode response points: the direct link itself, or the
/// link-fixer URL wrapping it.
pub fn redirect_target(direct_link: &Url, rewrap_base: Option<&Url>) -> Url {
    match rewrap_base {
        Some(base) => {
            let mut target = base.clone();
            target.query_pairs_mut().append_pair("url", direct_link.as_str());
            target
        }
        None => direct_link.clone(),
    }
}

/// A bare `302 Found` to `location`.
pub fn found(location: &Url) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::FOUND;
    match HeaderValue::from_str(location.as_str()) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
        }
        Err(_) => {
            tracing::error!(location = %location, "Redirect target is not a valid header value");
            *response.status_mut() = StatusCode::BAD_GATEWAY;
        }
    }
    response
}
