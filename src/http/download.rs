//! Download endpoint: `GET /?url=<source>[&proxy=true|false][&format=json]`.

use std::net::{IpAddr, SocketAddr};
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, Request};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::delivery::{select_mode, Delivery};
use crate::error::ProxyError;
use crate::http::request::request_id;
use crate::http::response::{error_response, negotiate, ResponseFormat};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resolver::ResolveRequest;
use crate::security::validate_source;

#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
    pub url: Option<String>,
    pub proxy: Option<String>,
    pub format: Option<String>,
}

pub async fn download_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let snapshot = state.snapshot();

    let client_ip: Option<IpAddr> = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    // An undecodable query is treated like an empty one.
    let params = Query::<DownloadParams>::try_from_uri(request.uri())
        .map(|Query(params)| params)
        .unwrap_or_default();
    let headers = request.headers();
    let format = negotiate(headers, params.format.as_deref());
    let raw_source = params.url.as_deref().unwrap_or("").trim();

    if let Err(err) = validate_source(raw_source, &snapshot.config.resolver.allowed_source_hosts) {
        return reject(err, format, headers, start);
    }

    if let Some(search_log) = &snapshot.search_log {
        if let Err(e) = search_log.record(client_ip, raw_source).await {
            tracing::warn!(error = %e, "Failed to write search log");
        }
    }

    let mode = select_mode(params.proxy.as_deref(), snapshot.config.delivery.default_mode);
    let resolve = ResolveRequest::new(raw_source, mode);

    match snapshot.proxy.deliver(&resolve, headers).await {
        Ok(delivery) => {
            metrics::record_resolve("ok");
            if let Delivery::Stream(outcome) = &delivery {
                if outcome.is_recovered() {
                    metrics::record_fallback();
                }
            }

            let label = delivery.label();
            let response = delivery.into_response();
            tracing::info!(
                mode = mode.as_str(),
                delivery = label,
                status = response.status().as_u16(),
                "Download served"
            );
            metrics::record_request(label, response.status().as_u16(), start);
            response
        }
        Err(err) => {
            metrics::record_resolve(err.reason().code());
            reject(err, format, headers, start)
        }
    }
}

fn reject(
    err: ProxyError,
    format: ResponseFormat,
    headers: &HeaderMap,
    start: Instant,
) -> Response {
    let status = err.status_code();
    tracing::warn!(
        request_id = %request_id(headers),
        reason = err.reason().code(),
        status = status.as_u16(),
        error = %err,
        "Download request failed"
    );
    metrics::record_request("error", status.as_u16(), start);
    error_response(&err, format)
}
