//! SMS endpoint: `GET /sms?number&message` or `POST /sms` with a JSON body.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use crate::http::server::AppState;
use crate::observability::metrics;

pub const MISSING_PARAMETERS: &str = "Missing required parameters: number and message";

#[derive(Debug, Default, Deserialize)]
pub struct SmsParams {
    pub number: Option<String>,
    pub message: Option<String>,
}

pub async fn sms_query_handler(
    State(state): State<AppState>,
    uri: Uri,
) -> Response {
    let params = Query::<SmsParams>::try_from_uri(&uri)
        .map(|Query(p)| p)
        .unwrap_or_default();
    relay(&state, params).await
}

/// Bodies that are not a JSON object count as missing parameters.
pub async fn sms_json_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let params = serde_json::from_slice::<SmsParams>(&body).unwrap_or_default();
    relay(&state, params).await
}

async fn relay(state: &AppState, params: SmsParams) -> Response {
    let snapshot = state.snapshot();
    let Some(sms) = snapshot.sms.as_ref() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let number = params.number.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let message = params.message.as_deref().filter(|m| !m.trim().is_empty());
    let (Some(number), Some(message)) = (number, message) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": MISSING_PARAMETERS })),
        )
            .into_response();
    };

    match sms.send(number, message).await {
        Ok(reply) => {
            metrics::record_sms(reply.status.as_u16());
            (
                reply.status,
                [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                reply.body,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "SMS relay failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to process request",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
