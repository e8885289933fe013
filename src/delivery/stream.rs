//! Streaming relay of the resolved file.
//!
//! # Responsibilities
//! - Fetch the direct link with browser-like headers
//! - Propagate the client's `Range` / `If-Range` so downloads can resume
//! - Relay status and body as a live byte stream with sanitized headers
//! - Fall back to a redirect to the direct link when the fetch fails
//!
//! # Design Decisions
//! - Only the time to response headers is bounded; bodies are unbounded in size
//!   and streamed with backpressure, never buffered
//! - Fallback is a typed `Recovered` outcome, not a silent catch

use std::time::Duration;

use axum::body::Body;
use axum::http::header::{HeaderMap, IF_RANGE, RANGE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;
use url::Url;

use crate::resilience::with_deadline;
use crate::resolver::ResolvedLink;
use crate::security::{sanitize_headers, SanitizeOptions};

use super::mode::found;

/// Client request headers forwarded to the file host.
const FORWARDED_REQUEST_HEADERS: [axum::http::HeaderName; 2] = [RANGE, IF_RANGE];

/// Why the file host could not be relayed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("File host answered with status {0}")]
    Status(StatusCode),

    #[error("File host unreachable: {0}")]
    Transport(String),

    #[error("File host did not answer within {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Recovery performed instead of relaying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackAction {
    /// 302 to the unproxied direct link.
    Redirect(Url),
}

/// Result of a proxy-mode delivery.
pub enum StreamOutcome {
    /// Upstream bytes are being relayed.
    Relayed(Response),
    /// The fetch failed and the client was sent elsewhere.
    Recovered {
        action: FallbackAction,
        cause: FetchError,
    },
}

impl StreamOutcome {
    pub fn is_recovered(&self) -> bool {
        matches!(self, StreamOutcome::Recovered { .. })
    }
}

impl std::fmt::Debug for StreamOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamOutcome::Relayed(response) => f
                .debug_tuple("Relayed")
                .field(&response.status())
                .finish(),
            StreamOutcome::Recovered { action, cause } => f
                .debug_struct("Recovered")
                .field("action", action)
                .field("cause", cause)
                .finish(),
        }
    }
}

impl IntoResponse for StreamOutcome {
    fn into_response(self) -> Response {
        match self {
            StreamOutcome::Relayed(response) => response,
            StreamOutcome::Recovered {
                action: FallbackAction::Redirect(location),
                ..
            } => found(&location),
        }
    }
}

/// Fetches direct links and relays their bodies.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    http: reqwest::Client,
    timeout: Duration,
}

impl FileFetcher {
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Relay `link` to the client, or recover with a redirect.
    pub async fn stream(
        &self,
        link: &ResolvedLink,
        client_headers: &HeaderMap,
        options: SanitizeOptions,
    ) -> StreamOutcome {
        match self.fetch(&link.direct_link, client_headers).await {
            Ok(upstream) => {
                let status = upstream.status();
                let headers = sanitize_headers(upstream.headers(), link.file_name.as_deref(), options);

                tracing::debug!(status = %status, "Relaying file body");

                let direct_link = link.direct_link.clone();
                let body = upstream.bytes_stream().inspect_err(move |e| {
                    tracing::warn!(error = %e, direct_link = %direct_link, "File relay interrupted");
                });

                let mut response = Response::new(Body::from_stream(body));
                *response.status_mut() = status;
                *response.headers_mut() = headers;
                StreamOutcome::Relayed(response)
            }
            Err(cause) => {
                tracing::warn!(
                    error = %cause,
                    direct_link = %link.direct_link,
                    "File fetch failed, falling back to redirect"
                );
                StreamOutcome::Recovered {
                    action: FallbackAction::Redirect(link.direct_link.clone()),
                    cause,
                }
            }
        }
    }

    async fn fetch(&self, url: &Url, client_headers: &HeaderMap) -> Result<reqwest::Response, FetchError> {
        let mut request = self.http.get(url.clone());
        for name in FORWARDED_REQUEST_HEADERS.iter() {
            if let Some(value) = client_headers.get(name) {
                request = request.header(name, value);
            }
        }

        let response = match with_deadline(self.timeout, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => return Err(FetchError::Timeout(self.timeout)),
            Ok(Err(e)) => return Err(FetchError::Transport(e.to_string())),
            Err(_) => return Err(FetchError::Timeout(self.timeout)),
        };

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    fn link(url: &str) -> ResolvedLink {
        ResolvedLink {
            direct_link: Url::parse(url).unwrap(),
            file_name: None,
            is_folder: false,
            file_count: 1,
        }
    }

    #[tokio::test]
    async fn unreachable_host_recovers_with_redirect() {
        let fetcher = FileFetcher::new(reqwest::Client::new(), Duration::from_secs(2));
        let outcome = fetcher
            .stream(&link("http://127.0.0.1:9/file.bin"), &HeaderMap::new(), SanitizeOptions::default())
            .await;

        assert!(outcome.is_recovered());
        match &outcome {
            StreamOutcome::Recovered { action, .. } => {
                assert_eq!(action, &FallbackAction::Redirect(Url::parse("http://127.0.0.1:9/file.bin").unwrap()));
            }
            StreamOutcome::Relayed(_) => unreachable!(),
        }

        let response = outcome.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "http://127.0.0.1:9/file.bin");
    }
}
