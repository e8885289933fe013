//! Error taxonomy shared by the request path.
//!
//! Every failure is converted to an HTTP response at the handler boundary;
//! nothing propagates as an unhandled fault.

use axum::http::StatusCode;
use serde::Serialize;

use crate::resolver::ResolveError;

/// Stable failure codes exposed to clients and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    MissingParameter,
    InvalidSourceUrl,
    UpstreamError,
    ParseError,
    NoLinkFound,
    NoDownloadableFile,
    Timeout,
    /// Recovered by the fallback redirect; never sent to a client.
    ProxyFetchFailed,
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::MissingParameter => "MISSING_PARAMETER",
            FailureReason::InvalidSourceUrl => "INVALID_SOURCE_URL",
            FailureReason::UpstreamError => "UPSTREAM_ERROR",
            FailureReason::ParseError => "PARSE_ERROR",
            FailureReason::NoLinkFound => "NO_LINK_FOUND",
            FailureReason::NoDownloadableFile => "NO_DOWNLOADABLE_FILE",
            FailureReason::Timeout => "TIMEOUT",
            FailureReason::ProxyFetchFailed => "PROXY_FETCH_FAILED",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            FailureReason::MissingParameter | FailureReason::InvalidSourceUrl => {
                StatusCode::BAD_REQUEST
            }
            FailureReason::NoLinkFound | FailureReason::NoDownloadableFile => StatusCode::NOT_FOUND,
            FailureReason::UpstreamError
            | FailureReason::ParseError
            | FailureReason::ProxyFetchFailed => StatusCode::BAD_GATEWAY,
            FailureReason::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

/// Failure of a download request, before any bytes are delivered.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid source URL: {0}")]
    InvalidSourceUrl(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl ProxyError {
    pub fn reason(&self) -> FailureReason {
        match self {
            ProxyError::MissingParameter(_) => FailureReason::MissingParameter,
            ProxyError::InvalidSourceUrl(_) => FailureReason::InvalidSourceUrl,
            ProxyError::Resolve(e) => e.reason(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.reason().status_code()
    }

    /// Structured body sent to the client.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.reason().code(),
            message: self.to_string(),
        }
    }
}

/// JSON error payload: `{"error": "<CODE>", "message": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Failure while building a component from configuration.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid URL in {field}: {source}")]
    Url {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid header value for {0}")]
    Header(&'static str),
}
