//! Link resolution subsystem.
//!
//! # Data Flow
//! ```text
//! ResolveRequest (source URL)
//!     → client.rs (GET <resolver>?url=<encoded>, browser headers, deadline)
//!     → strategy.rs (named JSON shapes, fixed priority)
//!     → ResolveResult: ResolvedLink | ResolveError
//! ```
//!
//! # Design Decisions
//! - Never throws past this boundary: every failure is a `ResolveError`
//! - A folder without a resolvable file is distinct from "no link"

pub mod client;
pub mod strategy;

use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::config::DeliveryMode;
use crate::error::FailureReason;

pub use client::ResolverClient;
pub use strategy::{default_strategies, ExtractionStrategy};

/// A client's request to resolve one source URL.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Share URL as supplied by the client.
    pub source: String,
    pub mode: DeliveryMode,
    /// Overrides the configured resolver timeout.
    pub timeout: Option<Duration>,
}

impl ResolveRequest {
    pub fn new(source: impl Into<String>, mode: DeliveryMode) -> Self {
        Self {
            source: source.into(),
            mode,
            timeout: None,
        }
    }
}

/// Successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLink {
    pub direct_link: Url,
    pub file_name: Option<String>,
    pub is_folder: bool,
    pub file_count: usize,
}

/// Why a source URL could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Resolver answered with status {0}")]
    UpstreamStatus(u16),

    #[error("Resolver unreachable: {0}")]
    Unreachable(String),

    #[error("Resolver returned malformed JSON: {0}")]
    Parse(String),

    #[error("No direct download link found")]
    NoLinkFound,

    #[error("No downloadable file found")]
    NoDownloadableFile,

    #[error("Resolver did not answer within {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ResolveError {
    pub fn reason(&self) -> FailureReason {
        match self {
            ResolveError::UpstreamStatus(_) | ResolveError::Unreachable(_) => {
                FailureReason::UpstreamError
            }
            ResolveError::Parse(_) => FailureReason::ParseError,
            ResolveError::NoLinkFound => FailureReason::NoLinkFound,
            ResolveError::NoDownloadableFile => FailureReason::NoDownloadableFile,
            ResolveError::Timeout(_) => FailureReason::Timeout,
        }
    }
}

pub type ResolveResult = Result<ResolvedLink, ResolveError>;

/// Interpret a resolver response body with the given strategies.
pub fn interpret(body: &[u8], strategies: &[Box<dyn ExtractionStrategy>]) -> ResolveResult {
    let json: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ResolveError::Parse(e.to_string()))?;
    let is_folder = strategy::folder_flag(&json);

    for strategy in strategies {
        if let Some(found) = strategy.extract(&json) {
            tracing::debug!(
                strategy = strategy.name(),
                file_count = found.file_count,
                is_folder,
                "Resolver response matched"
            );
            return Ok(ResolvedLink {
                direct_link: found.direct_link,
                file_name: found.file_name,
                is_folder,
                file_count: found.file_count,
            });
        }
    }

    if is_folder {
        Err(ResolveError::NoDownloadableFile)
    } else {
        Err(ResolveError::NoLinkFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(body: &str) -> ResolveResult {
        interpret(body.as_bytes(), &default_strategies())
    }

    #[test]
    fn first_shape_wins() {
        let link = run(r#"{
            "files": [{"direct_link": "https://cdn.example/a.bin"}],
            "Extracted Info": [{"Direct Download Link": "https://other.example/b.bin"}]
        }"#)
        .unwrap();
        assert_eq!(link.direct_link.as_str(), "https://cdn.example/a.bin");
        assert!(!link.is_folder);
    }

    #[test]
    fn falls_through_to_second_shape() {
        let link = run(r#"{
            "files": [],
            "status": "success",
            "Extracted Info": [{"Direct Download Link": "https://other.example/b.bin", "Title": "b.bin"}]
        }"#)
        .unwrap();
        assert_eq!(link.direct_link.as_str(), "https://other.example/b.bin");
        assert_eq!(link.file_name.as_deref(), Some("b.bin"));
    }

    #[test]
    fn non_json_is_parse_error() {
        let err = run("<html>blocked</html>").unwrap_err();
        assert!(matches!(err, ResolveError::Parse(_)));
        assert_eq!(err.reason(), FailureReason::ParseError);
    }

    #[test]
    fn json_without_link_is_not_found() {
        assert_eq!(run(r#"{"files": []}"#), Err(ResolveError::NoLinkFound));
        assert_eq!(run(r#"{"error": "invalid share"}"#), Err(ResolveError::NoLinkFound));
    }

    #[test]
    fn junk_after_first_file_is_ignored() {
        for body in [
            r#"{"files": [{"direct_link": "https://cdn.example/x.mp4"}, "junk"]}"#,
            r#"{"files": [{"direct_link": "https://cdn.example/x.mp4"}, {"direct_link": 5}]}"#,
        ] {
            let link = run(body).unwrap();
            assert_eq!(link.direct_link.as_str(), "https://cdn.example/x.mp4");
            assert_eq!(link.file_count, 2);
        }
    }

    #[test]
    fn empty_folder_is_not_downloadable() {
        assert_eq!(
            run(r#"{"isFolder": true, "files": []}"#),
            Err(ResolveError::NoDownloadableFile)
        );
    }

    #[test]
    fn folder_with_file_still_resolves() {
        let link = run(r#"{"isFolder": true, "files": [{"direct_link": "https://cdn.example/f/1.jpg"}]}"#)
            .unwrap();
        assert!(link.is_folder);
        assert_eq!(link.file_count, 1);
    }
}
