//! Delivery subsystem: turns a source URL into a client response.
//!
//! # Data Flow
//! ```text
//! ResolveRequest
//!     → resolver (direct link or ResolveError)
//!     → mode.rs (redirect | proxy)
//!         redirect → 302 to direct link (or link-fixer rewrap)
//!         proxy    → stream.rs (relay, or Recovered → 302 to direct link)
//! ```
//!
//! # Design Decisions
//! - Resolution and fetch run in sequence; the fetch needs the resolved link
//! - Nothing is shared between requests except the immutable clients

pub mod mode;
pub mod stream;

use std::time::Duration;

use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use url::Url;

use crate::config::{DeliveryMode, ProxyConfig};
use crate::error::{ProxyError, SetupError};
use crate::resolver::{ResolveRequest, ResolvedLink, ResolverClient};
use crate::security::SanitizeOptions;
use crate::upstream::browser_client;

pub use mode::{redirect_target, select_mode};
pub use stream::{FallbackAction, FetchError, FileFetcher, StreamOutcome};

/// What the client is sent for a resolved link.
#[derive(Debug)]
pub enum Delivery {
    /// Redirect mode: 302 to the direct link or its rewrap.
    Redirect { location: Url },
    /// Proxy mode: relayed, or recovered with a fallback redirect.
    Stream(StreamOutcome),
}

impl Delivery {
    /// Metrics / log label.
    pub fn label(&self) -> &'static str {
        match self {
            Delivery::Redirect { .. } => "redirect",
            Delivery::Stream(StreamOutcome::Relayed(_)) => "proxy",
            Delivery::Stream(StreamOutcome::Recovered { .. }) => "fallback",
        }
    }
}

impl IntoResponse for Delivery {
    fn into_response(self) -> Response {
        match self {
            Delivery::Redirect { location } => mode::found(&location),
            Delivery::Stream(outcome) => outcome.into_response(),
        }
    }
}

/// Resolver, file fetcher and delivery options for one configuration snapshot.
#[derive(Debug, Clone)]
pub struct LinkProxy {
    resolver: ResolverClient,
    fetcher: FileFetcher,
    rewrap_base: Option<Url>,
    options: SanitizeOptions,
}

impl LinkProxy {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, SetupError> {
        let http = browser_client(&config.file_host)?;
        let resolver = ResolverClient::with_http(http.clone(), &config.resolver)?;
        let fetcher = FileFetcher::new(http, Duration::from_millis(config.file_host.timeout_ms));

        let rewrap_base = config
            .delivery
            .rewrap_base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|source| SetupError::Url {
                field: "delivery.rewrap_base_url",
                source,
            })?;

        Ok(Self {
            resolver,
            fetcher,
            rewrap_base,
            options: SanitizeOptions {
                expose_headers: config.delivery.expose_headers,
                force_download: config.delivery.force_download,
            },
        })
    }

    pub fn resolver(&self) -> &ResolverClient {
        &self.resolver
    }

    /// Resolve the source URL and deliver it in the requested mode.
    pub async fn deliver(
        &self,
        request: &ResolveRequest,
        client_headers: &HeaderMap,
    ) -> Result<Delivery, ProxyError> {
        let link = self.resolver.resolve(request).await?;

        tracing::info!(
            direct_link = %link.direct_link,
            file_name = link.file_name.as_deref().unwrap_or("-"),
            is_folder = link.is_folder,
            mode = request.mode.as_str(),
            "Source resolved"
        );

        Ok(self.deliver_resolved(&link, request.mode, client_headers).await)
    }

    /// Deliver an already resolved link.
    pub async fn deliver_resolved(
        &self,
        link: &ResolvedLink,
        mode: DeliveryMode,
        client_headers: &HeaderMap,
    ) -> Delivery {
        match mode {
            DeliveryMode::Redirect => Delivery::Redirect {
                location: redirect_target(&link.direct_link, self.rewrap_base.as_ref()),
            },
            DeliveryMode::Proxy => {
                Delivery::Stream(self.fetcher.stream(link, client_headers, self.options).await)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> ResolvedLink {
        ResolvedLink {
            direct_link: Url::parse("https://cdn.example/x.mp4").unwrap(),
            file_name: Some("x.mp4".into()),
            is_folder: false,
            file_count: 1,
        }
    }

    #[tokio::test]
    async fn redirect_mode_uses_rewrap_when_configured() {
        let mut config = ProxyConfig::default();
        config.delivery.rewrap_base_url = Some("https://fixer.example/".into());
        let proxy = LinkProxy::from_config(&config).unwrap();

        let delivery = proxy
            .deliver_resolved(&link(), DeliveryMode::Redirect, &HeaderMap::new())
            .await;

        match delivery {
            Delivery::Redirect { location } => {
                assert_eq!(location.as_str(), "https://fixer.example/?url=https%3A%2F%2Fcdn.example%2Fx.mp4");
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn redirect_mode_defaults_to_direct_link() {
        let proxy = LinkProxy::from_config(&ProxyConfig::default()).unwrap();
        let delivery = proxy
            .deliver_resolved(&link(), DeliveryMode::Redirect, &HeaderMap::new())
            .await;
        assert_eq!(delivery.label(), "redirect");

        let response = delivery.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::FOUND);
        assert_eq!(response.headers()[axum::http::header::LOCATION], "https://cdn.example/x.mp4");
    }

    #[test]
    fn bad_rewrap_url_is_setup_error() {
        let mut config = ProxyConfig::default();
        config.delivery.rewrap_base_url = Some("::".into());
        let err = LinkProxy::from_config(&config).unwrap_err();
        assert!(matches!(err, SetupError::Url { field: "delivery.rewrap_base_url", .. }));
    }
}
