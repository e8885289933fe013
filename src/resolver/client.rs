//! HTTP client for the upstream resolver API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT;
use url::Url;

use crate::config::{FileHostConfig, ResolverConfig};
use crate::error::SetupError;
use crate::resilience::with_deadline;
use crate::upstream::browser_client;

use super::{default_strategies, interpret, ExtractionStrategy, ResolveError, ResolveRequest, ResolveResult};

/// Calls the resolver and interprets its answer.
#[derive(Clone)]
pub struct ResolverClient {
    http: reqwest::Client,
    base_url: Url,
    query_param: String,
    timeout: Duration,
    strategies: Arc<[Box<dyn ExtractionStrategy>]>,
}

impl ResolverClient {
    /// Build a client with its own connection pool.
    pub fn new(resolver: &ResolverConfig, browser: &FileHostConfig) -> Result<Self, SetupError> {
        Self::with_http(browser_client(browser)?, resolver)
    }

    /// Build a client on top of an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, resolver: &ResolverConfig) -> Result<Self, SetupError> {
        let base_url = Url::parse(&resolver.base_url).map_err(|source| SetupError::Url {
            field: "resolver.base_url",
            source,
        })?;

        Ok(Self {
            http,
            base_url,
            query_param: resolver.query_param.clone(),
            timeout: Duration::from_millis(resolver.timeout_ms),
            strategies: default_strategies().into(),
        })
    }

    /// The resolver URL for `source`, with the source percent-encoded into the query.
    pub fn endpoint_for(&self, source: &str) -> Url {
        let mut endpoint = self.base_url.clone();
        endpoint.query_pairs_mut().append_pair(&self.query_param, source);
        endpoint
    }

    /// Resolve one source URL. Never fails with anything but a `ResolveError`.
    pub async fn resolve(&self, request: &ResolveRequest) -> ResolveResult {
        let limit = request.timeout.unwrap_or(self.timeout);
        let endpoint = self.endpoint_for(&request.source);

        tracing::debug!(endpoint = %endpoint, timeout_ms = limit.as_millis() as u64, "Calling resolver");

        let call = async {
            let response = self
                .http
                .get(endpoint)
                .header(ACCEPT, "application/json, text/plain, */*")
                .send()
                .await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match with_deadline(limit, call).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) if e.is_timeout() => return Err(ResolveError::Timeout(limit)),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Resolver request failed");
                return Err(ResolveError::Unreachable(e.to_string()));
            }
            Err(_) => {
                tracing::warn!(timeout_ms = limit.as_millis() as u64, "Resolver timed out");
                return Err(ResolveError::Timeout(limit));
            }
        };

        if !status.is_success() {
            tracing::warn!(status = %status, "Resolver returned error status");
            return Err(ResolveError::UpstreamStatus(status.as_u16()));
        }

        interpret(&body, &self.strategies)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for ResolverClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverClient")
            .field("base_url", &self.base_url.as_str())
            .field("query_param", &self.query_param)
            .field("timeout", &self.timeout)
            .finish()
    }
}
