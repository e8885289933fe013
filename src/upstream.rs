//! Outbound HTTP client shared by the resolver and the file fetcher.
//!
//! File hosts and resolvers commonly reject requests that do not look like a
//! browser, so every outbound call carries the configured User-Agent and Referer.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER};

use crate::config::FileHostConfig;
use crate::error::SetupError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the pooled client used for resolver calls and file fetches.
pub fn browser_client(config: &FileHostConfig) -> Result<reqwest::Client, SetupError> {
    let mut headers = HeaderMap::new();
    if !config.referer.is_empty() {
        headers.insert(
            REFERER,
            HeaderValue::from_str(&config.referer).map_err(|_| SetupError::Header("referer"))?,
        );
    }
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()?;

    Ok(client)
}
