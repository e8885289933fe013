//! SMS gateway relay.
//!
//! Forwards `{number, message}` to the configured gateway as
//! `{"name": <message>, "mobile": <number>}` and hands back the gateway's
//! status and body unchanged.

use std::time::Duration;

use axum::http::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use axum::http::StatusCode;
use axum::body::Bytes;
use serde::Serialize;
use url::Url;

use crate::config::SmsConfig;
use crate::error::SetupError;
use crate::resilience::with_deadline;

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Mobile Safari/537.36";

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("SMS gateway unreachable: {0}")]
    Transport(String),

    #[error("SMS gateway did not answer within {}ms", .0.as_millis())]
    Timeout(Duration),
}

/// Gateway answer, relayed verbatim.
#[derive(Debug, Clone)]
pub struct RelayedReply {
    pub status: StatusCode,
    pub body: Bytes,
}

#[derive(Serialize)]
struct GatewayPayload<'a> {
    name: &'a str,
    mobile: &'a str,
}

#[derive(Debug, Clone)]
pub struct SmsRelay {
    http: reqwest::Client,
    api_url: Url,
    timeout: Duration,
}

impl SmsRelay {
    pub fn from_config(config: &SmsConfig) -> Result<Self, SetupError> {
        let api_url = Url::parse(&config.api_url).map_err(|source| SetupError::Url {
            field: "sms.api_url",
            source,
        })?;

        let origin = api_url.origin().ascii_serialization();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-GB,en-US;q=0.9,en;q=0.8"),
        );
        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?1"));
        headers.insert("sec-ch-ua-platform", HeaderValue::from_static("\"Android\""));
        headers.insert(
            ORIGIN,
            HeaderValue::from_str(&origin).map_err(|_| SetupError::Header("Origin"))?,
        );
        headers.insert(
            REFERER,
            HeaderValue::from_str(&format!("{}/", origin)).map_err(|_| SetupError::Header("Referer"))?,
        );

        let http = reqwest::Client::builder()
            .user_agent(MOBILE_USER_AGENT)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            http,
            api_url,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    pub async fn send(&self, number: &str, message: &str) -> Result<RelayedReply, SmsError> {
        let request = self
            .http
            .post(self.api_url.clone())
            .json(&GatewayPayload {
                name: message,
                mobile: number,
            });

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(RelayedReply { status, body })
        };

        match with_deadline(self.timeout, exchange).await {
            Ok(Ok(reply)) => {
                tracing::debug!(status = %reply.status, "SMS gateway answered");
                Ok(reply)
            }
            Ok(Err(e)) if e.is_timeout() => Err(SmsError::Timeout(self.timeout)),
            Ok(Err(e)) => Err(SmsError::Transport(e.to_string())),
            Err(_) => Err(SmsError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_api_url() {
        let config = SmsConfig {
            enabled: true,
            api_url: "not a url".into(),
            timeout_ms: 1000,
        };
        assert!(matches!(
            SmsRelay::from_config(&config),
            Err(SetupError::Url { field: "sms.api_url", .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_transport_error() {
        let config = SmsConfig {
            enabled: true,
            api_url: "http://127.0.0.1:9/api/sms/send-sms".into(),
            timeout_ms: 2000,
        };
        let relay = SmsRelay::from_config(&config).unwrap();
        let err = relay.send("0123456789", "hello").await.unwrap_err();
        assert!(matches!(err, SmsError::Transport(_) | SmsError::Timeout(_)));
    }
}
