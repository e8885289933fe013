//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every upstream URL parses and uses http(s)
//! - Validate value ranges (timeouts > 0, rotation size > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `resolver.base_url`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
        }
    }

    check_http_url(&mut errors, "resolver.base_url", &config.resolver.base_url);
    if config.resolver.query_param.trim().is_empty() {
        errors.push(ValidationError::new("resolver.query_param", "must not be empty"));
    }
    if config.resolver.timeout_ms == 0 {
        errors.push(ValidationError::new("resolver.timeout_ms", "must be greater than zero"));
    }

    if config.file_host.timeout_ms == 0 {
        errors.push(ValidationError::new("file_host.timeout_ms", "must be greater than zero"));
    }
    if config.file_host.user_agent.trim().is_empty() {
        errors.push(ValidationError::new("file_host.user_agent", "must not be empty"));
    }

    if let Some(base) = &config.delivery.rewrap_base_url {
        check_http_url(&mut errors, "delivery.rewrap_base_url", base);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    } else {
        // The whole request must outlive a resolve followed by a file fetch.
        let upstream_ms = config
            .resolver
            .timeout_ms
            .saturating_add(config.file_host.timeout_ms);
        if config.timeouts.request_secs.saturating_mul(1000) <= upstream_ms {
            errors.push(ValidationError::new(
                "timeouts.request_secs",
                format!(
                    "must exceed resolver.timeout_ms + file_host.timeout_ms ({} ms)",
                    upstream_ms
                ),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.search_log.enabled {
        if config.search_log.path.trim().is_empty() {
            errors.push(ValidationError::new("search_log.path", "must not be empty"));
        }
        if config.search_log.max_bytes == 0 {
            errors.push(ValidationError::new("search_log.max_bytes", "must be greater than zero"));
        }
    }

    if config.sms.enabled {
        check_http_url(&mut errors, "sms.api_url", &config.sms.api_url);
        if config.sms.timeout_ms == 0 {
            errors.push(ValidationError::new("sms.timeout_ms", "must be greater than zero"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TlsConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProxyConfig::default();
        config.resolver.base_url = "ftp://resolver.example".into();
        config.resolver.timeout_ms = 0;
        config.delivery.rewrap_base_url = Some("not a url".into());
        config.listener.tls = Some(TlsConfig {
            cert_path: String::new(),
            key_path: "key.pem".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.tls.cert_path",
                "resolver.base_url",
                "resolver.timeout_ms",
                "delivery.rewrap_base_url",
            ]
        );
    }

    #[test]
    fn disabled_sections_are_not_checked() {
        let mut config = ProxyConfig::default();
        config.sms.api_url = String::new();
        config.search_log.max_bytes = 0;
        assert!(validate_config(&config).is_ok());

        config.sms.enabled = true;
        config.search_log.enabled = true;
        assert_eq!(validate_config(&config).unwrap_err().len(), 2);
    }

    #[test]
    fn request_timeout_must_outlive_upstream_deadlines() {
        let mut config = ProxyConfig::default();
        config.timeouts.request_secs = 1;
        config.resolver.timeout_ms = 5_000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");

        config.timeouts.request_secs = 20;
        config.file_host.timeout_ms = 15_000;
        assert_eq!(validate_config(&config).unwrap_err()[0].field, "timeouts.request_secs");

        config.timeouts.request_secs = 21;
        assert!(validate_config(&config).is_ok());
    }
}
