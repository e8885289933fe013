//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Desktop Chrome user agent sent to resolvers and file hosts.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36";

/// Source hosts accepted when no explicit list is configured.
pub const DEFAULT_SOURCE_HOSTS: &[&str] = &[
    "terabox.com",
    "teraboxapp.com",
    "1024terabox.com",
    "terafileshare.com",
    "teraboxlink.com",
    "terasharelink.com",
];

/// Root configuration for the link proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Upstream resolver API settings.
    pub resolver: ResolverConfig,

    /// Settings for fetching files from the resolved direct link.
    pub file_host: FileHostConfig,

    /// Redirect / proxy-stream behaviour.
    pub delivery: DeliveryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Append-only request log.
    pub search_log: SearchLogConfig,

    /// SMS relay endpoint.
    pub sms: SmsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Resolver API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Base URL of the extraction API. The source URL is appended as a query parameter.
    pub base_url: String,

    /// Name of the query parameter carrying the source URL.
    pub query_param: String,

    /// Resolver call timeout in milliseconds.
    pub timeout_ms: u64,

    /// Hosts accepted as source URLs. Empty accepts any host.
    pub allowed_source_hosts: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: "https://terabox.bdbots.xyz/dl".to_string(),
            query_param: "url".to_string(),
            timeout_ms: 10_000,
            allowed_source_hosts: DEFAULT_SOURCE_HOSTS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

/// File host fetch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileHostConfig {
    /// User-Agent presented to resolvers and file hosts.
    pub user_agent: String,

    /// Referer presented to resolvers and file hosts.
    pub referer: String,

    /// Timeout for the file fetch (until response headers arrive) in milliseconds.
    pub timeout_ms: u64,
}

impl Default for FileHostConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: "https://www.terabox.com/".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// How a resolved link is handed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Relay the file bytes through the proxy.
    #[default]
    Proxy,
    /// Answer with a 302 to the direct link.
    Redirect,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Proxy => "proxy",
            DeliveryMode::Redirect => "redirect",
        }
    }
}

/// Delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Mode used when the request does not carry a `proxy` flag.
    pub default_mode: DeliveryMode,

    /// Optional link-fixer base URL; redirects are re-wrapped as `<base>?url=<direct link>`.
    pub rewrap_base_url: Option<String>,

    /// Set `Content-Disposition: attachment` when the resolver reported a filename.
    pub force_download: bool,

    /// Set `Access-Control-Expose-Headers: *` on relayed responses.
    pub expose_headers: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            default_mode: DeliveryMode::Proxy,
            rewrap_base_url: None,
            force_download: true,
            expose_headers: true,
        }
    }
}

/// Timeout configuration for the inbound side.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to produce response headers, in seconds.
    pub request_secs: u64,

    /// Time allowed for in-flight requests to drain on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchLogConfig {
    pub enabled: bool,

    /// Path of the active log file.
    pub path: String,

    /// Size above which the log is archived and restarted.
    pub max_bytes: u64,
}

impl Default for SearchLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "logs/link_searches.log".to_string(),
            max_bytes: 1024 * 1024, // 1 MiB
        }
    }
}

/// SMS relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SmsConfig {
    pub enabled: bool,

    /// Messaging API endpoint receiving the JSON POST.
    pub api_url: String,

    pub timeout_ms: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://appbowl.com/api/sms/send-sms".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [resolver]
            base_url = "http://127.0.0.1:9000/api"
            "#,
        )
        .unwrap();

        assert_eq!(config.resolver.base_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.resolver.timeout_ms, 10_000);
        assert_eq!(config.delivery.default_mode, DeliveryMode::Proxy);
        assert_eq!(config.search_log.max_bytes, 1_048_576);
        assert!(!config.sms.enabled);
    }

    #[test]
    fn delivery_mode_parses_lowercase() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [delivery]
            default_mode = "redirect"
            rewrap_base_url = "https://fixer.example/"
            "#,
        )
        .unwrap();

        assert_eq!(config.delivery.default_mode, DeliveryMode::Redirect);
        assert_eq!(config.delivery.rewrap_base_url.as_deref(), Some("https://fixer.example/"));
    }
}
