//! Source URL validation.
//!
//! The `url` parameter must be an absolute http(s) URL whose host belongs to
//! one of the configured share domains (or any host when the list is empty).

use url::Url;

use crate::error::ProxyError;

/// Validate the raw `url` parameter and return it parsed.
pub fn validate_source(raw: &str, allowed_hosts: &[String]) -> Result<Url, ProxyError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ProxyError::MissingParameter("url"));
    }

    let url = Url::parse(raw).map_err(|e| ProxyError::InvalidSourceUrl(format!("{}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProxyError::InvalidSourceUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .ok_or_else(|| ProxyError::InvalidSourceUrl(format!("{} has no host", raw)))?;

    if !allowed_hosts.is_empty() && !allowed_hosts.iter().any(|h| host_matches(host, h)) {
        return Err(ProxyError::InvalidSourceUrl(format!(
            "host '{}' is not a supported share domain",
            host
        )));
    }

    Ok(url)
}

/// `host` equals `domain` or is one of its subdomains.
fn host_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('.');
    if domain.is_empty() {
        return false;
    }
    host.eq_ignore_ascii_case(domain)
        || (host.len() > domain.len()
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
            && host[host.len() - domain.len()..].eq_ignore_ascii_case(domain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DEFAULT_SOURCE_HOSTS;
    use crate::error::FailureReason;

    fn defaults() -> Vec<String> {
        DEFAULT_SOURCE_HOSTS.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn accepts_share_domains_and_subdomains() {
        assert!(validate_source("https://terabox.com/s/abc123", &defaults()).is_ok());
        assert!(validate_source("https://www.1024terabox.com/s/1x", &defaults()).is_ok());
        assert!(validate_source(" https://teraboxapp.com/sharing/link?surl=a ", &defaults()).is_ok());
    }

    #[test]
    fn rejects_lookalike_hosts() {
        let err = validate_source("https://evilterabox.com/s/abc", &defaults()).unwrap_err();
        assert_eq!(err.reason(), FailureReason::InvalidSourceUrl);
        assert!(validate_source("https://terabox.com.evil.net/s/abc", &defaults()).is_err());
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(validate_source("ftp://terabox.com/s/abc", &defaults()).is_err());
        assert!(validate_source("terabox.com/s/abc", &defaults()).is_err());
    }

    #[test]
    fn empty_list_accepts_any_host() {
        assert!(validate_source("https://files.example.org/share/9", &[]).is_ok());
    }

    #[test]
    fn blank_is_missing_parameter() {
        let err = validate_source("   ", &defaults()).unwrap_err();
        assert_eq!(err.reason(), FailureReason::MissingParameter);
    }
}
