//! URL utilities for upstream base URLs
//!
//! Operators type upstream addresses by hand, frequently without a scheme or
//! with a trailing slash. These helpers give every stored base URL one shape so
//! endpoint paths can simply be appended.

use url::Url;

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Ensure the URL has an HTTP/HTTPS scheme, defaulting to HTTP
    ///
    /// ```rust
    /// use iptv_relay::utils::url::UrlUtils;
    ///
    /// assert_eq!(UrlUtils::normalize_scheme("example.com"), "http://example.com");
    /// assert_eq!(UrlUtils::normalize_scheme("https://example.com"), "https://example.com");
    /// ```
    pub fn normalize_scheme(url: &str) -> String {
        let trimmed = url.trim();

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        }
    }

    /// Normalize and validate an upstream base URL
    ///
    /// Adds a missing scheme, strips trailing slashes, and rejects anything
    /// that is not an absolute http(s) URL with a host. Query strings and
    /// fragments are rejected since endpoint paths get appended.
    ///
    /// ```rust
    /// use iptv_relay::utils::url::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::normalize_base_url("origin.example:8080/").unwrap(),
    ///     "http://origin.example:8080"
    /// );
    /// ```
    pub fn normalize_base_url(url: &str) -> Result<String, String> {
        let mut normalized = Self::normalize_scheme(url);
        while normalized.ends_with('/') {
            normalized.pop();
        }

        let parsed = Url::parse(&normalized).map_err(|e| format!("invalid URL: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("unsupported scheme '{}'", parsed.scheme()));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err("URL has no host".to_string());
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err("URL must not contain a query string or fragment".to_string());
        }

        Ok(normalized)
    }

    /// Host (and port) of a URL, safe for logs since it never includes the
    /// path or query where upstream credentials live
    pub fn host_for_logging(url: &str) -> String {
        match Url::parse(url) {
            Ok(parsed) => match (parsed.host_str(), parsed.port()) {
                (Some(host), Some(port)) => format!("{host}:{port}"),
                (Some(host), None) => host.to_string(),
                _ => "<unknown>".to_string(),
            },
            Err(_) => "<invalid>".to_string(),
        }
    }
}
