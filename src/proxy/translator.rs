//! Request translation
//!
//! Inbound Xtream requests carry the public credentials in the query string.
//! Translation swaps them for the upstream credentials, keeps every other
//! query pair as-is, and forwards only an allow-list of headers.

use axum::http::{header, HeaderMap};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::UpstreamConfig;
use crate::errors::{ProxyError, ProxyResult};
use crate::models::Connection;
use crate::utils::url::UrlUtils;

const USERNAME_PARAM: &str = "username";
const PASSWORD_PARAM: &str = "password";

/// The two upstream endpoints this service fronts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XtreamEndpoint {
    PlayerApi,
    Xmltv,
}

impl XtreamEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::PlayerApi => "/player_api.php",
            Self::Xmltv => "/xmltv.php",
        }
    }

    fn accept(&self) -> &'static str {
        match self {
            Self::PlayerApi => "application/json",
            Self::Xmltv => "application/xml,text/xml,*/*",
        }
    }
}

/// Inbound query split into credentials and pass-through pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XtreamQuery {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Every non-credential pair, in inbound order
    pub passthrough: Vec<(String, String)>,
}

impl XtreamQuery {
    /// Parse a raw (still percent-encoded) query string
    ///
    /// The first `username`/`password` occurrence wins; repeated occurrences
    /// are dropped rather than forwarded upstream.
    pub fn parse(raw_query: Option<&str>) -> Self {
        let mut query = Self::default();

        for (key, value) in url::form_urlencoded::parse(raw_query.unwrap_or("").as_bytes()) {
            match key.as_ref() {
                USERNAME_PARAM => {
                    query.username.get_or_insert_with(|| value.into_owned());
                }
                PASSWORD_PARAM => {
                    query.password.get_or_insert_with(|| value.into_owned());
                }
                _ => query.passthrough.push((key.into_owned(), value.into_owned())),
            }
        }

        query
    }

    /// Both credentials, when present and non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some((username, password))
            }
            _ => None,
        }
    }

    /// A login probe carries the credentials and nothing else
    pub fn is_probe(&self) -> bool {
        self.passthrough.is_empty()
    }
}

/// Fully built outbound request
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub endpoint: XtreamEndpoint,
    pub url: Url,
    /// Allow-listed headers only
    pub headers: Vec<(&'static str, String)>,
    pub timeout: Duration,
}

impl UpstreamRequest {
    /// `host[:port]` of the target, for logs
    pub fn host_for_logging(&self) -> String {
        UrlUtils::host_for_logging(self.url.as_str())
    }
}

/// Builds upstream requests from resolved connections
#[derive(Debug, Clone)]
pub struct RequestTranslator {
    player_api_timeout: Duration,
    xmltv_timeout: Duration,
    default_user_agent: String,
}

impl RequestTranslator {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            player_api_timeout: config.player_api_timeout(),
            xmltv_timeout: config.xmltv_timeout(),
            default_user_agent: config.default_user_agent.clone(),
        }
    }

    pub fn translate(
        &self,
        endpoint: XtreamEndpoint,
        connection: &Connection,
        query: &XtreamQuery,
        inbound_headers: &HeaderMap,
    ) -> ProxyResult<UpstreamRequest> {
        let target = &connection.upstream_target;
        let base_url = target.base_url.trim_end_matches('/');

        let mut url = Url::parse(&format!("{}{}", base_url, endpoint.path()))
            .map_err(|e| ProxyError::upstream_unavailable(format!("invalid upstream base URL: {e}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(USERNAME_PARAM, &target.username);
            pairs.append_pair(PASSWORD_PARAM, &target.password);
            for (key, value) in &query.passthrough {
                pairs.append_pair(key, value);
            }
        }

        let headers = self.forwarded_headers(endpoint, inbound_headers);
        let timeout = match endpoint {
            XtreamEndpoint::PlayerApi => self.player_api_timeout,
            XtreamEndpoint::Xmltv => self.xmltv_timeout,
        };

        debug!(
            connection_id = %connection.id,
            endpoint = endpoint.path(),
            upstream = %UrlUtils::host_for_logging(url.as_str()),
            passthrough_params = query.passthrough.len(),
            "Translated request for upstream"
        );

        Ok(UpstreamRequest {
            endpoint,
            url,
            headers,
            timeout,
        })
    }

    fn forwarded_headers(
        &self,
        endpoint: XtreamEndpoint,
        inbound: &HeaderMap,
    ) -> Vec<(&'static str, String)> {
        let inbound_value = |name: header::HeaderName| {
            inbound
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let mut headers = vec![("accept", endpoint.accept().to_string())];

        match endpoint {
            XtreamEndpoint::PlayerApi => {
                let user_agent = inbound_value(header::USER_AGENT)
                    .unwrap_or_else(|| self.default_user_agent.clone());
                headers.push(("user-agent", user_agent));
            }
            XtreamEndpoint::Xmltv => {
                if let Some(user_agent) = inbound_value(header::USER_AGENT) {
                    headers.push(("user-agent", user_agent));
                }
                if let Some(language) = inbound_value(header::ACCEPT_LANGUAGE) {
                    headers.push(("accept-language", language));
                }
            }
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{PublicCredentials, UpstreamTarget};
    use axum::http::HeaderValue;
    use chrono::Utc;
    use uuid::Uuid;

    fn connection(base_url: &str) -> Connection {
        let now = Utc::now();
        Connection {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Test".to_string(),
            public_credentials: PublicCredentials {
                username: "u1".to_string(),
                password: "p1".to_string(),
            },
            upstream_target: UpstreamTarget {
                base_url: base_url.to_string(),
                username: "ou1".to_string(),
                password: "op1".to_string(),
            },
            expire_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn translator() -> RequestTranslator {
        RequestTranslator::new(&Config::default().upstream)
    }

    #[test]
    fn test_parse_splits_credentials_from_passthrough() {
        let query = XtreamQuery::parse(Some(
            "username=u1&password=p1&action=get_live_streams&category_id=7",
        ));
        assert_eq!(query.credentials(), Some(("u1", "p1")));
        assert!(!query.is_probe());
        assert_eq!(
            query.passthrough,
            vec![
                ("action".to_string(), "get_live_streams".to_string()),
                ("category_id".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_probe_and_missing_credentials() {
        let probe = XtreamQuery::parse(Some("username=u1&password=p1"));
        assert!(probe.is_probe());

        assert_eq!(XtreamQuery::parse(None).credentials(), None);
        assert_eq!(XtreamQuery::parse(Some("username=u1")).credentials(), None);
        assert_eq!(
            XtreamQuery::parse(Some("username=&password=p1")).credentials(),
            None
        );
    }

    #[test]
    fn test_parse_decodes_values_and_drops_repeated_credentials() {
        let query = XtreamQuery::parse(Some(
            "username=a%20b&password=p%26q&username=other&search=news+24",
        ));
        assert_eq!(query.credentials(), Some(("a b", "p&q")));
        assert_eq!(
            query.passthrough,
            vec![("search".to_string(), "news 24".to_string())]
        );
    }

    #[test]
    fn test_translate_replaces_credentials() {
        let query = XtreamQuery::parse(Some(
            "username=u1&password=p1&action=get_live_categories",
        ));
        let request = translator()
            .translate(
                XtreamEndpoint::PlayerApi,
                &connection("http://origin.example"),
                &query,
                &HeaderMap::new(),
            )
            .unwrap();

        let query_string = request.url.query().unwrap();
        assert!(query_string.contains("username=ou1"));
        assert!(query_string.contains("password=op1"));
        assert!(query_string.contains("action=get_live_categories"));
        assert!(request.url.query_pairs().all(|(_, value)| value != "p1"));
        assert_eq!(request.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_translate_builds_exact_player_api_url() {
        let query = XtreamQuery::parse(Some(
            "username=u1&password=p1&action=get_vod_categories",
        ));
        let request = translator()
            .translate(
                XtreamEndpoint::PlayerApi,
                &connection("http://origin.example/"),
                &query,
                &HeaderMap::new(),
            )
            .unwrap();

        assert_eq!(
            request.url.as_str(),
            "http://origin.example/player_api.php?username=ou1&password=op1&action=get_vod_categories"
        );
    }

    #[test]
    fn test_translate_xmltv_uses_long_timeout_and_header_allow_list() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::USER_AGENT, HeaderValue::from_static("VLC/3.0"));
        inbound.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("de-DE"));
        inbound.insert(header::COOKIE, HeaderValue::from_static("session=secret"));
        inbound.insert(header::HOST, HeaderValue::from_static("relay.example"));
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer x"));

        let query = XtreamQuery::parse(Some("username=u1&password=p1"));
        let request = translator()
            .translate(
                XtreamEndpoint::Xmltv,
                &connection("http://origin.example:8080"),
                &query,
                &inbound,
            )
            .unwrap();

        assert_eq!(
            request.url.as_str(),
            "http://origin.example:8080/xmltv.php?username=ou1&password=op1"
        );
        assert_eq!(request.timeout, Duration::from_secs(30));

        let names: Vec<&str> = request.headers.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["accept", "user-agent", "accept-language"]);
        assert!(request
            .headers
            .iter()
            .all(|(_, value)| !value.contains("secret") && value != "relay.example"));
    }

    #[test]
    fn test_player_api_defaults_user_agent() {
        let query = XtreamQuery::parse(Some("username=u1&password=p1&action=x"));
        let request = translator()
            .translate(
                XtreamEndpoint::PlayerApi,
                &connection("http://origin.example"),
                &query,
                &HeaderMap::new(),
            )
            .unwrap();

        assert!(request
            .headers
            .contains(&("user-agent", "Mozilla/5.0".to_string())));
        assert!(request
            .headers
            .contains(&("accept", "application/json".to_string())));
    }

    #[test]
    fn test_invalid_base_url_is_upstream_failure() {
        let query = XtreamQuery::parse(Some("username=u1&password=p1&action=x"));
        let result = translator().translate(
            XtreamEndpoint::PlayerApi,
            &connection("not a url"),
            &query,
            &HeaderMap::new(),
        );
        assert!(matches!(result, Err(ProxyError::UpstreamUnavailable { .. })));
    }
}
