//! Synthetic session responder
//!
//! Xtream clients validate a login with a bare
//! `player_api.php?username=..&password=..` call before doing anything else.
//! That probe is answered locally from the connection record; the upstream is
//! never contacted.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use url::Url;

use crate::config::SessionInfoConfig;
use crate::models::Connection;
use crate::utils::datetime::DateTimeParser;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Address the client used to reach this service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub hostname: String,
    pub port: Option<u16>,
    pub protocol: String,
}

impl ServerAddress {
    /// Derive from the inbound `Host` and `X-Forwarded-Proto` headers
    ///
    /// Default ports are dropped (`relay.example:80` over http has no port),
    /// which is what clients expect to see echoed back.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let protocol = headers
            .get(FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| v == "http" || v == "https")
            .unwrap_or_else(|| "http".to_string());

        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or("localhost");

        match Url::parse(&format!("{protocol}://{host}")) {
            Ok(url) => Self {
                hostname: url.host_str().unwrap_or("localhost").to_string(),
                port: url.port(),
                protocol,
            },
            Err(_) => Self {
                hostname: "localhost".to_string(),
                port: None,
                protocol,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfoResponse {
    pub user_info: UserInfo,
    pub server_info: ServerInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub password: String,
    pub message: String,
    pub auth: u8,
    pub status: String,
    pub exp_date: i64,
    pub is_trial: String,
    pub active_cons: String,
    pub created_at: i64,
    pub max_connections: String,
    pub allowed_output_formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub url: String,
    pub port: String,
    pub https_port: String,
    pub server_protocol: String,
    pub rtmp_port: String,
    pub timezone: String,
    pub timestamp_now: i64,
    pub time_now: String,
}

/// Builds session descriptors for probe requests
#[derive(Debug, Clone)]
pub struct SessionInfoResponder {
    config: SessionInfoConfig,
}

impl SessionInfoResponder {
    pub fn new(config: SessionInfoConfig) -> Self {
        Self { config }
    }

    pub fn respond(
        &self,
        connection: &Connection,
        address: &ServerAddress,
    ) -> SessionInfoResponse {
        self.respond_at(connection, address, Utc::now())
    }

    pub fn respond_at(
        &self,
        connection: &Connection,
        address: &ServerAddress,
        now: DateTime<Utc>,
    ) -> SessionInfoResponse {
        let now_secs = now.timestamp();

        let exp_date = match connection.expire_date {
            Some(expire_date) => expire_date.timestamp(),
            None => (now + Duration::days(self.config.default_validity_days)).timestamp(),
        };

        let created_at = Some(connection.created_at.timestamp())
            .filter(|secs| *secs > 0)
            .unwrap_or(now_secs);

        SessionInfoResponse {
            user_info: UserInfo {
                username: connection.public_credentials.username.clone(),
                password: connection.public_credentials.password.clone(),
                message: "Successfully logged in".to_string(),
                auth: 1,
                status: "Active".to_string(),
                exp_date,
                is_trial: "0".to_string(),
                active_cons: "0".to_string(),
                created_at,
                max_connections: self.config.max_connections.to_string(),
                allowed_output_formats: self.config.allowed_output_formats.clone(),
            },
            server_info: ServerInfo {
                url: address.hostname.clone(),
                port: address
                    .port
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "80".to_string()),
                https_port: "443".to_string(),
                server_protocol: address.protocol.clone(),
                rtmp_port: "0".to_string(),
                timezone: self.config.timezone.clone(),
                timestamp_now: now_secs,
                time_now: DateTimeParser::format_xtream_time(&now),
            },
        }
    }
}
