use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for configuration overrides,
/// e.g. `IPTV_RELAY__WEB__PORT=9000`
pub const ENV_PREFIX: &str = "IPTV_RELAY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub upstream: UpstreamConfig,
    pub session_info: SessionInfoConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Hard timeout for proxied `player_api.php` calls
    pub player_api_timeout_secs: u64,
    /// Hard timeout for the whole XMLTV transfer
    pub xmltv_timeout_secs: u64,
    /// User agent sent upstream when the client did not provide one
    pub default_user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfoConfig {
    /// IANA timezone reported in `server_info.timezone`
    pub timezone: String,
    /// Validity window reported for connections without an expiry date
    pub default_validity_days: i64,
    pub max_connections: u32,
    pub allowed_output_formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub session_ttl_secs: u64,
    pub cookie_secure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://./iptv-relay.db".to_string(),
                max_connections: Some(10),
            },
            web: WebConfig {
                host: "0.0.0.0".to_string(),
                port: 7860,
            },
            upstream: UpstreamConfig {
                player_api_timeout_secs: 10,
                xmltv_timeout_secs: 30,
                default_user_agent: "Mozilla/5.0".to_string(),
            },
            session_info: SessionInfoConfig {
                timezone: "America/New_York".to_string(),
                default_validity_days: 30,
                max_connections: 1,
                allowed_output_formats: vec!["m3u8".to_string(), "ts".to_string()],
            },
            auth: AuthConfig {
                admin_username: "admin".to_string(),
                admin_password: None,
                session_ttl_secs: 24 * 60 * 60,
                cookie_secure: false,
            },
        }
    }
}

impl UpstreamConfig {
    pub fn player_api_timeout(&self) -> Duration {
        Duration::from_secs(self.player_api_timeout_secs)
    }

    pub fn xmltv_timeout(&self) -> Duration {
        Duration::from_secs(self.xmltv_timeout_secs)
    }
}

impl Config {
    /// Load configuration from defaults, the given TOML file and the environment.
    ///
    /// A missing file is created with the default values so operators have
    /// something to edit.
    pub fn load(config_file: &str) -> Result<Self> {
        if !Path::new(config_file).exists() {
            let contents = toml::to_string_pretty(&Self::default())?;
            std::fs::write(config_file, contents)
                .with_context(|| format!("Failed to write default config to {config_file}"))?;
        }

        let config: Self = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::with_name(config_file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.session_info
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid session_info.timezone: {e}"))?;

        if self.upstream.player_api_timeout_secs == 0 || self.upstream.xmltv_timeout_secs == 0 {
            anyhow::bail!("Upstream timeouts must be greater than zero");
        }

        if self.session_info.default_validity_days <= 0 {
            anyhow::bail!("session_info.default_validity_days must be positive");
        }

        Ok(())
    }
}
