use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::utils::datetime::{deserialize_optional_datetime, DateTimeParser};

/// Credentials an IPTV client presents to this service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicCredentials {
    pub username: String,
    pub password: String,
}

/// The real IPTV provider a connection forwards to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpstreamTarget {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

/// A public-credential to upstream mapping owned by one account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub public_credentials: PublicCredentials,
    pub upstream_target: UpstreamTarget,
    pub expire_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConnectionCreateRequest {
    pub name: String,
    pub public_credentials: PublicCredentials,
    pub upstream_target: UpstreamTarget,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub expire_date: Option<DateTime<Utc>>,
}

/// Partial update; absent fields are left untouched
///
/// `expire_date` distinguishes "absent" (`None`) from an explicit `null`
/// (`Some(None)`), which clears the expiry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConnectionUpdateRequest {
    pub name: Option<String>,
    pub public_credentials: Option<PublicCredentials>,
    pub upstream_target: Option<UpstreamTarget>,
    #[serde(default, deserialize_with = "deserialize_expire_date_patch")]
    pub expire_date: Option<Option<DateTime<Utc>>>,
}

impl ConnectionUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.public_credentials.is_none()
            && self.upstream_target.is_none()
            && self.expire_date.is_none()
    }
}

fn deserialize_expire_date_patch<'de, D>(
    deserializer: D,
) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(Some(None)),
        Some(s) => DateTimeParser::parse_flexible(s)
            .map(|dt| Some(Some(dt)))
            .map_err(serde::de::Error::custom),
    }
}
