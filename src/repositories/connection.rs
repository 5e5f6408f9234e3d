//! Connection repository
//!
//! SQLite-backed [`ConnectionStore`]. Timestamps are stored as RFC3339 text,
//! identifiers as hyphenated UUID strings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use super::traits::ConnectionStore;
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{
    Connection, ConnectionCreateRequest, ConnectionUpdateRequest, PublicCredentials,
    UpstreamTarget,
};
use crate::utils::datetime::DateTimeParser;

const CONNECTION_COLUMNS: &str = "id, owner_id, name, public_username, public_password, \
     upstream_base_url, upstream_username, upstream_password, expire_date, created_at, updated_at";

pub struct ConnectionRepository {
    pool: Pool<Sqlite>,
}

impl ConnectionRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn row_to_connection(row: &SqliteRow) -> RepositoryResult<Connection> {
        let get_string = |column: &str| -> RepositoryResult<String> {
            row.try_get::<String, _>(column)
                .map_err(|e| RepositoryError::invalid_data(column, e.to_string()))
        };
        let parse_uuid = |column: &str| -> RepositoryResult<Uuid> {
            Uuid::parse_str(&get_string(column)?)
                .map_err(|e| RepositoryError::invalid_data(column, e.to_string()))
        };
        let parse_timestamp = |column: &str, value: &str| -> RepositoryResult<DateTime<Utc>> {
            DateTimeParser::parse_flexible(value)
                .map_err(|e| RepositoryError::invalid_data(column, e.to_string()))
        };

        let expire_date = row
            .try_get::<Option<String>, _>("expire_date")
            .map_err(|e| RepositoryError::invalid_data("expire_date", e.to_string()))?
            .map(|value| parse_timestamp("expire_date", &value))
            .transpose()?;

        Ok(Connection {
            id: parse_uuid("id")?,
            owner_id: parse_uuid("owner_id")?,
            name: get_string("name")?,
            public_credentials: PublicCredentials {
                username: get_string("public_username")?,
                password: get_string("public_password")?,
            },
            upstream_target: UpstreamTarget {
                base_url: get_string("upstream_base_url")?,
                username: get_string("upstream_username")?,
                password: get_string("upstream_password")?,
            },
            expire_date,
            created_at: parse_timestamp("created_at", &get_string("created_at")?)?,
            updated_at: parse_timestamp("updated_at", &get_string("updated_at")?)?,
        })
    }
}

#[async_trait]
impl ConnectionStore for ConnectionRepository {
    async fn find_by_public_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> RepositoryResult<Option<Connection>> {
        let query = format!(
            "SELECT {CONNECTION_COLUMNS} FROM connections
             WHERE public_username = ? AND public_password = ?
             ORDER BY created_at ASC, id ASC
             LIMIT 1"
        );

        let row = sqlx::query(&query)
            .bind(username)
            .bind(password)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx("find_by_public_credentials", e))?;

        row.as_ref().map(Self::row_to_connection).transpose()
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<Connection>> {
        let query = format!(
            "SELECT {CONNECTION_COLUMNS} FROM connections
             WHERE owner_id = ?
             ORDER BY created_at DESC, id DESC"
        );

        let rows = sqlx::query(&query)
            .bind(owner_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx("list_connections_for_owner", e))?;

        rows.iter().map(Self::row_to_connection).collect()
    }

    async fn find_for_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> RepositoryResult<Option<Connection>> {
        let query =
            format!("SELECT {CONNECTION_COLUMNS} FROM connections WHERE id = ? AND owner_id = ?");

        let row = sqlx::query(&query)
            .bind(id.to_string())
            .bind(owner_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx("find_connection_for_owner", e))?;

        row.as_ref().map(Self::row_to_connection).transpose()
    }

    async fn create(
        &self,
        owner_id: Uuid,
        request: ConnectionCreateRequest,
    ) -> RepositoryResult<Connection> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let now_str = DateTimeParser::format_for_storage(&now);
        let expire_date = request
            .expire_date
            .as_ref()
            .map(DateTimeParser::format_for_storage);

        let query = format!(
            "INSERT INTO connections ({CONNECTION_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {CONNECTION_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(id.to_string())
            .bind(owner_id.to_string())
            .bind(&request.name)
            .bind(&request.public_credentials.username)
            .bind(&request.public_credentials.password)
            .bind(&request.upstream_target.base_url)
            .bind(&request.upstream_target.username)
            .bind(&request.upstream_target.password)
            .bind(expire_date)
            .bind(&now_str)
            .bind(&now_str)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx("insert_connection", e))?;

        Self::row_to_connection(&row)
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        request: ConnectionUpdateRequest,
    ) -> RepositoryResult<Option<Connection>> {
        let now_str = DateTimeParser::format_for_storage(&Utc::now());
        let (public_username, public_password) = match request.public_credentials {
            Some(credentials) => (Some(credentials.username), Some(credentials.password)),
            None => (None, None),
        };
        let (base_url, upstream_username, upstream_password) = match request.upstream_target {
            Some(target) => (
                Some(target.base_url),
                Some(target.username),
                Some(target.password),
            ),
            None => (None, None, None),
        };
        let replace_expire_date = request.expire_date.is_some();
        let expire_date = request
            .expire_date
            .flatten()
            .as_ref()
            .map(DateTimeParser::format_for_storage);

        // One statement, so concurrent updates to the same record serialize
        // inside SQLite and the last writer wins field by field.
        let query = format!(
            "UPDATE connections SET
                 name = COALESCE(?, name),
                 public_username = COALESCE(?, public_username),
                 public_password = COALESCE(?, public_password),
                 upstream_base_url = COALESCE(?, upstream_base_url),
                 upstream_username = COALESCE(?, upstream_username),
                 upstream_password = COALESCE(?, upstream_password),
                 expire_date = CASE WHEN ? THEN ? ELSE expire_date END,
                 updated_at = ?
             WHERE id = ? AND owner_id = ?
             RETURNING {CONNECTION_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(request.name)
            .bind(public_username)
            .bind(public_password)
            .bind(base_url)
            .bind(upstream_username)
            .bind(upstream_password)
            .bind(replace_expire_date)
            .bind(expire_date)
            .bind(&now_str)
            .bind(id.to_string())
            .bind(owner_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx("update_connection", e))?;

        row.as_ref().map(Self::row_to_connection).transpose()
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM connections WHERE id = ? AND owner_id = ?")
            .bind(id.to_string())
            .bind(owner_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx("delete_connection", e))?;

        Ok(result.rows_affected() > 0)
    }
}
