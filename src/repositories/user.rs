//! User repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use super::traits::{UserCreateRequest, UserStore};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::User;
use crate::utils::datetime::DateTimeParser;

pub struct UserRepository {
    pool: Pool<Sqlite>,
}

impl UserRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &SqliteRow) -> RepositoryResult<User> {
        let id: String = row
            .try_get("id")
            .map_err(|e| RepositoryError::invalid_data("id", e.to_string()))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| RepositoryError::invalid_data("created_at", e.to_string()))?;

        Ok(User {
            id: Uuid::parse_str(&id).map_err(|e| RepositoryError::invalid_data("id", e.to_string()))?,
            username: row
                .try_get("username")
                .map_err(|e| RepositoryError::invalid_data("username", e.to_string()))?,
            password_hash: row
                .try_get("password_hash")
                .map_err(|e| RepositoryError::invalid_data("password_hash", e.to_string()))?,
            is_admin: row
                .try_get("is_admin")
                .map_err(|e| RepositoryError::invalid_data("is_admin", e.to_string()))?,
            created_at: DateTimeParser::parse_flexible(&created_at)
                .map_err(|e| RepositoryError::invalid_data("created_at", e.to_string()))?,
        })
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, is_admin, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx("find_user_by_username", e))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, is_admin, created_at FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx("find_user_by_id", e))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn create(&self, request: UserCreateRequest) -> RepositoryResult<User> {
        let id = Uuid::new_v4();
        let now_str = DateTimeParser::format_for_storage(&Utc::now());

        let row = sqlx::query(
            "INSERT INTO users (id, username, password_hash, is_admin, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, username, password_hash, is_admin, created_at",
        )
        .bind(id.to_string())
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(request.is_admin)
        .bind(&now_str)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx("insert_user", e))?;

        Self::row_to_user(&row)
    }
}
