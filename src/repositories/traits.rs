//! Repository trait definitions

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::RepositoryResult;
use crate::models::{Connection, ConnectionCreateRequest, ConnectionUpdateRequest, User};

/// Keyed store of connection records
///
/// Management operations are scoped by `(id, owner_id)`: a record owned by
/// another account behaves exactly like a missing one.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Find the record whose public credentials match exactly
    ///
    /// When several records match, the oldest one wins (`created_at`, then
    /// `id`), so resolution is deterministic.
    async fn find_by_public_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> RepositoryResult<Option<Connection>>;

    /// All records of an owner, newest first
    async fn list_for_owner(&self, owner_id: Uuid) -> RepositoryResult<Vec<Connection>>;

    async fn find_for_owner(&self, id: Uuid, owner_id: Uuid)
        -> RepositoryResult<Option<Connection>>;

    /// Insert a new record; the request must already be normalized
    async fn create(
        &self,
        owner_id: Uuid,
        request: ConnectionCreateRequest,
    ) -> RepositoryResult<Connection>;

    /// Apply a partial update atomically, refreshing `updated_at`
    ///
    /// Returns `Ok(None)` when no record with this id belongs to the owner.
    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        request: ConnectionUpdateRequest,
    ) -> RepositoryResult<Option<Connection>>;

    /// Returns `Ok(false)` when no record with this id belongs to the owner
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> RepositoryResult<bool>;
}

/// New management account with an already hashed password
#[derive(Debug, Clone)]
pub struct UserCreateRequest {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Store of management accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;

    async fn create(&self, request: UserCreateRequest) -> RepositoryResult<User>;
}
