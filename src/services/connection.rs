//! Connection Service
//!
//! Business logic for managing connections: input validation, base URL
//! normalization and owner scoping on top of the connection store.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult, RepositoryError},
    models::{
        Connection, ConnectionCreateRequest, ConnectionUpdateRequest, PublicCredentials,
        UpstreamTarget,
    },
    repositories::ConnectionStore,
    utils::url::UrlUtils,
};

const RESOURCE: &str = "connection";

#[derive(Clone)]
pub struct ConnectionService {
    store: Arc<dyn ConnectionStore>,
}

impl ConnectionService {
    pub fn new(store: Arc<dyn ConnectionStore>) -> Self {
        Self { store }
    }

    /// List the owner's connections, newest first
    pub async fn list(&self, owner_id: Uuid) -> AppResult<Vec<Connection>> {
        Ok(self.store.list_for_owner(owner_id).await?)
    }

    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> AppResult<Connection> {
        self.store
            .find_for_owner(id, owner_id)
            .await?
            .ok_or_else(|| AppError::not_found(RESOURCE, id.to_string()))
    }

    /// Create a connection
    pub async fn create(
        &self,
        owner_id: Uuid,
        mut request: ConnectionCreateRequest,
    ) -> AppResult<Connection> {
        request.name = validate_name(&request.name)?;
        validate_public_credentials(&request.public_credentials)?;
        request.upstream_target = validate_upstream_target(request.upstream_target)?;

        let connection = self
            .store
            .create(owner_id, request)
            .await
            .map_err(map_write_error)?;

        info!(
            connection_id = %connection.id,
            owner_id = %owner_id,
            upstream = %UrlUtils::host_for_logging(&connection.upstream_target.base_url),
            "Created connection"
        );
        Ok(connection)
    }

    /// Apply a partial update
    ///
    /// Fields absent from the request keep their stored values.
    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        mut request: ConnectionUpdateRequest,
    ) -> AppResult<Connection> {
        if request.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }

        if let Some(name) = request.name.as_deref() {
            request.name = Some(validate_name(name)?);
        }
        if let Some(credentials) = request.public_credentials.as_ref() {
            validate_public_credentials(credentials)?;
        }
        if let Some(target) = request.upstream_target.take() {
            request.upstream_target = Some(validate_upstream_target(target)?);
        }

        let connection = self
            .store
            .update(id, owner_id, request)
            .await
            .map_err(map_write_error)?
            .ok_or_else(|| AppError::not_found(RESOURCE, id.to_string()))?;

        info!(connection_id = %id, owner_id = %owner_id, "Updated connection");
        Ok(connection)
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        if !self.store.delete(id, owner_id).await? {
            return Err(AppError::not_found(RESOURCE, id.to_string()));
        }

        info!(connection_id = %id, owner_id = %owner_id, "Deleted connection");
        Ok(())
    }
}

fn map_write_error(error: RepositoryError) -> AppError {
    match error {
        RepositoryError::ConstraintViolation { .. } => {
            AppError::conflict("Public credentials are already in use by another connection")
        }
        other => AppError::Repository(other),
    }
}

fn validate_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_public_credentials(credentials: &PublicCredentials) -> AppResult<()> {
    if credentials.username.is_empty() || credentials.password.is_empty() {
        return Err(AppError::validation(
            "publicCredentials.username and publicCredentials.password are required",
        ));
    }
    Ok(())
}

fn validate_upstream_target(target: UpstreamTarget) -> AppResult<UpstreamTarget> {
    if target.username.is_empty() || target.password.is_empty() {
        return Err(AppError::validation(
            "upstreamTarget.username and upstreamTarget.password are required",
        ));
    }

    let base_url = UrlUtils::normalize_base_url(&target.base_url)
        .map_err(|e| AppError::validation(format!("upstreamTarget.baseUrl: {e}")))?;

    Ok(UpstreamTarget { base_url, ..target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database::Database;
    use crate::repositories::ConnectionRepository;

    async fn create_test_service() -> ConnectionService {
        let database = Database::new(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: Some(1),
        })
        .await
        .unwrap();
        database.migrate().await.unwrap();
        ConnectionService::new(Arc::new(ConnectionRepository::new(database.pool())))
    }

    fn request(username: &str, base_url: &str) -> ConnectionCreateRequest {
        ConnectionCreateRequest {
            name: "  Living room ".to_string(),
            public_credentials: PublicCredentials {
                username: username.to_string(),
                password: "p1".to_string(),
            },
            upstream_target: UpstreamTarget {
                base_url: base_url.to_string(),
                username: "ou1".to_string(),
                password: "op1".to_string(),
            },
            expire_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_input() {
        let service = create_test_service().await;
        let owner = Uuid::new_v4();

        let connection = service
            .create(owner, request("u1", "origin.example:8080/"))
            .await
            .unwrap();

        assert_eq!(connection.name, "Living room");
        assert_eq!(connection.upstream_target.base_url, "http://origin.example:8080");
        assert_eq!(service.get(owner, connection.id).await.unwrap().id, connection.id);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let service = create_test_service().await;
        let owner = Uuid::new_v4();

        let err = service.create(owner, request("", "origin.example")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = service
            .create(owner, request("u1", "ftp://origin.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let mut blank_name = request("u1", "origin.example");
        blank_name.name = "   ".to_string();
        let err = service.create(owner, blank_name).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_credentials_conflict() {
        let service = create_test_service().await;
        service
            .create(Uuid::new_v4(), request("u1", "origin.example"))
            .await
            .unwrap();

        let err = service
            .create(Uuid::new_v4(), request("u1", "other.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete_are_owner_scoped() {
        let service = create_test_service().await;
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let connection = service
            .create(owner, request("u1", "origin.example"))
            .await
            .unwrap();

        let rename = ConnectionUpdateRequest {
            name: Some("Bedroom".to_string()),
            ..Default::default()
        };
        let err = service
            .update(stranger, connection.id, rename.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        let updated = service.update(owner, connection.id, rename).await.unwrap();
        assert_eq!(updated.name, "Bedroom");
        assert_eq!(updated.public_credentials, connection.public_credentials);

        let err = service.delete(stranger, connection.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        service.delete(owner, connection.id).await.unwrap();
        assert!(service.list(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let service = create_test_service().await;
        let err = service
            .update(Uuid::new_v4(), Uuid::new_v4(), ConnectionUpdateRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
