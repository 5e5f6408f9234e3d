//! Connection management handlers
//!
//! Every route requires a session and only ever sees the caller's own
//! connections.

use axum::{
    extract::State,
    Json,
};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{Connection, ConnectionCreateRequest, ConnectionUpdateRequest};
use crate::web::{
    extractors::{AuthenticatedUser, ValidatedJson, ValidatedPath},
    responses::SuccessResponse,
    AppState,
};

/// `GET /api/connections`
pub async fn list_connections(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Vec<Connection>>> {
    Ok(Json(state.connection_service.list(user.id).await?))
}

/// `GET /api/connections/:id`
pub async fn get_connection(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> AppResult<Json<Connection>> {
    Ok(Json(state.connection_service.get(user.id, id).await?))
}

/// `POST /api/connections`
pub async fn create_connection(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<ConnectionCreateRequest>,
) -> AppResult<Json<Connection>> {
    Ok(Json(
        state.connection_service.create(user.id, request).await?,
    ))
}

/// `PUT /api/connections/:id`
pub async fn update_connection(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(request): ValidatedJson<ConnectionUpdateRequest>,
) -> AppResult<Json<Connection>> {
    Ok(Json(
        state.connection_service.update(user.id, id, request).await?,
    ))
}

/// `DELETE /api/connections/:id`
pub async fn delete_connection(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.connection_service.delete(user.id, id).await?;
    Ok(SuccessResponse::ok())
}
