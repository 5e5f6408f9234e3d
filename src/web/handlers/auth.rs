//! Management login and logout

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppResult;
use crate::models::{Connection, LoginRequest};
use crate::web::{
    extractors::{clear_session_cookie, session_cookie, session_token, ValidatedJson},
    responses::SuccessResponse,
    AppState,
};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub connections: Vec<Connection>,
}

/// `POST /api/login`
///
/// Opens a session and returns the caller's connections so the UI can render
/// without a second round trip.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> AppResult<Response> {
    let (user, token) = state
        .auth_service
        .login(&request.username, &request.password)
        .await?;
    let connections = state.connection_service.list(user.id).await?;

    let cookie = session_cookie(
        &token,
        state.config.auth.session_ttl_secs,
        state.config.auth.cookie_secure,
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            connections,
        }),
    )
        .into_response())
}

/// `POST /api/logout`
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.auth_service.logout(&token).await;
    }

    (
        [(
            header::SET_COOKIE,
            clear_session_cookie(state.config.auth.cookie_secure),
        )],
        SuccessResponse::ok(),
    )
        .into_response()
}
