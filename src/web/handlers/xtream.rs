//! Xtream endpoint handlers
//!
//! `player_api.php` answers login probes locally and proxies everything else
//! as JSON. `xmltv.php` always streams from upstream.

use axum::{
    extract::{RawQuery, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use crate::errors::ProxyError;
use crate::models::Connection;
use crate::proxy::{relay, XtreamEndpoint, XtreamQuery};
use crate::services::ServerAddress;
use crate::web::{
    responses::{
        player_api_unauthorized, player_api_upstream_failure, xmltv_unauthorized,
        xmltv_upstream_failure,
    },
    AppState,
};

/// Outcome of credential resolution that the handler must answer itself
enum ResolveFailure {
    Missing,
    Invalid,
    Store,
}

async fn resolve(
    state: &AppState,
    endpoint: XtreamEndpoint,
    query: &XtreamQuery,
) -> Result<Connection, ResolveFailure> {
    let (username, password) = query.credentials().ok_or(ResolveFailure::Missing)?;

    state
        .resolver
        .resolve(username, password)
        .await
        .map_err(|e| match e {
            ProxyError::InvalidCredentials => {
                debug!(endpoint = endpoint.path(), "Rejected unknown credentials");
                ResolveFailure::Invalid
            }
            other => {
                error!(
                    endpoint = endpoint.path(),
                    "Credential lookup failed: {}", other
                );
                ResolveFailure::Store
            }
        })
}

/// `GET /player_api.php`
pub async fn player_api(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let endpoint = XtreamEndpoint::PlayerApi;
    let query = XtreamQuery::parse(raw_query.as_deref());

    let connection = match resolve(&state, endpoint, &query).await {
        Ok(connection) => connection,
        Err(ResolveFailure::Missing) => return player_api_unauthorized("Missing credentials"),
        Err(ResolveFailure::Invalid) => return player_api_unauthorized("Invalid credentials"),
        Err(ResolveFailure::Store) => return player_api_upstream_failure(),
    };

    if query.is_probe() {
        debug!(connection_id = %connection.id, "Answering login probe locally");
        let address = ServerAddress::from_headers(&headers);
        return Json(state.session_info.respond(&connection, &address)).into_response();
    }

    let request = match state
        .translator
        .translate(endpoint, &connection, &query, &headers)
    {
        Ok(request) => request,
        Err(e) => {
            error!(connection_id = %connection.id, "Failed to build upstream request: {}", e);
            return player_api_upstream_failure();
        }
    };

    match state.upstream_client.fetch_json(&request).await {
        Ok(payload) => relay::json_response(payload),
        Err(e) => {
            debug!(connection_id = %connection.id, "Player API relay failed: {}", e);
            player_api_upstream_failure()
        }
    }
}

/// `GET /xmltv.php`
pub async fn xmltv(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let endpoint = XtreamEndpoint::Xmltv;
    let query = XtreamQuery::parse(raw_query.as_deref());

    let connection = match resolve(&state, endpoint, &query).await {
        Ok(connection) => connection,
        Err(ResolveFailure::Missing | ResolveFailure::Invalid) => return xmltv_unauthorized(),
        Err(ResolveFailure::Store) => return xmltv_upstream_failure(),
    };

    let request = match state
        .translator
        .translate(endpoint, &connection, &query, &headers)
    {
        Ok(request) => request,
        Err(e) => {
            error!(connection_id = %connection.id, "Failed to build upstream request: {}", e);
            return xmltv_upstream_failure();
        }
    };

    match state.upstream_client.open_stream(&request).await {
        Ok(upstream) => relay::xml_stream_response(upstream),
        Err(e) => {
            debug!(connection_id = %connection.id, "XMLTV relay failed: {}", e);
            xmltv_upstream_failure()
        }
    }
}
