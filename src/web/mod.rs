//! Web layer module
//!
//! HTTP interface of the relay. Handlers stay thin and delegate to the proxy
//! and service layers.
//!
//! - **Xtream endpoints**: `/player_api.php` and `/xmltv.php`, public, keyed
//!   by the credentials in the query string
//! - **Management API**: `/api/*`, cookie-session protected connection CRUD
//! - **Health**: `/health`

use anyhow::Result;
use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, Span};

use crate::{
    config::Config,
    database::Database,
    proxy::{RequestTranslator, UpstreamClient},
    repositories::{ConnectionRepository, UserRepository},
    services::{
        AuthService, ConnectionService, CredentialResolver, SessionInfoResponder, SessionStore,
    },
};

pub mod extractors;
pub mod handlers;
pub mod responses;

pub use responses::handle_error;

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(state: AppState) -> Result<Self> {
        let addr: SocketAddr =
            format!("{}:{}", state.config.web.host, state.config.web.port).parse()?;
        let app = create_router(state);

        Ok(Self { app, addr })
    }

    /// Serve until SIGINT/SIGTERM, then drain in-flight requests
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    tracing::error!("Failed to install signal handlers; graceful shutdown disabled");
                    return std::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
            _ = sigint.recv() => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully");
        }
    }
}

/// Create the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no auth required)
        .route("/health", get(handlers::health::health_check))
        // Xtream endpoints (authenticated by query credentials)
        .route("/player_api.php", get(handlers::xtream::player_api))
        .route("/xmltv.php", get(handlers::xtream::xmltv))
        // Management API
        .nest("/api", api_routes())
        // Middleware (applied in reverse order)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Request span carrying the method and path only
///
/// Xtream clients put their password in the query string, so the query never
/// reaches the logs.
fn request_span(request: &Request<Body>) -> Span {
    info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route(
            "/connections",
            get(handlers::connections::list_connections)
                .post(handlers::connections::create_connection),
        )
        .route(
            "/connections/:id",
            get(handlers::connections::get_connection)
                .put(handlers::connections::update_connection)
                .delete(handlers::connections::delete_connection),
        )
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub config: Config,
    pub resolver: CredentialResolver,
    pub translator: RequestTranslator,
    pub upstream_client: UpstreamClient,
    pub session_info: SessionInfoResponder,
    pub connection_service: ConnectionService,
    pub auth_service: AuthService,
}

impl AppState {
    /// Wire repositories and services over an open database
    pub fn new(config: Config, database: Database) -> Result<Self> {
        let connections = Arc::new(ConnectionRepository::new(database.pool()));
        let users = Arc::new(UserRepository::new(database.pool()));
        let sessions = SessionStore::new(std::time::Duration::from_secs(
            config.auth.session_ttl_secs,
        ));

        Ok(Self {
            resolver: CredentialResolver::new(connections.clone()),
            translator: RequestTranslator::new(&config.upstream),
            upstream_client: UpstreamClient::new()?,
            session_info: SessionInfoResponder::new(config.session_info.clone()),
            connection_service: ConnectionService::new(connections),
            auth_service: AuthService::new(users, sessions),
            database,
            config,
        })
    }
}
