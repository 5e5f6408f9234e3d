//! Shared harness for the router-level tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use iptv_relay::{
    config::Config,
    database::Database,
    models::{Connection, ConnectionCreateRequest, PublicCredentials, UpstreamTarget, User},
    repositories::{UserCreateRequest, UserRepository, UserStore},
    services::auth::hash_password,
    web::{create_router, AppState},
};

pub const ADMIN_PASSWORD: &str = "admin-secret";
pub const OTHER_USER: &str = "other";
pub const OTHER_PASSWORD: &str = "other-secret";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub admin: User,
    pub other: User,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.auth.admin_password = Some(ADMIN_PASSWORD.to_string());
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: Config) -> TestApp {
    let database = Database::new(&config.database).await.unwrap();
    database.migrate().await.unwrap();

    let state = AppState::new(config.clone(), database.clone()).unwrap();
    let admin = state.auth_service.bootstrap_admin(&config.auth).await.unwrap();
    let other = UserRepository::new(database.pool())
        .create(UserCreateRequest {
            username: OTHER_USER.to_string(),
            password_hash: hash_password(OTHER_PASSWORD).unwrap(),
            is_admin: false,
        })
        .await
        .unwrap();

    TestApp {
        router: create_router(state.clone()),
        state,
        admin,
        other,
    }
}

impl TestApp {
    /// Store a connection for `owner` directly through the service layer
    pub async fn seed_connection(
        &self,
        owner: &User,
        public: (&str, &str),
        base_url: &str,
    ) -> Connection {
        self.state
            .connection_service
            .create(
                owner.id,
                ConnectionCreateRequest {
                    name: "Seeded".to_string(),
                    public_credentials: PublicCredentials {
                        username: public.0.to_string(),
                        password: public.1.to_string(),
                    },
                    upstream_target: UpstreamTarget {
                        base_url: base_url.to_string(),
                        username: "ou1".to_string(),
                        password: "op1".to_string(),
                    },
                    expire_date: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> Response {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// JSON request with an optional session cookie
    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        session: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = session {
            builder = builder.header(header::COOKIE, format!("iptv_relay_session={token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Log in and return the session token from `Set-Cookie`
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .send_json(
                Method::POST,
                "/api/login",
                Some(json!({"username": username, "password": password})),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        cookie
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix("iptv_relay_session="))
            .unwrap()
            .to_string()
    }
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
