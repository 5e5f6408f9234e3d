//! Management authentication
//!
//! Accounts are stored with Argon2id password hashes in PHC string format.
//! Logged-in sessions live in memory only and are identified by an opaque
//! random token carried in a cookie; a restart logs everybody out.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::repositories::{UserCreateRequest, UserStore};

const TOKEN_LEN: usize = 32;

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill(bytes.as_mut_slice());
    hex::encode(bytes)
}

/// Hash a password into an Argon2id PHC string
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored PHC string
///
/// Unparseable hashes never verify, and neither do hashes whose cost
/// parameters exceed the ones [`hash_password`] uses.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parsed = match PasswordHash::new(stored) {
        Ok(parsed) => parsed,
        Err(_) => {
            error!("Stored password hash is not a valid PHC string");
            return false;
        }
    };

    match Params::try_from(&parsed) {
        Ok(params)
            if params.m_cost() <= Params::DEFAULT_M_COST
                && params.t_cost() <= Params::DEFAULT_T_COST
                && params.p_cost() <= Params::DEFAULT_P_COST => {}
        _ => {
            error!("Stored password hash has unsupported cost parameters");
            return false;
        }
    }

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Debug, Clone)]
struct Session {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// In-memory session table keyed by token
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(1)),
        }
    }

    /// Open a session and return its token
    pub async fn create(&self, user_id: Uuid) -> String {
        let token = random_hex(TOKEN_LEN);
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| session.expires_at > now);
        sessions.insert(
            token.clone(),
            Session {
                user_id,
                expires_at: now + self.ttl,
            },
        );

        token
    }

    /// User id behind a live session; expired sessions are dropped
    pub async fn get(&self, token: &str) -> Option<Uuid> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                Some(session) if session.expires_at > now => return Some(session.user_id),
                None => return None,
                Some(_) => {}
            }
        }

        self.sessions.write().await.remove(token);
        None
    }

    pub async fn destroy(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}

/// Login, logout and session checks for the management API
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: SessionStore,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, sessions: SessionStore) -> Self {
        Self { users, sessions }
    }

    /// Verify credentials and open a session
    ///
    /// Unknown users and wrong passwords produce the same error.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(User, String)> {
        let user = self.users.find_by_username(username).await?;

        let user = match user {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => {
                warn!("Failed management login attempt");
                return Err(AppError::unauthorized("Invalid credentials"));
            }
        };

        let token = self.sessions.create(user.id).await;
        info!(user_id = %user.id, "Management login");
        Ok((user, token))
    }

    pub async fn logout(&self, token: &str) {
        if self.sessions.destroy(token).await {
            debug!("Session destroyed");
        }
    }

    /// Resolve a session token to its user
    pub async fn authenticate(&self, token: &str) -> AppResult<User> {
        let user_id = self
            .sessions
            .get(token)
            .await
            .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }

    /// Make sure the configured admin account exists
    ///
    /// Without a configured password a random one is generated and logged
    /// once, since there is no other way to learn it.
    pub async fn bootstrap_admin(&self, config: &AuthConfig) -> AppResult<User> {
        if let Some(existing) = self.users.find_by_username(&config.admin_username).await? {
            debug!(username = %existing.username, "Admin account present");
            return Ok(existing);
        }

        let password = match config.admin_password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => password.to_string(),
            None => {
                let generated = random_hex(12);
                warn!(
                    username = %config.admin_username,
                    password = %generated,
                    "Generated initial admin password; set auth.admin_password to choose one"
                );
                generated
            }
        };

        let user = self
            .users
            .create(UserCreateRequest {
                username: config.admin_username.clone(),
                password_hash: hash_password(&password)?,
                is_admin: true,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "Created admin account");
        Ok(user)
    }
}
