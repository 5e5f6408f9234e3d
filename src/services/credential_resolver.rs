//! Credential resolution
//!
//! Fails closed: anything other than an exact match on both public
//! credentials is `InvalidCredentials`.

use std::sync::Arc;
use tracing::debug;

use crate::errors::{ProxyError, ProxyResult};
use crate::models::Connection;
use crate::repositories::ConnectionStore;

#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn ConnectionStore>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn ConnectionStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, username: &str, password: &str) -> ProxyResult<Connection> {
        if username.is_empty() || password.is_empty() {
            return Err(ProxyError::InvalidCredentials);
        }

        match self.store.find_by_public_credentials(username, password).await? {
            Some(connection) => {
                debug!(connection_id = %connection.id, "Resolved public credentials");
                Ok(connection)
            }
            None => Err(ProxyError::InvalidCredentials),
        }
    }
}
