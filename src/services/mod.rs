//! Service layer
//!
//! Business logic sits here, between the thin web handlers and the
//! repositories. Services receive their stores at construction time.

pub mod auth;
pub mod connection;
pub mod credential_resolver;
pub mod session_info;

pub use auth::{AuthService, SessionStore};
pub use connection::ConnectionService;
pub use credential_resolver::CredentialResolver;
pub use session_info::{SessionInfoResponder, ServerAddress};
