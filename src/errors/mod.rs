//! Centralized error handling for the IPTV relay
//!
//! # Error Categories
//!
//! - **Repository Errors**: SQLite operations and constraint violations
//! - **Proxy Errors**: credential resolution and upstream relay failures
//! - **Application Errors**: validation, authentication and lookups in the
//!   management API
//!
//! # Usage
//!
//! ```rust
//! use iptv_relay::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::validation("name must not be empty"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Repository Results
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Convenience type alias for Proxy Results
pub type ProxyResult<T> = Result<T, ProxyError>;
