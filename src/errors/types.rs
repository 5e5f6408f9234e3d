//! Error type definitions for the IPTV relay
//!
//! This module defines all error types used throughout the application,
//! providing a hierarchical error system that keeps internal detail out of
//! HTTP responses while preserving it for logs.

use thiserror::Error;

/// Top-level application error type used by the management API
#[derive(Error, Debug)]
pub enum AppError {
    /// Repository layer errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Missing or invalid session, or bad login
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Write rejected because it collides with an existing record
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// SQL query execution failures
    #[error("Query failed: {query} - {message}")]
    QueryFailed { query: String, message: String },

    /// Constraint violations (unique, foreign key, etc.)
    #[error("Constraint violation: {constraint} - {message}")]
    ConstraintViolation { constraint: String, message: String },

    /// Stored value could not be decoded into the domain model
    #[error("Invalid stored data: {field} - {message}")]
    InvalidData { field: String, message: String },
}

/// Failures on the public IPTV endpoints
///
/// Handlers convert every variant into the endpoint-specific payload; none of
/// the carried detail reaches the client.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// No connection matches the presented public credentials
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Timeout, refused connection or non-success status from upstream
    #[error("Upstream unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    /// Upstream answered successfully but the body could not be parsed
    #[error("Malformed upstream response: {reason}")]
    MalformedUpstreamResponse { reason: String },

    /// The connection store failed while resolving credentials
    #[error("Connection store error: {0}")]
    Store(#[from] RepositoryError),
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a not found error for a specific resource
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl RepositoryError {
    /// Create a query failed error
    pub fn query_failed<Q: Into<String>, M: Into<String>>(query: Q, message: M) -> Self {
        Self::QueryFailed {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Create a constraint violation error
    pub fn constraint_violation<C: Into<String>, M: Into<String>>(
        constraint: C,
        message: M,
    ) -> Self {
        Self::ConstraintViolation {
            constraint: constraint.into(),
            message: message.into(),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidData {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Classify an sqlx error raised by the named query
    pub fn from_sqlx<Q: Into<String>>(query: Q, error: sqlx::Error) -> Self {
        let query = query.into();
        match error.as_database_error() {
            Some(db_error) if db_error.is_unique_violation() => {
                Self::constraint_violation(query, db_error.message().to_string())
            }
            _ => Self::query_failed(query, error.to_string()),
        }
    }
}

impl ProxyError {
    /// Create an upstream unavailable error
    pub fn upstream_unavailable<S: Into<String>>(reason: S) -> Self {
        Self::UpstreamUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a malformed upstream response error
    pub fn malformed<S: Into<String>>(reason: S) -> Self {
        Self::MalformedUpstreamResponse {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_messages() {
        let err = AppError::not_found("connection", "abc");
        assert_eq!(err.to_string(), "Not found: connection with id abc");

        let err = AppError::validation("name must not be empty");
        assert_eq!(err.to_string(), "Validation error: name must not be empty");
    }

    #[test]
    fn test_repository_error_converts_into_app_error() {
        let repo_err = RepositoryError::query_failed("select_connection", "disk I/O error");
        let app_err: AppError = repo_err.into();
        assert!(matches!(app_err, AppError::Repository(_)));
    }

    #[test]
    fn test_non_database_sqlx_error_is_query_failure() {
        let err = RepositoryError::from_sqlx("find_user", sqlx::Error::RowNotFound);
        assert!(matches!(err, RepositoryError::QueryFailed { .. }));
    }
}
