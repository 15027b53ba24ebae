use botfleet_db::secure::ScopeError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    /// The resource does not exist or belongs to someone else. The two cases
    /// are deliberately the same error.
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    #[must_use]
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Map a guard error for `resource`.
    #[must_use]
    pub fn from_scope(resource: &'static str, err: ScopeError) -> Self {
        match err {
            ScopeError::NotFound => Self::not_found(resource),
            ScopeError::Denied(message) => Self::Forbidden {
                message: message.to_owned(),
            },
            ScopeError::Invalid(message) => Self::database(message),
            ScopeError::Db(e) => Self::from(e),
        }
    }
}

impl From<DbErr> for DomainError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!(%detail, "unique constraint violated");
                Self::Conflict {
                    message: "a resource with the same unique value already exists".to_owned(),
                }
            }
            _ => Self::database(e.to_string()),
        }
    }
}
