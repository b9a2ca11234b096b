//! Domain errors for the user profiling service.

use thiserror::Error;

/// Format a hierarchy cycle as a human-readable string: `A -> B -> C -> A`.
fn format_cycle_path(path: &[String]) -> String {
    path.join(" -> ")
}

/// Domain-level errors that can occur in the profiling service.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Expertise area not found: {0}")]
    AreaNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Expertise hierarchy cycle detected: {}", format_cycle_path(.0))]
    HierarchyCycle(Vec<String>),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
