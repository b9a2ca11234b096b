//! Session repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::UserSession;

/// Repository interface for anonymous session persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session.
    async fn create(&self, session: &UserSession) -> DomainResult<()>;

    /// Get a session by ID.
    async fn get(&self, id: &str) -> DomainResult<Option<UserSession>>;

    /// Update an existing session.
    ///
    /// Fails with `SessionNotFound` when no row matches.
    async fn update(&self, session: &UserSession) -> DomainResult<()>;

    /// Delete a session by ID.
    async fn delete(&self, id: &str) -> DomainResult<()>;

    /// Sessions linked to a profile, most recently active first.
    async fn list_by_profile(&self, profile_id: &str) -> DomainResult<Vec<UserSession>>;
}
