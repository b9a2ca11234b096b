//! Expert profile repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::UserProfile;

/// Repository interface for opt-in profile persistence.
///
/// Expertise-area links are stored alongside the profile and are returned in
/// `UserProfile::expertise_area_ids`.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn create(&self, profile: &UserProfile) -> DomainResult<()>;

    async fn get(&self, id: &str) -> DomainResult<Option<UserProfile>>;

    /// Update profile fields and replace its expertise-area links.
    async fn update(&self, profile: &UserProfile) -> DomainResult<()>;

    async fn delete(&self, id: &str) -> DomainResult<()>;

    /// Profiles with the most completed tasks, highest first. Ties go to the
    /// older profile.
    async fn top_contributors(&self, limit: u32) -> DomainResult<Vec<UserProfile>>;
}
