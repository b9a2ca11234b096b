//! Expertise area repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::ExpertiseArea;

/// Repository interface for the expertise-area taxonomy.
#[async_trait]
pub trait ExpertiseAreaRepository: Send + Sync {
    async fn create(&self, area: &ExpertiseArea) -> DomainResult<()>;

    async fn get(&self, id: &str) -> DomainResult<Option<ExpertiseArea>>;

    async fn get_by_slug(&self, slug: &str) -> DomainResult<Option<ExpertiseArea>>;

    /// Lookup by name, ignoring case.
    async fn get_by_name(&self, name: &str) -> DomainResult<Option<ExpertiseArea>>;

    async fn update(&self, area: &ExpertiseArea) -> DomainResult<()>;

    async fn delete(&self, id: &str) -> DomainResult<()>;

    /// Direct children of an area, ordered by name.
    async fn children(&self, parent_id: &str) -> DomainResult<Vec<ExpertiseArea>>;

    /// All areas ordered by name, optionally only active ones.
    async fn list(&self, active_only: bool) -> DomainResult<Vec<ExpertiseArea>>;

    /// Number of profiles linked to an area.
    async fn count_profiles(&self, area_id: &str) -> DomainResult<u64>;
}
