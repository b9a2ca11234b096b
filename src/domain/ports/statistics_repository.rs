//! Statistics repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::{GlobalAverages, StatisticsOwner, TaskEvent, UserStatistics};

/// Repository interface for per-user statistics.
#[async_trait]
pub trait StatisticsRepository: Send + Sync {
    /// Statistics for an owner, `None` when no row exists yet.
    async fn get(&self, owner: &StatisticsOwner) -> DomainResult<Option<UserStatistics>>;

    /// Persist a new statistics row.
    async fn create(&self, stats: &UserStatistics) -> DomainResult<()>;

    /// Overwrite an existing row.
    async fn save(&self, stats: &UserStatistics) -> DomainResult<()>;

    /// Apply a task event, creating the statistics row on first use.
    ///
    /// The owner's task counters, its derived expertise level (under
    /// `level_thresholds`) and the statistics row are written in a single
    /// transaction: either all of them change or none do.
    async fn record_task_event(
        &self,
        owner: &StatisticsOwner,
        event: &TaskEvent,
        level_thresholds: &[i64],
        now: DateTime<Utc>,
    ) -> DomainResult<UserStatistics>;

    /// Platform-wide averages over every statistics row.
    async fn global_averages(&self) -> DomainResult<GlobalAverages>;
}
