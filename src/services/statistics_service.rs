//! Statistics maintenance for task attempt events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, instrument};

use super::user_directory::UserDirectory;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    GlobalAverages, PublisherSummary, ReportPeriod, TaskEvent, UserStatistics,
};
use crate::domain::ports::{PublisherStatisticsRepository, StatisticsRepository};

/// Hands out one async lock per user so writers for the same user queue up.
#[derive(Default)]
struct UserLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl UserLocks {
    fn lock_for(&self, user_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Drop entries nobody else holds so the map does not grow unbounded.
        locks.retain(|id, lock| id == user_id || Arc::strong_count(lock) > 1);
        locks.entry(user_id.to_string()).or_default().clone()
    }
}

pub struct StatisticsService {
    directory: UserDirectory,
    statistics: Arc<dyn StatisticsRepository>,
    publishers: Arc<dyn PublisherStatisticsRepository>,
    locks: UserLocks,
}

impl StatisticsService {
    pub fn new(
        directory: UserDirectory,
        statistics: Arc<dyn StatisticsRepository>,
        publishers: Arc<dyn PublisherStatisticsRepository>,
    ) -> Self {
        Self {
            directory,
            statistics,
            publishers,
            locks: UserLocks::default(),
        }
    }

    /// Statistics for a user, `None` until their first task event.
    pub async fn get_statistics(&self, user_id: &str) -> DomainResult<Option<UserStatistics>> {
        let resolved = self.directory.resolve(user_id).await?;
        self.statistics.get(&resolved.statistics_owner()).await
    }

    /// Record a task attempt for a session or profile.
    ///
    /// The statistics row, the owner's task counters and the stored
    /// expertise level change together in one transaction. Events for the
    /// same user are applied one at a time.
    #[instrument(skip(self, event), fields(completed = event.completed))]
    pub async fn record_task(&self, user_id: &str, event: &TaskEvent) -> DomainResult<UserStatistics> {
        event.validate()?;

        let lock = self.locks.lock_for(user_id);
        let _guard = lock.lock().await;

        let resolved = self.directory.resolve(user_id).await?;
        let levels = self.directory.levels();
        let previous_level = levels.level(resolved.tasks_completed())?;

        let stats = self
            .statistics
            .record_task_event(
                &resolved.statistics_owner(),
                event,
                levels.thresholds(),
                Utc::now(),
            )
            .await?;

        if stats.expertise_level != previous_level {
            info!(
                user_id,
                from = previous_level,
                to = stats.expertise_level,
                "expertise level changed"
            );
        }
        Ok(stats)
    }

    /// Overwrite the stored level, e.g. after an administrator review.
    pub async fn set_expertise_level(&self, user_id: &str, level: u32) -> DomainResult<UserStatistics> {
        let max_level = self.directory.levels().max_level();
        if level > max_level {
            return Err(DomainError::InvalidArgument(format!(
                "expertise level {level} exceeds the top tier {max_level}"
            )));
        }
        let lock = self.locks.lock_for(user_id);
        let _guard = lock.lock().await;

        let resolved = self.directory.resolve(user_id).await?;
        let owner = resolved.statistics_owner();
        let mut stats = match self.statistics.get(&owner).await? {
            Some(stats) => stats,
            None => {
                let stats = UserStatistics::new(owner);
                self.statistics.create(&stats).await?;
                stats
            }
        };
        stats.expertise_level = level;
        stats.updated_at = Utc::now();
        self.statistics.save(&stats).await?;
        Ok(stats)
    }

    /// Session and task metrics for a publisher over the last `days` days.
    pub async fn publisher_summary(&self, publisher_id: &str, days: i64) -> DomainResult<PublisherSummary> {
        let period = ReportPeriod::ending_at(Utc::now(), days)?;
        let activity = self.publishers.activity(publisher_id, period.start).await?;
        Ok(PublisherSummary::new(publisher_id, period, activity))
    }

    pub async fn global_averages(&self) -> DomainResult<GlobalAverages> {
        self.statistics.global_averages().await
    }
}
