//! Wiring from configuration to repositories and services.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::adapters::sqlite::{
    initialize_database, SqliteExpertiseAreaRepository, SqliteProfileRepository,
    SqlitePublisherStatisticsRepository, SqliteSessionRepository, SqliteStatisticsRepository,
};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{
    CompatibilityScorer, ExpertiseAreaService, ExpertiseLevelCalculator, ProfileService,
    ProfilerService, StatisticsService, TaskCompatibilityService, UserDirectory,
};

/// Load configuration from an explicit file, or the default hierarchy.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Open database plus the repositories every command builds its services from.
pub struct AppContext {
    pub config: Config,
    pub pool: SqlitePool,
    pub sessions: Arc<SqliteSessionRepository>,
    pub profiles: Arc<SqliteProfileRepository>,
    pub statistics: Arc<SqliteStatisticsRepository>,
    pub publishers: Arc<SqlitePublisherStatisticsRepository>,
    pub areas: Arc<SqliteExpertiseAreaRepository>,
}

impl AppContext {
    /// Open (and migrate) the configured database.
    pub async fn open(config: Config) -> Result<Self> {
        let pool = initialize_database(&config.database)
            .await
            .with_context(|| {
                format!(
                    "Failed to open database at {}. Run 'hotlabel-users init' first.",
                    config.database.path
                )
            })?;
        Ok(Self::with_pool(config, pool))
    }

    pub fn with_pool(config: Config, pool: SqlitePool) -> Self {
        Self {
            sessions: Arc::new(SqliteSessionRepository::new(pool.clone())),
            profiles: Arc::new(SqliteProfileRepository::new(pool.clone())),
            statistics: Arc::new(SqliteStatisticsRepository::new(pool.clone())),
            publishers: Arc::new(SqlitePublisherStatisticsRepository::new(pool.clone())),
            areas: Arc::new(SqliteExpertiseAreaRepository::new(pool.clone())),
            config,
            pool,
        }
    }

    pub fn levels(&self) -> Result<ExpertiseLevelCalculator> {
        ExpertiseLevelCalculator::new(self.config.expertise.level_thresholds.clone())
            .context("Invalid expertise level thresholds")
    }

    pub fn directory(&self) -> Result<UserDirectory> {
        Ok(UserDirectory::new(
            self.sessions.clone(),
            self.profiles.clone(),
            self.statistics.clone(),
            self.areas.clone(),
            self.levels()?,
        ))
    }

    pub fn compatibility_service(&self) -> Result<TaskCompatibilityService> {
        let scorer = CompatibilityScorer::from_config(&self.config.compatibility)
            .context("Invalid compatibility configuration")?;
        Ok(TaskCompatibilityService::new(self.directory()?, scorer))
    }

    pub fn statistics_service(&self) -> Result<StatisticsService> {
        Ok(StatisticsService::new(
            self.directory()?,
            self.statistics.clone(),
            self.publishers.clone(),
        ))
    }

    pub fn profile_service(&self) -> ProfileService {
        ProfileService::new(self.profiles.clone())
    }

    pub fn profiler_service(&self) -> ProfilerService {
        ProfilerService::new(self.sessions.clone(), self.profiles.clone(), self.areas.clone())
    }

    pub fn area_service(&self) -> ExpertiseAreaService<SqliteExpertiseAreaRepository> {
        ExpertiseAreaService::new(self.areas.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    #[tokio::test]
    async fn test_services_build_from_default_config() {
        let pool = create_migrated_test_pool().await.unwrap();
        let ctx = AppContext::with_pool(Config::default(), pool);

        assert_eq!(ctx.levels().unwrap().max_level(), 4);
        assert!(ctx.compatibility_service().is_ok());
        assert!(ctx.statistics_service().is_ok());
    }

    #[tokio::test]
    async fn test_bad_thresholds_surface_as_error() {
        let pool = create_migrated_test_pool().await.unwrap();
        let mut config = Config::default();
        config.expertise.level_thresholds = vec![50, 10];
        let ctx = AppContext::with_pool(config, pool);

        assert!(ctx.directory().is_err());
    }
}
