//! Common test utilities for integration tests
//!
//! Builds an in-memory migrated database with the SQLite repositories and the
//! services wired over them.

#![allow(dead_code)]

use std::sync::Arc;

use hotlabel_users::adapters::sqlite::{
    create_migrated_test_pool, SqliteExpertiseAreaRepository, SqliteProfileRepository,
    SqlitePublisherStatisticsRepository, SqliteSessionRepository, SqliteStatisticsRepository,
};
use hotlabel_users::domain::models::{ExpertiseArea, UserProfile, UserSession};
use hotlabel_users::domain::ports::{
    ExpertiseAreaRepository, ProfileRepository, SessionRepository,
};
use hotlabel_users::services::{
    CompatibilityScorer, ExpertiseAreaService, ExpertiseLevelCalculator, ProfileService,
    ProfilerService, StatisticsService, TaskCompatibilityService, UserDirectory,
};
use sqlx::SqlitePool;

pub struct TestContext {
    pub pool: SqlitePool,
    pub sessions: Arc<SqliteSessionRepository>,
    pub profiles: Arc<SqliteProfileRepository>,
    pub statistics: Arc<SqliteStatisticsRepository>,
    pub publishers: Arc<SqlitePublisherStatisticsRepository>,
    pub areas: Arc<SqliteExpertiseAreaRepository>,
}

impl TestContext {
    pub async fn new() -> Self {
        let pool = create_migrated_test_pool()
            .await
            .expect("Failed to create test database");
        Self {
            sessions: Arc::new(SqliteSessionRepository::new(pool.clone())),
            profiles: Arc::new(SqliteProfileRepository::new(pool.clone())),
            statistics: Arc::new(SqliteStatisticsRepository::new(pool.clone())),
            publishers: Arc::new(SqlitePublisherStatisticsRepository::new(pool.clone())),
            areas: Arc::new(SqliteExpertiseAreaRepository::new(pool.clone())),
            pool,
        }
    }

    pub fn directory(&self) -> UserDirectory {
        UserDirectory::new(
            self.sessions.clone(),
            self.profiles.clone(),
            self.statistics.clone(),
            self.areas.clone(),
            ExpertiseLevelCalculator::default(),
        )
    }

    pub fn compatibility(&self) -> TaskCompatibilityService {
        TaskCompatibilityService::new(self.directory(), CompatibilityScorer::default())
    }

    pub fn statistics_service(&self) -> StatisticsService {
        StatisticsService::new(
            self.directory(),
            self.statistics.clone(),
            self.publishers.clone(),
        )
    }

    pub fn profile_service(&self) -> ProfileService {
        ProfileService::new(self.profiles.clone())
    }

    pub fn profiler(&self) -> ProfilerService {
        ProfilerService::new(self.sessions.clone(), self.profiles.clone(), self.areas.clone())
    }

    pub fn area_service(&self) -> ExpertiseAreaService<SqliteExpertiseAreaRepository> {
        ExpertiseAreaService::new(self.areas.clone())
    }

    pub async fn add_area(&self, name: &str) -> ExpertiseArea {
        let area = ExpertiseArea::new(name);
        self.areas.create(&area).await.expect("Failed to create area");
        area
    }

    pub async fn add_session(&self, session: UserSession) -> UserSession {
        self.sessions
            .create(&session)
            .await
            .expect("Failed to create session");
        session
    }

    pub async fn add_profile(&self, profile: UserProfile) -> UserProfile {
        self.profiles
            .create(&profile)
            .await
            .expect("Failed to create profile");
        profile
    }
}
