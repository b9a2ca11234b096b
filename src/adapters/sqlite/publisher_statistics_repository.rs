//! SQLite implementation of the PublisherStatisticsRepository.
//!
//! Activity is aggregated from `user_sessions` on read; no per-publisher row
//! is stored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::parse_datetime;
use crate::domain::errors::DomainResult;
use crate::domain::models::PublisherActivity;
use crate::domain::ports::PublisherStatisticsRepository;

#[derive(Clone)]
pub struct SqlitePublisherStatisticsRepository {
    pool: SqlitePool,
}

impl SqlitePublisherStatisticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SessionActivityRow {
    last_active: String,
    consent_given: bool,
    tasks_completed: i64,
    tasks_attempted: i64,
}

#[async_trait]
impl PublisherStatisticsRepository for SqlitePublisherStatisticsRepository {
    async fn activity(
        &self,
        publisher_id: &str,
        active_since: DateTime<Utc>,
    ) -> DomainResult<PublisherActivity> {
        let rows: Vec<SessionActivityRow> = sqlx::query_as(
            r#"SELECT last_active, consent_given, tasks_completed, tasks_attempted
               FROM user_sessions WHERE publisher_id = ?"#,
        )
        .bind(publisher_id)
        .fetch_all(&self.pool)
        .await?;

        let mut activity = PublisherActivity {
            total_sessions: rows.len() as i64,
            ..Default::default()
        };
        for row in rows {
            if parse_datetime(&row.last_active)? < active_since {
                continue;
            }
            activity.active_sessions += 1;
            if row.consent_given {
                activity.consent_given_count += 1;
            }
            activity.tasks_completed += row.tasks_completed;
            activity.tasks_attempted += row.tasks_attempted;
        }
        Ok(activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteSessionRepository};
    use crate::domain::models::UserSession;
    use crate::domain::ports::SessionRepository;

    #[tokio::test]
    async fn test_activity_counts_only_recent_sessions() {
        let pool = create_migrated_test_pool().await.unwrap();
        let sessions = SqliteSessionRepository::new(pool.clone());
        let now = Utc::now();

        let mut recent = UserSession::new("pub_1").with_tasks_completed(4);
        recent.tasks_attempted = 5;
        recent.consent_given = true;
        let mut quiet = UserSession::new("pub_1").with_tasks_completed(2);
        quiet.last_active = now - Duration::days(3);
        let mut stale = UserSession::new("pub_1").with_tasks_completed(9);
        stale.last_active = now - Duration::days(60);
        stale.consent_given = true;
        let other = UserSession::new("pub_2").with_tasks_completed(7);
        for session in [&recent, &quiet, &stale, &other] {
            sessions.create(session).await.unwrap();
        }

        let repo = SqlitePublisherStatisticsRepository::new(pool);
        let activity = repo.activity("pub_1", now - Duration::days(30)).await.unwrap();

        assert_eq!(
            activity,
            PublisherActivity {
                total_sessions: 3,
                active_sessions: 2,
                consent_given_count: 1,
                tasks_completed: 6,
                tasks_attempted: 7,
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_publisher_has_no_activity() {
        let pool = create_migrated_test_pool().await.unwrap();
        let repo = SqlitePublisherStatisticsRepository::new(pool);
        let activity = repo.activity("pub_missing", Utc::now()).await.unwrap();
        assert_eq!(activity, PublisherActivity::default());
    }
}
