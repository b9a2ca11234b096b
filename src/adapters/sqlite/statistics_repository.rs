//! SQLite implementation of the StatisticsRepository.
//!
//! A row belongs to exactly one session or profile, keyed by the matching
//! owner column. Distribution maps are stored as JSON text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{parse_datetime, parse_json_or_default, parse_level, parse_optional_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GlobalAverages, StatisticsOwner, TaskEvent, UserStatistics};
use crate::domain::ports::StatisticsRepository;
use crate::services::expertise_level::level_for;

const STATS_COLUMNS: &str = "id, session_id, profile_id, total_tasks_completed, total_tasks_attempted, total_tasks_successful, completion_rate, success_rate, average_task_time_ms, timed_samples, fastest_task_time_ms, slowest_task_time_ms, task_type_distribution, average_quality_score, quality_samples, quality_distribution, expertise_level, first_task_date, last_task_date, active_days, engagement_score, consistency_score, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteStatisticsRepository {
    pool: SqlitePool,
}

impl SqliteStatisticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn owner_column(owner: &StatisticsOwner) -> &'static str {
    match owner {
        StatisticsOwner::Session(_) => "session_id",
        StatisticsOwner::Profile(_) => "profile_id",
    }
}

fn owner_ids(owner: &StatisticsOwner) -> (Option<&str>, Option<&str>) {
    match owner {
        StatisticsOwner::Session(id) => (Some(id.as_str()), None),
        StatisticsOwner::Profile(id) => (None, Some(id.as_str())),
    }
}

fn owner_missing(owner: &StatisticsOwner) -> DomainError {
    match owner {
        StatisticsOwner::Session(id) => DomainError::SessionNotFound(id.clone()),
        StatisticsOwner::Profile(id) => DomainError::ProfileNotFound(id.clone()),
    }
}

async fn fetch(conn: &mut SqliteConnection, owner: &StatisticsOwner) -> DomainResult<Option<UserStatistics>> {
    let row: Option<StatisticsRow> = sqlx::query_as(&format!(
        "SELECT {STATS_COLUMNS} FROM user_statistics WHERE {} = ?",
        owner_column(owner)
    ))
    .bind(owner.id())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|r| r.try_into()).transpose()
}

async fn insert(conn: &mut SqliteConnection, stats: &UserStatistics) -> DomainResult<()> {
    let (session_id, profile_id) = owner_ids(&stats.owner);
    sqlx::query(&format!(
        "INSERT INTO user_statistics ({STATS_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(&stats.id)
    .bind(session_id)
    .bind(profile_id)
    .bind(stats.total_tasks_completed)
    .bind(stats.total_tasks_attempted)
    .bind(stats.total_tasks_successful)
    .bind(stats.completion_rate)
    .bind(stats.success_rate)
    .bind(stats.average_task_time_ms)
    .bind(stats.timed_samples)
    .bind(stats.fastest_task_time_ms)
    .bind(stats.slowest_task_time_ms)
    .bind(serde_json::to_string(&stats.task_type_distribution)?)
    .bind(stats.average_quality_score)
    .bind(stats.quality_samples)
    .bind(serde_json::to_string(&stats.quality_distribution)?)
    .bind(i64::from(stats.expertise_level))
    .bind(stats.first_task_date.map(|dt| dt.to_rfc3339()))
    .bind(stats.last_task_date.map(|dt| dt.to_rfc3339()))
    .bind(stats.active_days)
    .bind(stats.engagement_score)
    .bind(stats.consistency_score)
    .bind(stats.created_at.to_rfc3339())
    .bind(stats.updated_at.to_rfc3339())
    .execute(&mut *conn)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => owner_missing(&stats.owner),
        sqlx::Error::Database(db) if db.is_unique_violation() => DomainError::Conflict(format!(
            "statistics already exist for {}",
            stats.owner.id()
        )),
        _ => e.into(),
    })?;

    Ok(())
}

async fn overwrite(conn: &mut SqliteConnection, stats: &UserStatistics) -> DomainResult<()> {
    let result = sqlx::query(
        r#"UPDATE user_statistics SET total_tasks_completed = ?, total_tasks_attempted = ?,
           total_tasks_successful = ?, completion_rate = ?, success_rate = ?, average_task_time_ms = ?,
           timed_samples = ?, fastest_task_time_ms = ?, slowest_task_time_ms = ?, task_type_distribution = ?,
           average_quality_score = ?, quality_samples = ?, quality_distribution = ?, expertise_level = ?,
           first_task_date = ?, last_task_date = ?, active_days = ?, engagement_score = ?,
           consistency_score = ?, updated_at = ?
           WHERE id = ?"#,
    )
    .bind(stats.total_tasks_completed)
    .bind(stats.total_tasks_attempted)
    .bind(stats.total_tasks_successful)
    .bind(stats.completion_rate)
    .bind(stats.success_rate)
    .bind(stats.average_task_time_ms)
    .bind(stats.timed_samples)
    .bind(stats.fastest_task_time_ms)
    .bind(stats.slowest_task_time_ms)
    .bind(serde_json::to_string(&stats.task_type_distribution)?)
    .bind(stats.average_quality_score)
    .bind(stats.quality_samples)
    .bind(serde_json::to_string(&stats.quality_distribution)?)
    .bind(i64::from(stats.expertise_level))
    .bind(stats.first_task_date.map(|dt| dt.to_rfc3339()))
    .bind(stats.last_task_date.map(|dt| dt.to_rfc3339()))
    .bind(stats.active_days)
    .bind(stats.engagement_score)
    .bind(stats.consistency_score)
    .bind(stats.updated_at.to_rfc3339())
    .bind(&stats.id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(owner_missing(&stats.owner));
    }
    Ok(())
}

/// Bump the owner's task counters and return its new completed-task count.
///
/// Profiles also get their stored expertise level refreshed.
async fn bump_owner(
    conn: &mut SqliteConnection,
    owner: &StatisticsOwner,
    event: &TaskEvent,
    level_thresholds: &[i64],
    now: DateTime<Utc>,
) -> DomainResult<i64> {
    let completed_delta = i64::from(event.completed);
    let now = now.to_rfc3339();

    match owner {
        StatisticsOwner::Session(id) => {
            let result = sqlx::query(
                r#"UPDATE user_sessions SET tasks_attempted = tasks_attempted + 1,
                   tasks_completed = tasks_completed + ?, last_active = ?, updated_at = ?
                   WHERE id = ?"#,
            )
            .bind(completed_delta)
            .bind(&now)
            .bind(&now)
            .bind(id)
            .execute(&mut *conn)
            .await?;
            if result.rows_affected() == 0 {
                return Err(owner_missing(owner));
            }
            let (tasks_completed,): (i64,) =
                sqlx::query_as("SELECT tasks_completed FROM user_sessions WHERE id = ?")
                    .bind(id)
                    .fetch_one(&mut *conn)
                    .await?;
            Ok(tasks_completed)
        }
        StatisticsOwner::Profile(id) => {
            let current: Option<(i64,)> =
                sqlx::query_as("SELECT tasks_completed FROM user_profiles WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?;
            let (current,) = current.ok_or_else(|| owner_missing(owner))?;
            let tasks_completed = current + completed_delta;
            let level = level_for(tasks_completed, level_thresholds)?;

            sqlx::query(
                r#"UPDATE user_profiles SET tasks_completed = ?, expertise_level = ?,
                   last_active = ?, updated_at = ?
                   WHERE id = ?"#,
            )
            .bind(tasks_completed)
            .bind(i64::from(level))
            .bind(&now)
            .bind(&now)
            .bind(id)
            .execute(&mut *conn)
            .await?;
            Ok(tasks_completed)
        }
    }
}

#[derive(sqlx::FromRow)]
struct AveragesRow {
    session_count: i64,
    profile_count: i64,
    completion_rate: f64,
    success_rate: f64,
    average_task_time_ms: f64,
    average_quality_score: f64,
}

#[async_trait]
impl StatisticsRepository for SqliteStatisticsRepository {
    async fn get(&self, owner: &StatisticsOwner) -> DomainResult<Option<UserStatistics>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, owner).await
    }

    async fn create(&self, stats: &UserStatistics) -> DomainResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, stats).await
    }

    async fn save(&self, stats: &UserStatistics) -> DomainResult<()> {
        let mut conn = self.pool.acquire().await?;
        overwrite(&mut conn, stats).await
    }

    async fn record_task_event(
        &self,
        owner: &StatisticsOwner,
        event: &TaskEvent,
        level_thresholds: &[i64],
        now: DateTime<Utc>,
    ) -> DomainResult<UserStatistics> {
        event.validate()?;
        let mut tx = self.pool.begin().await?;

        let tasks_completed = bump_owner(&mut tx, owner, event, level_thresholds, now).await?;

        let (mut stats, is_new) = match fetch(&mut tx, owner).await? {
            Some(stats) => (stats, false),
            None => (UserStatistics::new(owner.clone()), true),
        };
        stats.record(event, now)?;
        stats.expertise_level = level_for(tasks_completed, level_thresholds)?;

        if is_new {
            insert(&mut tx, &stats).await?;
        } else {
            overwrite(&mut tx, &stats).await?;
        }
        tx.commit().await?;

        debug!(
            owner = owner.id(),
            attempted = stats.total_tasks_attempted,
            completed = stats.total_tasks_completed,
            created = is_new,
            "recorded task event"
        );
        Ok(stats)
    }

    async fn global_averages(&self) -> DomainResult<GlobalAverages> {
        let row: AveragesRow = sqlx::query_as(
            r#"SELECT COUNT(session_id) AS session_count, COUNT(profile_id) AS profile_count,
               COALESCE(AVG(completion_rate), 0.0) AS completion_rate,
               COALESCE(AVG(success_rate), 0.0) AS success_rate,
               COALESCE(AVG(average_task_time_ms), 0.0) AS average_task_time_ms,
               COALESCE(AVG(average_quality_score), 0.0) AS average_quality_score
               FROM user_statistics"#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(GlobalAverages {
            completion_rate: row.completion_rate,
            success_rate: row.success_rate,
            average_task_time_ms: row.average_task_time_ms,
            average_quality_score: row.average_quality_score,
            session_count: row.session_count,
            profile_count: row.profile_count,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatisticsRow {
    id: String,
    session_id: Option<String>,
    profile_id: Option<String>,
    total_tasks_completed: i64,
    total_tasks_attempted: i64,
    total_tasks_successful: i64,
    completion_rate: f64,
    success_rate: f64,
    average_task_time_ms: f64,
    timed_samples: i64,
    fastest_task_time_ms: i64,
    slowest_task_time_ms: i64,
    task_type_distribution: Option<String>,
    average_quality_score: f64,
    quality_samples: i64,
    quality_distribution: Option<String>,
    expertise_level: i64,
    first_task_date: Option<String>,
    last_task_date: Option<String>,
    active_days: i64,
    engagement_score: f64,
    consistency_score: f64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<StatisticsRow> for UserStatistics {
    type Error = DomainError;

    fn try_from(row: StatisticsRow) -> Result<Self, Self::Error> {
        let owner = match (row.session_id, row.profile_id) {
            (Some(id), None) => StatisticsOwner::Session(id),
            (None, Some(id)) => StatisticsOwner::Profile(id),
            _ => {
                return Err(DomainError::SerializationError(format!(
                    "statistics {} must belong to exactly one session or profile",
                    row.id
                )))
            }
        };

        Ok(UserStatistics {
            owner,
            task_type_distribution: parse_json_or_default(row.task_type_distribution)?,
            quality_distribution: parse_json_or_default(row.quality_distribution)?,
            expertise_level: parse_level(row.expertise_level)?,
            first_task_date: parse_optional_datetime(row.first_task_date)?,
            last_task_date: parse_optional_datetime(row.last_task_date)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            id: row.id,
            total_tasks_completed: row.total_tasks_completed,
            total_tasks_attempted: row.total_tasks_attempted,
            total_tasks_successful: row.total_tasks_successful,
            completion_rate: row.completion_rate,
            success_rate: row.success_rate,
            average_task_time_ms: row.average_task_time_ms,
            timed_samples: row.timed_samples,
            fastest_task_time_ms: row.fastest_task_time_ms,
            slowest_task_time_ms: row.slowest_task_time_ms,
            average_quality_score: row.average_quality_score,
            quality_samples: row.quality_samples,
            active_days: row.active_days,
            engagement_score: row.engagement_score,
            consistency_score: row.consistency_score,
        })
    }
}
