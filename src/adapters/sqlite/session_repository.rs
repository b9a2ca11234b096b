//! SQLite implementation of the SessionRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::parse_datetime;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::UserSession;
use crate::domain::ports::SessionRepository;

const SESSION_COLUMNS: &str = "id, publisher_id, browser_fingerprint, user_agent, language, timezone, referrer, country, device_type, platform, consent_given, analytics_opt_in, personalization_opt_in, tasks_completed, tasks_attempted, profile_id, last_active, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: &UserSession) -> DomainResult<()> {
        sqlx::query(&format!(
            "INSERT INTO user_sessions ({SESSION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&session.id)
        .bind(&session.publisher_id)
        .bind(&session.browser_fingerprint)
        .bind(&session.user_agent)
        .bind(&session.language)
        .bind(&session.timezone)
        .bind(&session.referrer)
        .bind(&session.country)
        .bind(&session.device_type)
        .bind(&session.platform)
        .bind(session.consent_given)
        .bind(session.analytics_opt_in)
        .bind(session.personalization_opt_in)
        .bind(session.tasks_completed)
        .bind(session.tasks_attempted)
        .bind(&session.profile_id)
        .bind(session.last_active.to_rfc3339())
        .bind(session.created_at.to_rfc3339())
        .bind(session.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<UserSession>> {
        let row: Option<SessionRow> =
            sqlx::query_as(&format!("SELECT {SESSION_COLUMNS} FROM user_sessions WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn update(&self, session: &UserSession) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE user_sessions SET publisher_id = ?, browser_fingerprint = ?, user_agent = ?,
               language = ?, timezone = ?, referrer = ?, country = ?, device_type = ?, platform = ?,
               consent_given = ?, analytics_opt_in = ?, personalization_opt_in = ?,
               tasks_completed = ?, tasks_attempted = ?, profile_id = ?, last_active = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&session.publisher_id)
        .bind(&session.browser_fingerprint)
        .bind(&session.user_agent)
        .bind(&session.language)
        .bind(&session.timezone)
        .bind(&session.referrer)
        .bind(&session.country)
        .bind(&session.device_type)
        .bind(&session.platform)
        .bind(session.consent_given)
        .bind(session.analytics_opt_in)
        .bind(session.personalization_opt_in)
        .bind(session.tasks_completed)
        .bind(session.tasks_attempted)
        .bind(&session.profile_id)
        .bind(session.last_active.to_rfc3339())
        .bind(session.updated_at.to_rfc3339())
        .bind(&session.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::SessionNotFound(session.id.clone()));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::SessionNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn list_by_profile(&self, profile_id: &str) -> DomainResult<Vec<UserSession>> {
        let rows: Vec<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM user_sessions WHERE profile_id = ? ORDER BY last_active DESC"
        ))
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    publisher_id: String,
    browser_fingerprint: Option<String>,
    user_agent: Option<String>,
    language: Option<String>,
    timezone: Option<String>,
    referrer: Option<String>,
    country: Option<String>,
    device_type: Option<String>,
    platform: Option<String>,
    consent_given: bool,
    analytics_opt_in: bool,
    personalization_opt_in: bool,
    tasks_completed: i64,
    tasks_attempted: i64,
    profile_id: Option<String>,
    last_active: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SessionRow> for UserSession {
    type Error = DomainError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(UserSession {
            last_active: parse_datetime(&row.last_active)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            id: row.id,
            publisher_id: row.publisher_id,
            browser_fingerprint: row.browser_fingerprint,
            user_agent: row.user_agent,
            language: row.language,
            timezone: row.timezone,
            referrer: row.referrer,
            country: row.country,
            device_type: row.device_type,
            platform: row.platform,
            consent_given: row.consent_given,
            analytics_opt_in: row.analytics_opt_in,
            personalization_opt_in: row.personalization_opt_in,
            tasks_completed: row.tasks_completed,
            tasks_attempted: row.tasks_attempted,
            profile_id: row.profile_id,
        })
    }
}
