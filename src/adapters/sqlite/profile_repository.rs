//! SQLite implementation of the ProfileRepository.
//!
//! Expertise-area links live in `profile_expertise`, ordered by `position`.

use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::{parse_datetime, parse_json_or_default, parse_level};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::UserProfile;
use crate::domain::ports::ProfileRepository;

const PROFILE_COLUMNS: &str = "id, display_name, email_hash, primary_language, additional_languages, timezone, expertise_level, verified, tasks_completed, quality_score, last_active, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn area_ids(&self, profile_id: &str) -> DomainResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT area_id FROM profile_expertise WHERE profile_id = ? ORDER BY position",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

async fn replace_area_links(
    tx: &mut Transaction<'_, Sqlite>,
    profile_id: &str,
    area_ids: &[String],
) -> DomainResult<()> {
    sqlx::query("DELETE FROM profile_expertise WHERE profile_id = ?")
        .bind(profile_id)
        .execute(&mut **tx)
        .await?;

    for (position, area_id) in area_ids.iter().enumerate() {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO profile_expertise (profile_id, area_id, position) VALUES (?, ?, ?)",
        )
        .bind(profile_id)
        .bind(area_id)
        .bind(position as i64)
        .execute(&mut **tx)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                return Err(DomainError::AreaNotFound(area_id.clone()));
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn create(&self, profile: &UserProfile) -> DomainResult<()> {
        let languages_json = serde_json::to_string(&profile.additional_languages)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO user_profiles (id, display_name, email_hash, primary_language, additional_languages,
               timezone, expertise_level, verified, tasks_completed, quality_score, last_active, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&profile.id)
        .bind(&profile.display_name)
        .bind(&profile.email_hash)
        .bind(&profile.primary_language)
        .bind(&languages_json)
        .bind(&profile.timezone)
        .bind(i64::from(profile.expertise_level))
        .bind(profile.verified)
        .bind(profile.tasks_completed)
        .bind(profile.quality_score)
        .bind(profile.last_active.to_rfc3339())
        .bind(profile.created_at.to_rfc3339())
        .bind(profile.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        replace_area_links(&mut tx, &profile.id, &profile.expertise_area_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<UserProfile>> {
        let row: Option<ProfileRow> =
            sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut profile: UserProfile = row.try_into()?;
        profile.expertise_area_ids = self.area_ids(&profile.id).await?;
        Ok(Some(profile))
    }

    async fn update(&self, profile: &UserProfile) -> DomainResult<()> {
        let languages_json = serde_json::to_string(&profile.additional_languages)?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"UPDATE user_profiles SET display_name = ?, email_hash = ?, primary_language = ?,
               additional_languages = ?, timezone = ?, expertise_level = ?, verified = ?,
               tasks_completed = ?, quality_score = ?, last_active = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&profile.display_name)
        .bind(&profile.email_hash)
        .bind(&profile.primary_language)
        .bind(&languages_json)
        .bind(&profile.timezone)
        .bind(i64::from(profile.expertise_level))
        .bind(profile.verified)
        .bind(profile.tasks_completed)
        .bind(profile.quality_score)
        .bind(profile.last_active.to_rfc3339())
        .bind(profile.updated_at.to_rfc3339())
        .bind(&profile.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ProfileNotFound(profile.id.clone()));
        }

        replace_area_links(&mut tx, &profile.id, &profile.expertise_area_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM user_profiles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ProfileNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn top_contributors(&self, limit: u32) -> DomainResult<Vec<UserProfile>> {
        let rows: Vec<ProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles ORDER BY tasks_completed DESC, created_at ASC, id ASC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut profiles = Vec::with_capacity(rows.len());
        for row in rows {
            let mut profile: UserProfile = row.try_into()?;
            profile.expertise_area_ids = self.area_ids(&profile.id).await?;
            profiles.push(profile);
        }
        Ok(profiles)
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: String,
    display_name: Option<String>,
    email_hash: Option<String>,
    primary_language: Option<String>,
    additional_languages: Option<String>,
    timezone: Option<String>,
    expertise_level: i64,
    verified: bool,
    tasks_completed: i64,
    quality_score: i64,
    last_active: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(UserProfile {
            additional_languages: parse_json_or_default(row.additional_languages)?,
            expertise_level: parse_level(row.expertise_level)?,
            last_active: parse_datetime(&row.last_active)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            id: row.id,
            display_name: row.display_name,
            email_hash: row.email_hash,
            primary_language: row.primary_language,
            timezone: row.timezone,
            verified: row.verified,
            tasks_completed: row.tasks_completed,
            quality_score: row.quality_score,
            expertise_area_ids: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteExpertiseAreaRepository};
    use crate::domain::models::ExpertiseArea;
    use crate::domain::ports::ExpertiseAreaRepository;

    async fn setup() -> (SqliteProfileRepository, SqliteExpertiseAreaRepository) {
        let pool = create_migrated_test_pool().await.unwrap();
        (
            SqliteProfileRepository::new(pool.clone()),
            SqliteExpertiseAreaRepository::new(pool),
        )
    }

    #[tokio::test]
    async fn test_profile_round_trips_area_links_in_order() {
        let (profiles, areas) = setup().await;
        let physics = ExpertiseArea::new("Physics");
        let arts = ExpertiseArea::new("Arts");
        areas.create(&physics).await.unwrap();
        areas.create(&arts).await.unwrap();

        let profile = UserProfile::new()
            .with_language("de")
            .with_expertise_areas(vec![physics.id.clone(), arts.id.clone()]);
        profiles.create(&profile).await.unwrap();

        let fetched = profiles.get(&profile.id).await.unwrap().unwrap();
        assert_eq!(fetched.primary_language.as_deref(), Some("de"));
        assert_eq!(fetched.expertise_area_ids, vec![physics.id.clone(), arts.id.clone()]);
        assert_eq!(areas.count_profiles(&physics.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_area_links() {
        let (profiles, areas) = setup().await;
        let physics = ExpertiseArea::new("Physics");
        let arts = ExpertiseArea::new("Arts");
        areas.create(&physics).await.unwrap();
        areas.create(&arts).await.unwrap();

        let mut profile = UserProfile::new().with_expertise_areas(vec![physics.id.clone()]);
        profiles.create(&profile).await.unwrap();

        profile.expertise_area_ids = vec![arts.id.clone()];
        profile.tasks_completed = 12;
        profile.expertise_level = 1;
        profiles.update(&profile).await.unwrap();

        let fetched = profiles.get(&profile.id).await.unwrap().unwrap();
        assert_eq!(fetched.expertise_area_ids, vec![arts.id.clone()]);
        assert_eq!(fetched.tasks_completed, 12);
        assert_eq!(fetched.expertise_level, 1);
        assert_eq!(areas.count_profiles(&physics.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_area_link_rejected() {
        let (profiles, _) = setup().await;
        let profile = UserProfile::new().with_expertise_areas(vec!["exp_missing".to_string()]);
        let err = profiles.create(&profile).await.unwrap_err();
        assert!(matches!(err, DomainError::AreaNotFound(_)));
        assert!(profiles.get(&profile.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let (profiles, _) = setup().await;
        assert!(profiles.get("prof_missing").await.unwrap().is_none());
        let err = profiles.update(&UserProfile::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::ProfileNotFound(_)));
    }

    #[tokio::test]
    async fn test_top_contributors_ordered_by_completed_tasks() {
        let (profiles, areas) = setup().await;
        let physics = ExpertiseArea::new("Physics");
        areas.create(&physics).await.unwrap();

        let casual = UserProfile::new().with_tasks_completed(3);
        let expert = UserProfile::new()
            .with_tasks_completed(120)
            .with_expertise_areas(vec![physics.id.clone()]);
        let regular = UserProfile::new().with_tasks_completed(40);
        for profile in [&casual, &expert, &regular] {
            profiles.create(profile).await.unwrap();
        }

        let top = profiles.top_contributors(2).await.unwrap();
        let ids: Vec<&str> = top.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![expert.id.as_str(), regular.id.as_str()]);
        assert_eq!(top[0].expertise_area_ids, vec![physics.id]);

        assert_eq!(profiles.top_contributors(10).await.unwrap().len(), 3);
    }
}
