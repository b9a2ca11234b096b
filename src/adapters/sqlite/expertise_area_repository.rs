//! SQLite implementation of the ExpertiseAreaRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::parse_datetime;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ExpertiseArea;
use crate::domain::ports::ExpertiseAreaRepository;

const AREA_COLUMNS: &str = "id, name, slug, description, parent_id, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteExpertiseAreaRepository {
    pool: SqlitePool,
}

impl SqliteExpertiseAreaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Map constraint failures on write to domain errors.
fn write_error(err: sqlx::Error, area: &ExpertiseArea) -> DomainError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DomainError::Conflict(format!(
            "expertise area '{}' ({}) conflicts with an existing area",
            area.name, area.slug
        )),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            DomainError::AreaNotFound(area.parent_id.clone().unwrap_or_default())
        }
        _ => err.into(),
    }
}

#[async_trait]
impl ExpertiseAreaRepository for SqliteExpertiseAreaRepository {
    async fn create(&self, area: &ExpertiseArea) -> DomainResult<()> {
        sqlx::query(&format!(
            "INSERT INTO expertise_areas ({AREA_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&area.id)
        .bind(&area.name)
        .bind(&area.slug)
        .bind(&area.description)
        .bind(&area.parent_id)
        .bind(area.is_active)
        .bind(area.created_at.to_rfc3339())
        .bind(area.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, area))?;

        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<ExpertiseArea>> {
        let row: Option<AreaRow> =
            sqlx::query_as(&format!("SELECT {AREA_COLUMNS} FROM expertise_areas WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> DomainResult<Option<ExpertiseArea>> {
        let row: Option<AreaRow> =
            sqlx::query_as(&format!("SELECT {AREA_COLUMNS} FROM expertise_areas WHERE slug = ?"))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn get_by_name(&self, name: &str) -> DomainResult<Option<ExpertiseArea>> {
        let row: Option<AreaRow> = sqlx::query_as(&format!(
            "SELECT {AREA_COLUMNS} FROM expertise_areas WHERE LOWER(name) = LOWER(?)"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_into()).transpose()
    }

    async fn update(&self, area: &ExpertiseArea) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE expertise_areas SET name = ?, slug = ?, description = ?, parent_id = ?,
               is_active = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&area.name)
        .bind(&area.slug)
        .bind(&area.description)
        .bind(&area.parent_id)
        .bind(area.is_active)
        .bind(area.updated_at.to_rfc3339())
        .bind(&area.id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, area))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AreaNotFound(area.id.clone()));
        }

        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM expertise_areas WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    DomainError::ValidationFailed(format!("expertise area {id} still has children"))
                }
                _ => e.into(),
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AreaNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn children(&self, parent_id: &str) -> DomainResult<Vec<ExpertiseArea>> {
        let rows: Vec<AreaRow> = sqlx::query_as(&format!(
            "SELECT {AREA_COLUMNS} FROM expertise_areas WHERE parent_id = ? ORDER BY name"
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn list(&self, active_only: bool) -> DomainResult<Vec<ExpertiseArea>> {
        let query = if active_only {
            format!("SELECT {AREA_COLUMNS} FROM expertise_areas WHERE is_active = 1 ORDER BY name")
        } else {
            format!("SELECT {AREA_COLUMNS} FROM expertise_areas ORDER BY name")
        };
        let rows: Vec<AreaRow> = sqlx::query_as(&query).fetch_all(&self.pool).await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    async fn count_profiles(&self, area_id: &str) -> DomainResult<u64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM profile_expertise WHERE area_id = ?")
                .bind(area_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.max(0) as u64)
    }
}

#[derive(sqlx::FromRow)]
struct AreaRow {
    id: String,
    name: String,
    slug: String,
    description: Option<String>,
    parent_id: Option<String>,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<AreaRow> for ExpertiseArea {
    type Error = DomainError;

    fn try_from(row: AreaRow) -> Result<Self, Self::Error> {
        Ok(ExpertiseArea {
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            parent_id: row.parent_id,
            is_active: row.is_active,
        })
    }
}
