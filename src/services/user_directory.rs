//! Resolves user identifiers into the facts the scoring engine consumes.

use std::sync::Arc;

use futures::future::join_all;
use tracing::warn;

use super::expertise_level::ExpertiseLevelCalculator;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    StatisticsOwner, UserFacts, UserKind, UserProfile, UserSession, UserSnapshot, UserStatistics,
};
use crate::domain::ports::{
    ExpertiseAreaRepository, ProfileRepository, SessionRepository, StatisticsRepository,
};

/// A user identifier resolved to its backing entity.
#[derive(Debug, Clone)]
pub enum ResolvedUser {
    Session(UserSession),
    Profile(UserProfile),
}

impl ResolvedUser {
    pub fn statistics_owner(&self) -> StatisticsOwner {
        match self {
            Self::Session(s) => StatisticsOwner::Session(s.id.clone()),
            Self::Profile(p) => StatisticsOwner::Profile(p.id.clone()),
        }
    }

    pub fn tasks_completed(&self) -> i64 {
        match self {
            Self::Session(s) => s.tasks_completed,
            Self::Profile(p) => p.tasks_completed,
        }
    }
}

#[derive(Clone)]
pub struct UserDirectory {
    sessions: Arc<dyn SessionRepository>,
    profiles: Arc<dyn ProfileRepository>,
    statistics: Arc<dyn StatisticsRepository>,
    areas: Arc<dyn ExpertiseAreaRepository>,
    levels: ExpertiseLevelCalculator,
}

impl UserDirectory {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        profiles: Arc<dyn ProfileRepository>,
        statistics: Arc<dyn StatisticsRepository>,
        areas: Arc<dyn ExpertiseAreaRepository>,
        levels: ExpertiseLevelCalculator,
    ) -> Self {
        Self {
            sessions,
            profiles,
            statistics,
            areas,
            levels,
        }
    }

    pub fn levels(&self) -> &ExpertiseLevelCalculator {
        &self.levels
    }

    /// Look the identifier up as a session first, then as a profile.
    pub async fn resolve(&self, user_id: &str) -> DomainResult<ResolvedUser> {
        if let Some(session) = self.sessions.get(user_id).await? {
            return Ok(ResolvedUser::Session(session));
        }
        if let Some(profile) = self.profiles.get(user_id).await? {
            return Ok(ResolvedUser::Profile(profile));
        }
        warn!(user_id, "user not found");
        Err(DomainError::UserNotFound(user_id.to_string()))
    }

    /// Normalized facts for a user.
    ///
    /// A session inherits the expertise areas of its linked profile. The
    /// expertise level is always derived from the completed-task count.
    pub async fn user_facts(&self, user_id: &str) -> DomainResult<UserFacts> {
        let resolved = self.resolve(user_id).await?;
        self.facts_for(&resolved).await
    }

    pub async fn facts_for(&self, resolved: &ResolvedUser) -> DomainResult<UserFacts> {
        match resolved {
            ResolvedUser::Session(session) => {
                let expertise_area_ids = match &session.profile_id {
                    Some(profile_id) => self
                        .profiles
                        .get(profile_id)
                        .await?
                        .map(|p| p.expertise_area_ids)
                        .unwrap_or_default(),
                    None => Vec::new(),
                };
                Ok(UserFacts {
                    user_id: session.id.clone(),
                    user_kind: UserKind::Session,
                    language: session.language.clone(),
                    tasks_completed: session.tasks_completed,
                    expertise_level: self.levels.level(session.tasks_completed)?,
                    expertise_area_ids,
                    profile_link: session.profile_id.clone(),
                })
            }
            ResolvedUser::Profile(profile) => Ok(UserFacts {
                user_id: profile.id.clone(),
                user_kind: UserKind::Profile,
                language: profile.primary_language.clone(),
                tasks_completed: profile.tasks_completed,
                expertise_level: self.levels.level(profile.tasks_completed)?,
                expertise_area_ids: profile.expertise_area_ids.clone(),
                profile_link: Some(profile.id.clone()),
            }),
        }
    }

    /// Statistics for resolved facts; `None` when no row exists yet.
    pub async fn statistics_for(&self, facts: &UserFacts) -> DomainResult<Option<UserStatistics>> {
        let owner = match facts.user_kind {
            UserKind::Session => StatisticsOwner::Session(facts.user_id.clone()),
            UserKind::Profile => StatisticsOwner::Profile(facts.user_id.clone()),
        };
        self.statistics.get(&owner).await
    }

    /// Name of an expertise area.
    pub async fn area_name(&self, area_id: &str) -> DomainResult<String> {
        self.areas
            .get(area_id)
            .await?
            .map(|area| area.name)
            .ok_or_else(|| DomainError::AreaNotFound(area_id.to_string()))
    }

    /// Names of the areas that resolve; missing or failing lookups are skipped.
    pub async fn area_names(&self, area_ids: &[String]) -> Vec<String> {
        let lookups = area_ids.iter().map(|id| self.area_name(id));
        join_all(lookups)
            .await
            .into_iter()
            .zip(area_ids)
            .filter_map(|(result, id)| match result {
                Ok(name) => Some(name),
                Err(err) => {
                    warn!(area_id = %id, error = %err, "skipping unresolved expertise area");
                    None
                }
            })
            .collect()
    }

    /// Facts, statistics and area names for one scoring request.
    ///
    /// Only user resolution can fail. A statistics lookup error, or a row that
    /// fails validation, is treated as "no statistics yet" so the staircase
    /// falls back to task counts.
    pub async fn snapshot(&self, user_id: &str) -> DomainResult<UserSnapshot> {
        let facts = self.user_facts(user_id).await?;
        let statistics = match self.statistics_for(&facts).await {
            Ok(Some(statistics)) => match statistics.validate() {
                Ok(()) => Some(statistics),
                Err(err) => {
                    warn!(user_id, error = %err, "ignoring corrupt statistics row");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(user_id, error = %err, "statistics lookup failed, scoring without them");
                None
            }
        };
        let area_names = self.area_names(&facts.expertise_area_ids).await;
        Ok(UserSnapshot {
            facts,
            statistics,
            area_names,
        })
    }
}
