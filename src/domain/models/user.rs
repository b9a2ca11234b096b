//! Session, profile and derived user-fact models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::statistics::UserStatistics;

/// Generate a prefixed short identifier such as `sess_1a2b3c4d`.
pub fn short_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &hex[..8])
}

/// Anonymous browsing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    pub id: String,
    pub publisher_id: String,
    pub browser_fingerprint: Option<String>,
    pub user_agent: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub device_type: Option<String>,
    pub platform: Option<String>,
    pub consent_given: bool,
    pub analytics_opt_in: bool,
    pub personalization_opt_in: bool,
    pub tasks_completed: i64,
    pub tasks_attempted: i64,
    /// Linked expert profile, if the visitor opted in
    pub profile_id: Option<String>,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSession {
    pub fn new(publisher_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: short_id("sess"),
            publisher_id: publisher_id.into(),
            browser_fingerprint: None,
            user_agent: None,
            language: None,
            timezone: None,
            referrer: None,
            country: None,
            device_type: None,
            platform: None,
            consent_given: false,
            analytics_opt_in: false,
            personalization_opt_in: false,
            tasks_completed: 0,
            tasks_attempted: 0,
            profile_id: None,
            last_active: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_profile(mut self, profile_id: impl Into<String>) -> Self {
        self.profile_id = Some(profile_id.into());
        self
    }

    pub fn with_tasks_completed(mut self, tasks_completed: i64) -> Self {
        self.tasks_completed = tasks_completed;
        self.tasks_attempted = self.tasks_attempted.max(tasks_completed);
        self
    }

    pub fn touch(&mut self) {
        let now = Utc::now();
        self.last_active = now;
        self.updated_at = now;
    }
}

/// Opt-in expert network profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub email_hash: Option<String>,
    pub primary_language: Option<String>,
    pub additional_languages: Vec<String>,
    pub timezone: Option<String>,
    pub expertise_level: u32,
    pub verified: bool,
    pub tasks_completed: i64,
    /// 0-100 quality score
    pub quality_score: i64,
    pub expertise_area_ids: Vec<String>,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: short_id("prof"),
            display_name: None,
            email_hash: None,
            primary_language: None,
            additional_languages: Vec::new(),
            timezone: None,
            expertise_level: 0,
            verified: false,
            tasks_completed: 0,
            quality_score: 0,
            expertise_area_ids: Vec::new(),
            last_active: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.primary_language = Some(language.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_tasks_completed(mut self, tasks_completed: i64) -> Self {
        self.tasks_completed = tasks_completed;
        self
    }

    pub fn with_expertise_areas(mut self, area_ids: Vec<String>) -> Self {
        self.expertise_area_ids = area_ids;
        self
    }

    /// Add area ids not already present, keeping existing order.
    pub fn merge_expertise_areas(&mut self, area_ids: &[String]) -> usize {
        let mut added = 0;
        for id in area_ids {
            if !self.expertise_area_ids.contains(id) {
                self.expertise_area_ids.push(id.clone());
                added += 1;
            }
        }
        if added > 0 {
            self.updated_at = Utc::now();
        }
        added
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new()
    }
}

/// Which backing entity a user identifier resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserKind {
    Session,
    Profile,
}

impl UserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Profile => "profile",
        }
    }
}

/// Normalized facts about a user, assembled per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFacts {
    pub user_id: String,
    pub user_kind: UserKind,
    pub language: Option<String>,
    pub tasks_completed: i64,
    pub expertise_level: u32,
    pub expertise_area_ids: Vec<String>,
    pub profile_link: Option<String>,
}

impl UserFacts {
    pub fn new(user_id: impl Into<String>, user_kind: UserKind) -> Self {
        Self {
            user_id: user_id.into(),
            user_kind,
            language: None,
            tasks_completed: 0,
            expertise_level: 0,
            expertise_area_ids: Vec::new(),
            profile_link: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_progress(mut self, tasks_completed: i64, expertise_level: u32) -> Self {
        self.tasks_completed = tasks_completed;
        self.expertise_level = expertise_level;
        self
    }

    pub fn with_expertise_areas(mut self, area_ids: Vec<String>) -> Self {
        self.expertise_area_ids = area_ids;
        self
    }
}

/// Point-in-time view of a user handed to the scoring engine.
///
/// `area_names` holds the names of the expertise areas that resolved; ids in
/// `facts.expertise_area_ids` that no longer exist are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub facts: UserFacts,
    pub statistics: Option<UserStatistics>,
    pub area_names: Vec<String>,
}

impl UserSnapshot {
    pub fn new(facts: UserFacts) -> Self {
        Self {
            facts,
            statistics: None,
            area_names: Vec::new(),
        }
    }

    pub fn with_statistics(mut self, statistics: UserStatistics) -> Self {
        self.statistics = Some(statistics);
        self
    }

    pub fn with_area_names(mut self, area_names: Vec<String>) -> Self {
        self.area_names = area_names;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_shape() {
        let id = short_id("sess");
        assert!(id.starts_with("sess_"));
        assert_eq!(id.len(), "sess_".len() + 8);
    }

    #[test]
    fn test_profile_merge_areas_skips_duplicates() {
        let mut profile = UserProfile::new().with_expertise_areas(vec!["exp_a".into()]);
        let added = profile.merge_expertise_areas(&["exp_a".into(), "exp_b".into()]);
        assert_eq!(added, 1);
        assert_eq!(profile.expertise_area_ids, vec!["exp_a", "exp_b"]);
    }
}
