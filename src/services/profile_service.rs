//! Expert profile lookups, verification and leaderboards.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::UserProfile;
use crate::domain::ports::ProfileRepository;

/// Completed tasks a profile needs before it can be verified as an expert.
pub const VERIFICATION_MIN_TASKS: i64 = 50;

/// Largest leaderboard a caller may request.
pub const MAX_TOP_CONTRIBUTORS: u32 = 100;

pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    pub async fn get(&self, id: &str) -> DomainResult<UserProfile> {
        self.profiles
            .get(id)
            .await?
            .ok_or_else(|| DomainError::ProfileNotFound(id.to_string()))
    }

    /// Mark a profile as a verified expert.
    ///
    /// Verifying an already verified profile is a no-op.
    #[instrument(skip(self))]
    pub async fn verify(&self, id: &str) -> DomainResult<UserProfile> {
        let mut profile = self.get(id).await?;
        if profile.verified {
            return Ok(profile);
        }
        if profile.tasks_completed < VERIFICATION_MIN_TASKS {
            return Err(DomainError::ValidationFailed(format!(
                "profile {id} has completed {} tasks; {VERIFICATION_MIN_TASKS} are required for verification",
                profile.tasks_completed
            )));
        }

        profile.verified = true;
        profile.updated_at = Utc::now();
        self.profiles.update(&profile).await?;
        info!(profile_id = id, "profile verified");
        Ok(profile)
    }

    /// Profiles with the most completed tasks.
    pub async fn top_contributors(&self, limit: u32) -> DomainResult<Vec<UserProfile>> {
        if !(1..=MAX_TOP_CONTRIBUTORS).contains(&limit) {
            return Err(DomainError::InvalidArgument(format!(
                "limit must be between 1 and {MAX_TOP_CONTRIBUTORS}, got {limit}"
            )));
        }
        self.profiles.top_contributors(limit).await
    }
}
