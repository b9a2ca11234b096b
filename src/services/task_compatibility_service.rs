//! Task compatibility service: the async entry points over the scoring engine.

use tracing::{info, instrument};

use super::compatibility_scorer::CompatibilityScorer;
use super::staircase::StaircasePolicy;
use super::task_ranker::TaskRanker;
use super::user_directory::UserDirectory;
use crate::domain::errors::DomainResult;
use crate::domain::models::{CompatibilityResult, LevelRecommendation, ScoredTask, TaskDescriptor};

pub struct TaskCompatibilityService {
    directory: UserDirectory,
    ranker: TaskRanker,
}

impl TaskCompatibilityService {
    pub fn new(directory: UserDirectory, scorer: CompatibilityScorer) -> Self {
        let policy = StaircasePolicy::new(directory.levels().clone());
        Self {
            directory,
            ranker: TaskRanker::new(scorer, policy),
        }
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Score a single task for a user.
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    pub async fn calculate_task_compatibility(
        &self,
        user_id: &str,
        task: &TaskDescriptor,
    ) -> DomainResult<CompatibilityResult> {
        let snapshot = self.directory.snapshot(user_id).await?;
        Ok(self.ranker.scorer().score(&snapshot, task))
    }

    /// Ranked compatible tasks for a user, with a challenge task when due.
    #[instrument(skip(self, tasks), fields(candidates = tasks.len()))]
    pub async fn get_compatible_tasks(
        &self,
        user_id: &str,
        tasks: &[TaskDescriptor],
    ) -> DomainResult<Vec<ScoredTask>> {
        let snapshot = self.directory.snapshot(user_id).await?;
        self.ranker.rank(&snapshot, tasks)
    }

    /// Staircase recommendation plus tier progress for a user.
    #[instrument(skip(self))]
    pub async fn recommend_next_task_level(&self, user_id: &str) -> DomainResult<LevelRecommendation> {
        let snapshot = self.directory.snapshot(user_id).await?;
        let facts = &snapshot.facts;
        let levels = self.directory.levels();

        let decision = self.ranker.policy().evaluate(
            snapshot.statistics.as_ref(),
            facts.expertise_level,
            facts.tasks_completed,
        )?;

        info!(
            user_id,
            current_level = facts.expertise_level,
            recommended_level = decision.recommended_level,
            should_advance = decision.should_advance,
            is_challenge_task = decision.is_challenge_task,
            "recommended task level"
        );

        Ok(LevelRecommendation {
            user_id: facts.user_id.clone(),
            current_level: facts.expertise_level,
            tasks_completed: facts.tasks_completed,
            next_threshold: levels.next_threshold(facts.expertise_level),
            progress_percentage: levels
                .progress_percentage(facts.tasks_completed, facts.expertise_level),
            decision,
        })
    }
}
