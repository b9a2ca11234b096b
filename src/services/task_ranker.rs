//! Builds a user's ranked task list with staircase challenge injection.

use tracing::{debug, info};

use super::compatibility_scorer::{languages_match, CompatibilityScorer};
use super::staircase::StaircasePolicy;
use crate::domain::errors::DomainResult;
use crate::domain::models::{ScoredTask, TaskDescriptor, UserSnapshot};

#[derive(Debug, Clone, Default)]
pub struct TaskRanker {
    scorer: CompatibilityScorer,
    policy: StaircasePolicy,
}

impl TaskRanker {
    pub fn new(scorer: CompatibilityScorer, policy: StaircasePolicy) -> Self {
        Self { scorer, policy }
    }

    pub fn scorer(&self) -> &CompatibilityScorer {
        &self.scorer
    }

    pub fn policy(&self) -> &StaircasePolicy {
        &self.policy
    }

    /// Rank `tasks` for `user`.
    ///
    /// Compatible tasks are sorted by descending overall score, keeping input
    /// order between equal scores. When the staircase policy calls for a
    /// challenge, the first task of the input list one tier above the user in
    /// the user's language is placed first, whether or not it passed the
    /// compatibility filter. No cap is applied.
    pub fn rank(&self, user: &UserSnapshot, tasks: &[TaskDescriptor]) -> DomainResult<Vec<ScoredTask>> {
        let mut scored: Vec<(usize, ScoredTask)> = tasks
            .iter()
            .enumerate()
            .filter_map(|(index, task)| {
                let compatibility = self.scorer.score(user, task);
                compatibility.is_compatible.then(|| {
                    (
                        index,
                        ScoredTask {
                            task: task.clone(),
                            compatibility,
                            is_challenge: false,
                        },
                    )
                })
            })
            .collect();

        // Vec::sort_by is stable; equal scores keep input order.
        scored.sort_by(|(_, a), (_, b)| {
            b.compatibility
                .overall_score
                .total_cmp(&a.compatibility.overall_score)
        });

        let facts = &user.facts;
        let decision =
            self.policy
                .evaluate(user.statistics.as_ref(), facts.expertise_level, facts.tasks_completed)?;

        let challenge = if decision.is_challenge_task {
            find_challenge(tasks, facts.expertise_level, facts.language.as_deref())
        } else {
            None
        };

        let mut ranked = Vec::with_capacity(scored.len() + 1);
        if let Some(challenge_index) = challenge {
            let task = &tasks[challenge_index];
            info!(
                user_id = %facts.user_id,
                task_id = %task.id,
                level = facts.expertise_level,
                "injecting staircase challenge task"
            );
            ranked.push(ScoredTask {
                task: task.clone(),
                compatibility: self.scorer.score(user, task),
                is_challenge: true,
            });
            scored.retain(|(index, _)| *index != challenge_index);
        }
        ranked.extend(scored.into_iter().map(|(_, scored_task)| scored_task));

        debug!(
            user_id = %facts.user_id,
            candidates = tasks.len(),
            ranked = ranked.len(),
            "ranked tasks"
        );
        Ok(ranked)
    }
}

/// Index of the first task exactly one tier above `level` in `language`.
///
/// Tasks without a complexity count as tier 0; a missing language only
/// matches a user whose language is also unknown.
fn find_challenge(tasks: &[TaskDescriptor], level: u32, language: Option<&str>) -> Option<usize> {
    let target = i64::from(level) + 1;
    tasks.iter().position(|task| {
        task.complexity.unwrap_or(0) == target
            && match (task.language.as_deref(), language) {
                (Some(a), Some(b)) => languages_match(a, b),
                (None, None) => true,
                _ => false,
            }
    })
}
