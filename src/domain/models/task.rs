//! Task descriptors and the scoring vocabulary.

use serde::{Deserialize, Serialize};

use super::config::CompatibilityWeights;

/// A candidate task as offered by the task service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub id: String,
    #[serde(default, alias = "type")]
    pub task_type: Option<String>,
    #[serde(default)]
    pub complexity: Option<i64>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl TaskDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    pub fn with_complexity(mut self, complexity: i64) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Per-factor compatibility scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub language: f64,
    pub complexity: f64,
    pub category: f64,
}

impl FactorScores {
    pub fn weighted(&self, weights: &CompatibilityWeights) -> f64 {
        self.language * weights.language
            + self.complexity * weights.complexity
            + self.category * weights.category
    }
}

/// Outcome of scoring one (user, task) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub overall_score: f64,
    pub is_compatible: bool,
    pub factors: FactorScores,
}

/// A task placed in a user's ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTask {
    pub task: TaskDescriptor,
    pub compatibility: CompatibilityResult,
    /// Injected one tier above the user's level to test readiness for advancement
    pub is_challenge: bool,
}

/// Staircase evaluation for a user at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvancementDecision {
    pub should_advance: bool,
    pub confidence: f64,
    pub recommended_level: u32,
    pub is_challenge_task: bool,
}

/// Staircase decision enriched with tier progress, returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRecommendation {
    pub user_id: String,
    pub current_level: u32,
    pub tasks_completed: i64,
    pub next_threshold: Option<i64>,
    pub progress_percentage: f64,
    #[serde(flatten)]
    pub decision: AdvancementDecision,
}
