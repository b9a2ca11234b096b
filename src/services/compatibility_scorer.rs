//! Weighted task compatibility scoring.
//!
//! Every factor returns a value in [0, 1] and a task attribute that is absent
//! always scores 1.0. The overall score is the weighted sum of the three
//! factors and a task is compatible when it reaches the configured threshold.

use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CompatibilityConfig, CompatibilityResult, CompatibilityWeights, FactorScores, TaskDescriptor,
    UserSnapshot, UserStatistics, DEFAULT_COMPATIBILITY_THRESHOLD,
};

/// Language factor when the task language matches the user's.
pub const LANGUAGE_MATCH: f64 = 1.0;
/// Language factor when the user's language is unknown.
pub const LANGUAGE_UNKNOWN: f64 = 0.5;
/// Language factor on a mismatch.
pub const LANGUAGE_MISMATCH: f64 = 0.3;

/// Category factor when one of the user's areas names the category.
pub const CATEGORY_AREA_MATCH: f64 = 1.0;
/// Category factor when the user has areas but none name the category.
pub const CATEGORY_AREA_MISMATCH: f64 = 0.7;
/// Category factor when the user has prior tasks of that type.
pub const CATEGORY_HISTORY_MATCH: f64 = 0.9;
/// Category factor when nothing is known.
pub const CATEGORY_DEFAULT: f64 = 0.5;

/// Case-insensitive language tag equality.
pub fn languages_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Scores (user, task) pairs. Pure and cheap to clone.
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibilityScorer {
    weights: CompatibilityWeights,
    threshold: f64,
}

impl Default for CompatibilityScorer {
    fn default() -> Self {
        Self {
            weights: CompatibilityWeights::GENERAL,
            threshold: DEFAULT_COMPATIBILITY_THRESHOLD,
        }
    }
}

impl CompatibilityScorer {
    pub fn new(weights: CompatibilityWeights, threshold: f64) -> DomainResult<Self> {
        validate_weights(&weights)?;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(DomainError::InvalidArgument(format!(
                "compatibility threshold must be within [0, 1], got {threshold}"
            )));
        }
        Ok(Self { weights, threshold })
    }

    pub fn from_config(config: &CompatibilityConfig) -> DomainResult<Self> {
        Self::new(config.weights, config.threshold)
    }

    pub fn weights(&self) -> &CompatibilityWeights {
        &self.weights
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether an overall score clears the threshold (inclusive).
    pub fn is_compatible(&self, overall_score: f64) -> bool {
        overall_score >= self.threshold
    }

    pub fn score(&self, user: &UserSnapshot, task: &TaskDescriptor) -> CompatibilityResult {
        let factors = FactorScores {
            language: language_factor(user.facts.language.as_deref(), task.language.as_deref()),
            complexity: complexity_factor(user.facts.expertise_level, task.complexity),
            category: category_factor(
                task.category.as_deref(),
                !user.facts.expertise_area_ids.is_empty(),
                &user.area_names,
                user.statistics.as_ref(),
            ),
        };
        let overall_score = factors.weighted(&self.weights);

        debug!(
            user_id = %user.facts.user_id,
            task_id = %task.id,
            language = factors.language,
            complexity = factors.complexity,
            category = factors.category,
            overall_score,
            "scored task compatibility"
        );

        CompatibilityResult {
            overall_score,
            is_compatible: self.is_compatible(overall_score),
            factors,
        }
    }
}

pub fn validate_weights(weights: &CompatibilityWeights) -> DomainResult<()> {
    for (name, value) in [
        ("language", weights.language),
        ("complexity", weights.complexity),
        ("category", weights.category),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(DomainError::InvalidArgument(format!(
                "{name} weight must be within [0, 1], got {value}"
            )));
        }
    }
    if (weights.total() - 1.0).abs() > 1e-9 {
        return Err(DomainError::InvalidArgument(format!(
            "compatibility weights must sum to 1.0, got {}",
            weights.total()
        )));
    }
    Ok(())
}

pub fn language_factor(user_language: Option<&str>, task_language: Option<&str>) -> f64 {
    let Some(task_language) = task_language else {
        return LANGUAGE_MATCH;
    };
    match user_language {
        None => LANGUAGE_UNKNOWN,
        Some(user_language) if languages_match(user_language, task_language) => LANGUAGE_MATCH,
        Some(_) => LANGUAGE_MISMATCH,
    }
}

/// Staircase curve: a discrete step function of the tier gap.
pub fn complexity_factor(expertise_level: u32, task_complexity: Option<i64>) -> f64 {
    let Some(complexity) = task_complexity else {
        return 1.0;
    };
    let level = i64::from(expertise_level);
    if complexity == level {
        1.0
    } else if complexity < level {
        0.8
    } else if complexity == level + 1 {
        0.6
    } else if complexity == level + 2 {
        0.3
    } else {
        0.1
    }
}

/// Category factor.
///
/// `has_areas` reflects the user's area ids, while `area_names` only holds the
/// ones that resolved, so a user whose areas were all deleted still scores as
/// "has areas, no match".
pub fn category_factor(
    task_category: Option<&str>,
    has_areas: bool,
    area_names: &[String],
    statistics: Option<&UserStatistics>,
) -> f64 {
    let Some(category) = task_category else {
        return 1.0;
    };

    if has_areas {
        let needle = category.to_lowercase();
        return if area_names
            .iter()
            .any(|name| name.to_lowercase().contains(&needle))
        {
            CATEGORY_AREA_MATCH
        } else {
            CATEGORY_AREA_MISMATCH
        };
    }

    if statistics.is_some_and(|stats| stats.has_completed_type(category)) {
        return CATEGORY_HISTORY_MATCH;
    }

    CATEGORY_DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{StatisticsOwner, UserFacts, UserKind};

    fn user(language: Option<&str>, level: u32) -> UserSnapshot {
        let mut facts = UserFacts::new("sess_1", UserKind::Session).with_progress(0, level);
        facts.language = language.map(str::to_string);
        UserSnapshot::new(facts)
    }

    #[test]
    fn test_language_factor() {
        assert_eq!(language_factor(Some("en"), None), 1.0);
        assert_eq!(language_factor(None, None), 1.0);
        assert_eq!(language_factor(None, Some("en")), 0.5);
        assert_eq!(language_factor(Some("en"), Some("en")), 1.0);
        assert_eq!(language_factor(Some("fr-FR"), Some("fr-fr")), 1.0);
        assert_eq!(language_factor(Some("en"), Some("fr")), 0.3);
    }

    #[test]
    fn test_complexity_breakpoints() {
        let level = 2;
        assert_eq!(complexity_factor(level, Some(2)), 1.0);
        assert_eq!(complexity_factor(level, Some(1)), 0.8);
        assert_eq!(complexity_factor(level, Some(0)), 0.8);
        assert_eq!(complexity_factor(level, Some(3)), 0.6);
        assert_eq!(complexity_factor(level, Some(4)), 0.3);
        assert_eq!(complexity_factor(level, Some(5)), 0.1);
        assert_eq!(complexity_factor(level, Some(40)), 0.1);
        assert_eq!(complexity_factor(level, None), 1.0);
    }

    #[test]
    fn test_complexity_level_zero() {
        assert_eq!(complexity_factor(0, Some(-1)), 0.8);
        assert_eq!(complexity_factor(0, Some(0)), 1.0);
        assert_eq!(complexity_factor(0, Some(1)), 0.6);
    }

    #[test]
    fn test_category_substring_match() {
        let names = vec!["Machine Learning".to_string()];
        assert_eq!(category_factor(Some("machine"), true, &names, None), 1.0);
        assert_eq!(category_factor(Some("LEARNING"), true, &names, None), 1.0);
        assert_eq!(category_factor(Some("finance"), true, &names, None), 0.7);
        assert_eq!(category_factor(None, true, &names, None), 1.0);
    }

    #[test]
    fn test_category_unresolved_areas_degrade_to_mismatch() {
        assert_eq!(category_factor(Some("machine"), true, &[], None), 0.7);
    }

    #[test]
    fn test_category_history_and_default() {
        let mut stats = UserStatistics::new(StatisticsOwner::Session("sess_1".into()));
        stats.task_type_distribution.insert("sentiment".into(), 3);

        assert_eq!(category_factor(Some("sentiment"), false, &[], Some(&stats)), 0.9);
        assert_eq!(category_factor(Some("ner"), false, &[], Some(&stats)), 0.5);
        assert_eq!(category_factor(Some("ner"), false, &[], None), 0.5);
    }

    #[test]
    fn test_areas_take_precedence_over_history() {
        let mut stats = UserStatistics::new(StatisticsOwner::Profile("prof_1".into()));
        stats.task_type_distribution.insert("sentiment".into(), 3);
        let names = vec!["Finance".to_string()];

        assert_eq!(category_factor(Some("sentiment"), true, &names, Some(&stats)), 0.7);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let scorer = CompatibilityScorer::default();
        assert!(scorer.is_compatible(0.5));
        assert!(!scorer.is_compatible(0.4999));
        assert!(scorer.is_compatible(1.0));
    }

    #[test]
    fn test_score_perfect_match() {
        let scorer = CompatibilityScorer::default();
        let task = TaskDescriptor::new("t1").with_language("en").with_complexity(1);
        let result = scorer.score(&user(Some("en"), 1), &task);

        assert!((result.overall_score - 1.0).abs() < 1e-12);
        assert!(result.is_compatible);
    }

    #[test]
    fn test_score_uses_general_weights() {
        let scorer = CompatibilityScorer::default();
        let task = TaskDescriptor::new("t1")
            .with_language("fr")
            .with_complexity(4)
            .with_category("ner");
        let result = scorer.score(&user(Some("en"), 1), &task);

        // 0.4 * 0.3 + 0.4 * 0.1 + 0.2 * 0.5
        assert!((result.overall_score - 0.26).abs() < 1e-9);
        assert!(!result.is_compatible);
        assert_eq!(result.factors.complexity, 0.1);
    }

    #[test]
    fn test_score_with_staircase_weights() {
        let scorer = CompatibilityScorer::new(CompatibilityWeights::STAIRCASE, 0.5).unwrap();
        let task = TaskDescriptor::new("t1").with_language("fr").with_complexity(1);
        let result = scorer.score(&user(Some("en"), 1), &task);

        // 0.5 * 0.3 + 0.3 * 1.0 + 0.2 * 1.0
        assert!((result.overall_score - 0.65).abs() < 1e-9);
        assert!(result.is_compatible);
    }

    #[test]
    fn test_score_at_exact_threshold_is_compatible() {
        let weights = CompatibilityWeights {
            language: 1.0,
            complexity: 0.0,
            category: 0.0,
        };
        let scorer = CompatibilityScorer::new(weights, 0.5).unwrap();
        let task = TaskDescriptor::new("t1").with_language("en");
        let result = scorer.score(&user(None, 0), &task);

        assert_eq!(result.overall_score, 0.5);
        assert!(result.is_compatible);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let weights = CompatibilityWeights {
            language: 0.5,
            complexity: 0.5,
            category: 0.5,
        };
        assert!(CompatibilityScorer::new(weights, 0.5).is_err());
        assert!(CompatibilityScorer::new(CompatibilityWeights::GENERAL, 1.5).is_err());
    }
}
