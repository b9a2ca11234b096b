//! Staircase expertise-advancement policy.
//!
//! Decides whether a user is ready for the next tier and, when they are not,
//! whether the current pick should be a one-off challenge task from the tier
//! above. Decisions depend only on their inputs.

use tracing::debug;

use super::expertise_level::ExpertiseLevelCalculator;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AdvancementDecision, UserStatistics};

/// Confidence bonuses, in tenths so the sums stay exact.
const SUCCESS_RATE_BONUS: u8 = 5;
const COMPLETION_RATE_BONUS: u8 = 3;
const QUALITY_BONUS: u8 = 2;
const ADVANCE_CONFIDENCE: u8 = 7;

const SUCCESS_RATE_BAR: f64 = 0.8;
const COMPLETION_RATE_BAR: f64 = 0.9;
const QUALITY_BAR: f64 = 0.8;

const MIN_CHALLENGE_INTERVAL: i64 = 3;
const BASE_CHALLENGE_INTERVAL: i64 = 10;

/// Every `challenge_interval(level)` completed tasks the user gets a challenge.
pub fn challenge_interval(current_level: u32) -> i64 {
    (BASE_CHALLENGE_INTERVAL - i64::from(current_level)).max(MIN_CHALLENGE_INTERVAL)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaircasePolicy {
    levels: ExpertiseLevelCalculator,
}

impl StaircasePolicy {
    pub fn new(levels: ExpertiseLevelCalculator) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> &ExpertiseLevelCalculator {
        &self.levels
    }

    /// Evaluate advancement for a user.
    ///
    /// Missing statistics fall back to comparing `tasks_completed` with the
    /// threshold of the next tier. Users at the top tier never advance or
    /// receive challenges.
    pub fn evaluate(
        &self,
        stats: Option<&UserStatistics>,
        current_level: u32,
        tasks_completed: i64,
    ) -> DomainResult<AdvancementDecision> {
        if tasks_completed < 0 {
            return Err(DomainError::InvalidArgument(format!(
                "tasks_completed must be non-negative, got {tasks_completed}"
            )));
        }
        let max_level = self.levels.max_level();
        if current_level > max_level {
            return Err(DomainError::InvalidArgument(format!(
                "current_level {current_level} exceeds the top tier {max_level}"
            )));
        }
        let next_threshold = self.levels.next_threshold(current_level);

        let (tenths, ready) = match stats {
            Some(stats) => {
                stats.validate()?;
                let tenths = confidence_tenths(stats);
                (tenths, tenths >= ADVANCE_CONFIDENCE)
            }
            None => (0, next_threshold.is_some_and(|t| tasks_completed >= t)),
        };
        let has_next_tier = next_threshold.is_some();
        let should_advance = ready && has_next_tier;

        let mut recommended_level = if should_advance {
            current_level + 1
        } else {
            current_level
        };

        let mut is_challenge_task = false;
        if !should_advance && has_next_tier && tasks_completed > 0 {
            is_challenge_task = tasks_completed % challenge_interval(current_level) == 0;
            if is_challenge_task {
                recommended_level = current_level + 1;
            }
        }

        let decision = AdvancementDecision {
            should_advance,
            confidence: f64::from(tenths) / 10.0,
            recommended_level,
            is_challenge_task,
        };
        debug!(
            current_level,
            tasks_completed,
            has_statistics = stats.is_some(),
            should_advance,
            is_challenge_task,
            recommended_level,
            "evaluated staircase advancement"
        );
        Ok(decision)
    }
}

fn confidence_tenths(stats: &UserStatistics) -> u8 {
    let mut tenths = 0;
    if stats.success_rate >= SUCCESS_RATE_BAR {
        tenths += SUCCESS_RATE_BONUS;
    }
    if stats.completion_rate >= COMPLETION_RATE_BAR {
        tenths += COMPLETION_RATE_BONUS;
    }
    if stats.average_quality_score >= QUALITY_BAR {
        tenths += QUALITY_BONUS;
    }
    tenths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::StatisticsOwner;

    fn policy() -> StaircasePolicy {
        StaircasePolicy::new(ExpertiseLevelCalculator::new(vec![10, 50, 100, 250]).unwrap())
    }

    fn stats(success: f64, completion: f64, quality: f64) -> UserStatistics {
        let mut s = UserStatistics::new(StatisticsOwner::Session("sess_1".into()));
        s.total_tasks_attempted = 100;
        s.total_tasks_completed = (completion * 100.0).round() as i64;
        s.success_rate = success;
        s.completion_rate = completion;
        s.average_quality_score = quality;
        s
    }

    #[test]
    fn test_challenge_interval() {
        assert_eq!(challenge_interval(0), 10);
        assert_eq!(challenge_interval(2), 8);
        assert_eq!(challenge_interval(7), 3);
        assert_eq!(challenge_interval(30), 3);
    }

    #[test]
    fn test_full_confidence_advances() {
        let d = policy()
            .evaluate(Some(&stats(0.85, 0.95, 0.85)), 2, 60)
            .unwrap();
        assert_eq!(d.confidence, 1.0);
        assert!(d.should_advance);
        assert_eq!(d.recommended_level, 3);
        assert!(!d.is_challenge_task);
    }

    #[test]
    fn test_confidence_is_additive() {
        let p = policy();
        assert_eq!(p.evaluate(Some(&stats(0.9, 0.5, 0.5)), 1, 11).unwrap().confidence, 0.5);
        assert_eq!(p.evaluate(Some(&stats(0.5, 0.95, 0.5)), 1, 11).unwrap().confidence, 0.3);
        assert_eq!(p.evaluate(Some(&stats(0.5, 0.5, 0.9)), 1, 11).unwrap().confidence, 0.2);
        assert_eq!(p.evaluate(Some(&stats(0.9, 0.95, 0.5)), 1, 11).unwrap().confidence, 0.8);
    }

    #[test]
    fn test_advance_boundary_at_point_seven() {
        let p = policy();
        // success + quality = 0.7
        let d = p.evaluate(Some(&stats(0.8, 0.5, 0.8)), 1, 11).unwrap();
        assert_eq!(d.confidence, 0.7);
        assert!(d.should_advance);

        // completion + quality = 0.5
        let d = p.evaluate(Some(&stats(0.5, 0.9, 0.8)), 1, 11).unwrap();
        assert!(!d.should_advance);
    }

    #[test]
    fn test_challenge_injection_on_interval() {
        let p = policy();
        let weak = stats(0.1, 0.5, 0.1);

        let d = p.evaluate(Some(&weak), 2, 16).unwrap();
        assert!(d.is_challenge_task);
        assert!(!d.should_advance);
        assert_eq!(d.recommended_level, 3);

        let d = p.evaluate(Some(&weak), 2, 17).unwrap();
        assert!(!d.is_challenge_task);
        assert_eq!(d.recommended_level, 2);
    }

    #[test]
    fn test_no_challenge_without_completed_tasks() {
        let d = policy().evaluate(None, 0, 0).unwrap();
        assert!(!d.is_challenge_task);
        assert!(!d.should_advance);
        assert_eq!(d.recommended_level, 0);
    }

    #[test]
    fn test_no_challenge_when_advancing() {
        // 16 is on the interval for level 2 but the user advances instead
        let d = policy()
            .evaluate(Some(&stats(0.9, 0.95, 0.9)), 2, 16)
            .unwrap();
        assert!(d.should_advance);
        assert!(!d.is_challenge_task);
    }

    #[test]
    fn test_fallback_without_statistics() {
        let p = policy();
        let d = p.evaluate(None, 1, 50).unwrap();
        assert!(d.should_advance);
        assert_eq!(d.recommended_level, 2);
        assert_eq!(d.confidence, 0.0);

        let d = p.evaluate(None, 1, 49).unwrap();
        assert!(!d.should_advance);
    }

    #[test]
    fn test_top_tier_never_advances() {
        let p = policy();
        let d = p.evaluate(Some(&stats(1.0, 1.0, 1.0)), 4, 300).unwrap();
        assert!(!d.should_advance);
        assert!(!d.is_challenge_task);
        assert_eq!(d.recommended_level, 4);
        assert_eq!(d.confidence, 1.0);
    }

    #[test]
    fn test_out_of_range_level_rejected() {
        let err = policy().evaluate(None, 5, 10).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[test]
    fn test_negative_tasks_rejected() {
        assert!(policy().evaluate(None, 0, -3).is_err());
    }

    #[test]
    fn test_corrupt_statistics_rejected() {
        let mut s = stats(0.9, 0.9, 0.9);
        s.total_tasks_completed = s.total_tasks_attempted + 1;
        let err = policy().evaluate(Some(&s), 1, 20).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let p = policy();
        let s = stats(0.7, 0.95, 0.85);
        let first = p.evaluate(Some(&s), 1, 27).unwrap();
        for _ in 0..5 {
            assert_eq!(p.evaluate(Some(&s), 1, 27).unwrap(), first);
        }
    }
}
