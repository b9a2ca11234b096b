//! Expertise tier derivation from completed-task counts.

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};

/// Maps a completed-task count to a discrete tier.
///
/// With thresholds `[10, 50, 100, 250]` the tiers are 0 (< 10), 1 (10..50),
/// 2 (50..100), 3 (100..250) and 4 (>= 250).
#[derive(Debug, Clone, PartialEq)]
pub struct ExpertiseLevelCalculator {
    thresholds: Arc<[i64]>,
}

impl Default for ExpertiseLevelCalculator {
    fn default() -> Self {
        Self {
            thresholds: Arc::from([10, 50, 100, 250]),
        }
    }
}

impl ExpertiseLevelCalculator {
    /// Build a calculator, rejecting empty, negative or non-ascending thresholds.
    pub fn new(thresholds: Vec<i64>) -> DomainResult<Self> {
        validate_thresholds(&thresholds)?;
        Ok(Self {
            thresholds: Arc::from(thresholds),
        })
    }

    pub fn thresholds(&self) -> &[i64] {
        &self.thresholds
    }

    /// Highest reachable tier.
    pub fn max_level(&self) -> u32 {
        self.thresholds.len() as u32
    }

    /// Index of the first threshold above `tasks_completed`.
    pub fn level(&self, tasks_completed: i64) -> DomainResult<u32> {
        level_for(tasks_completed, &self.thresholds)
    }

    /// Completed-task count at which `level + 1` starts.
    pub fn next_threshold(&self, level: u32) -> Option<i64> {
        self.thresholds.get(level as usize).copied()
    }

    /// Progress through the current tier, in [0, 100].
    ///
    /// Tier 0 and the top tier have no bounded interval and report 0.
    pub fn progress_percentage(&self, tasks_completed: i64, level: u32) -> f64 {
        let level = level as usize;
        if level == 0 || level >= self.thresholds.len() {
            return 0.0;
        }
        let lower = self.thresholds[level - 1];
        let upper = self.thresholds[level];
        let pct = (tasks_completed - lower) as f64 / (upper - lower) as f64 * 100.0;
        pct.clamp(0.0, 100.0)
    }
}

/// Tier for `tasks_completed` under `thresholds`.
pub fn level_for(tasks_completed: i64, thresholds: &[i64]) -> DomainResult<u32> {
    if tasks_completed < 0 {
        return Err(DomainError::InvalidArgument(format!(
            "tasks_completed must be non-negative, got {tasks_completed}"
        )));
    }
    let level = thresholds
        .iter()
        .position(|threshold| tasks_completed < *threshold)
        .unwrap_or(thresholds.len());
    Ok(level as u32)
}

pub fn validate_thresholds(thresholds: &[i64]) -> DomainResult<()> {
    if thresholds.is_empty() {
        return Err(DomainError::InvalidArgument(
            "level thresholds cannot be empty".to_string(),
        ));
    }
    if thresholds[0] < 0 {
        return Err(DomainError::InvalidArgument(format!(
            "level thresholds must be non-negative, got {}",
            thresholds[0]
        )));
    }
    if let Some(pair) = thresholds.windows(2).find(|w| w[0] >= w[1]) {
        return Err(DomainError::InvalidArgument(format!(
            "level thresholds must be strictly ascending ({} >= {})",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> ExpertiseLevelCalculator {
        ExpertiseLevelCalculator::new(vec![10, 50, 100, 250]).unwrap()
    }

    #[test]
    fn test_level_examples() {
        let calc = calc();
        assert_eq!(calc.level(0).unwrap(), 0);
        assert_eq!(calc.level(9).unwrap(), 0);
        assert_eq!(calc.level(10).unwrap(), 1);
        assert_eq!(calc.level(55).unwrap(), 2);
        assert_eq!(calc.level(249).unwrap(), 3);
        assert_eq!(calc.level(250).unwrap(), 4);
        assert_eq!(calc.level(10_000).unwrap(), 4);
    }

    #[test]
    fn test_level_at_threshold_boundaries() {
        let calc = calc();
        for (i, t) in calc.thresholds().iter().enumerate() {
            assert_eq!(calc.level(t - 1).unwrap(), i as u32);
            assert_eq!(calc.level(*t).unwrap(), i as u32 + 1);
        }
    }

    #[test]
    fn test_level_is_monotonic() {
        let calc = ExpertiseLevelCalculator::new(vec![1, 3, 7, 20, 21]).unwrap();
        let mut previous = 0;
        for n in 0..50 {
            let level = calc.level(n).unwrap();
            assert!(level >= previous, "level dropped at {n}");
            previous = level;
        }
        assert_eq!(previous, calc.max_level());
    }

    #[test]
    fn test_negative_tasks_rejected() {
        let err = calc().level(-1).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        assert!(ExpertiseLevelCalculator::new(vec![]).is_err());
        assert!(ExpertiseLevelCalculator::new(vec![10, 10]).is_err());
        assert!(ExpertiseLevelCalculator::new(vec![50, 10]).is_err());
        assert!(ExpertiseLevelCalculator::new(vec![-5, 10]).is_err());
    }

    #[test]
    fn test_next_threshold() {
        let calc = calc();
        assert_eq!(calc.next_threshold(0), Some(10));
        assert_eq!(calc.next_threshold(2), Some(100));
        assert_eq!(calc.next_threshold(4), None);
    }

    #[test]
    fn test_progress_percentage() {
        let calc = calc();
        let level = calc.level(55).unwrap();
        assert_eq!(level, 2);
        assert!((calc.progress_percentage(55, level) - 10.0).abs() < 1e-9);
        assert!((calc.progress_percentage(75, 2) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_percentage_unbounded_tiers() {
        let calc = calc();
        assert_eq!(calc.progress_percentage(5, 0), 0.0);
        assert_eq!(calc.progress_percentage(400, 4), 0.0);
    }

    #[test]
    fn test_progress_percentage_clamped() {
        let calc = calc();
        // Level supplied out of step with the count
        assert_eq!(calc.progress_percentage(500, 1), 100.0);
        assert_eq!(calc.progress_percentage(0, 2), 0.0);
    }
}
