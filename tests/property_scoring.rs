use hotlabel_users::domain::models::{
    CompatibilityWeights, StatisticsOwner, TaskDescriptor, UserFacts, UserKind, UserSnapshot,
    UserStatistics,
};
use hotlabel_users::services::{
    challenge_interval, CompatibilityScorer, ExpertiseLevelCalculator, StaircasePolicy, TaskRanker,
};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

fn arb_language() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("en".to_string())),
        Just(Some("EN".to_string())),
        Just(Some("es".to_string())),
        Just(Some("de".to_string())),
    ]
}

fn arb_task() -> impl Strategy<Value = TaskDescriptor> {
    (
        "[a-z]{4}",
        proptest::option::of(0i64..8),
        arb_language(),
        proptest::option::of(prop_oneof![Just("science"), Just("finance"), Just("art")]),
    )
        .prop_map(|(id, complexity, language, category)| TaskDescriptor {
            id,
            task_type: None,
            complexity,
            language,
            category: category.map(str::to_string),
        })
}

fn snapshot(tasks_completed: i64, language: Option<String>, areas: bool) -> UserSnapshot {
    let levels = ExpertiseLevelCalculator::default();
    let mut facts = UserFacts::new("sess_00000000", UserKind::Session)
        .with_progress(tasks_completed, levels.level(tasks_completed).unwrap_or(0));
    facts.language = language;
    let mut snapshot = UserSnapshot::new(facts);
    if areas {
        snapshot.facts.expertise_area_ids = vec!["exp_00000000".to_string()];
        snapshot.area_names = vec!["Science".to_string()];
    }
    snapshot
}

proptest! {
    /// Property: tiers never decrease as completed tasks grow
    #[test]
    fn prop_level_is_monotonic(a in 0i64..1000, b in 0i64..1000) {
        let levels = ExpertiseLevelCalculator::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low_level = levels.level(low).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let high_level = levels.level(high).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(low_level <= high_level);
        prop_assert!(high_level <= levels.max_level());
    }

    /// Property: every factor and the overall score stay within [0, 1]
    #[test]
    fn prop_scores_are_bounded(
        tasks_completed in 0i64..400,
        language in arb_language(),
        areas in any::<bool>(),
        task in arb_task(),
    ) {
        let user = snapshot(tasks_completed, language, areas);
        for weights in [CompatibilityWeights::GENERAL, CompatibilityWeights::STAIRCASE] {
            let scorer = CompatibilityScorer::new(weights, 0.5)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let result = scorer.score(&user, &task);
            for value in [
                result.overall_score,
                result.factors.language,
                result.factors.complexity,
                result.factors.category,
            ] {
                prop_assert!((0.0..=1.0).contains(&value));
            }
            prop_assert_eq!(result.is_compatible, result.overall_score >= 0.5);
        }
    }

    /// Property: ranked lists are sorted after an optional leading challenge
    #[test]
    fn prop_ranking_is_sorted(
        tasks_completed in 0i64..400,
        language in arb_language(),
        tasks in proptest::collection::vec(arb_task(), 0..25),
    ) {
        let ranker = TaskRanker::default();
        let user = snapshot(tasks_completed, language, false);
        let ranked = ranker.rank(&user, &tasks).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let rest = match ranked.first() {
            Some(first) if first.is_challenge => &ranked[1..],
            _ => &ranked[..],
        };
        prop_assert!(rest.iter().all(|s| !s.is_challenge && s.compatibility.is_compatible));
        prop_assert!(rest
            .windows(2)
            .all(|w| w[0].compatibility.overall_score >= w[1].compatibility.overall_score));
        prop_assert!(ranked.len() <= tasks.len());
    }

    /// Property: the staircase never recommends skipping a tier
    #[test]
    fn prop_recommendation_within_one_tier(
        tasks_completed in 0i64..400,
        success in 0.0f64..=1.0,
        with_stats in any::<bool>(),
    ) {
        let levels = ExpertiseLevelCalculator::default();
        let policy = StaircasePolicy::new(levels.clone());
        let level = levels.level(tasks_completed).map_err(|e| TestCaseError::fail(e.to_string()))?;

        let mut stats = UserStatistics::new(StatisticsOwner::Session("sess_00000000".to_string()));
        stats.total_tasks_attempted = tasks_completed;
        stats.total_tasks_completed = tasks_completed;
        stats.completion_rate = if tasks_completed > 0 { 1.0 } else { 0.0 };
        stats.success_rate = success;

        let decision = policy
            .evaluate(with_stats.then_some(&stats), level, tasks_completed)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert!(decision.recommended_level == level || decision.recommended_level == level + 1);
        prop_assert!(!(decision.should_advance && decision.is_challenge_task));
        prop_assert!((0.0..=1.0).contains(&decision.confidence));
        if level == levels.max_level() {
            prop_assert!(!decision.should_advance && !decision.is_challenge_task);
        }
        if decision.is_challenge_task {
            prop_assert_eq!(tasks_completed % challenge_interval(level), 0);
        }
    }
}
