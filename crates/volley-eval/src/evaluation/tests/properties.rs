use super::common::*;
use crate::evaluation::aggregation::AggregationEngine;
use crate::evaluation::domain::PlayerId;
use crate::evaluation::metric::{normalize, step, MetricKind, RawInput, SkillWeight};
use crate::evaluation::plan::Exercise;
use crate::evaluation::session::MetricEntry;
use crate::evaluation::weights::distribute;
use proptest::prelude::*;

fn arb_kind() -> impl Strategy<Value = MetricKind> {
    prop_oneof![
        Just(MetricKind::Checkbox),
        Just(MetricKind::Slider),
        Just(MetricKind::Number),
        Just(MetricKind::Ratio),
    ]
}

fn arb_raw() -> impl Strategy<Value = RawInput> {
    prop_oneof![
        any::<bool>().prop_map(RawInput::Flag),
        any::<i64>().prop_map(RawInput::Count),
    ]
}

prop_compose! {
    fn arb_weights()(first in 0u8..=100)(
        first in Just(first),
        second in 0u8..=(100 - first)
    ) -> Vec<SkillWeight> {
        vec![
            SkillWeight::new("Power", first),
            SkillWeight::new("Serving", second),
            SkillWeight::new("Control", 100 - first - second),
        ]
    }
}

fn entries_from(exercise: &Exercise, raw: &[i64]) -> Vec<MetricEntry> {
    exercise
        .metrics()
        .iter()
        .zip(raw.iter().cycle())
        .map(|(metric, value)| {
            let value = match metric.kind() {
                MetricKind::Checkbox => value.rem_euclid(2) as f64,
                _ => *value as f64,
            };
            entry(metric.id().as_str(), value)
        })
        .collect()
}

proptest! {
    #[test]
    fn normalized_scores_stay_in_range(
        kind in arb_kind(),
        max_points in 1u32..1_000,
        raw in arb_raw()
    ) {
        let score = normalize(kind, max_points, raw);
        prop_assert!(score >= 0.0);
        prop_assert!(score <= f64::from(max_points));
    }

    #[test]
    fn stepping_never_leaves_range(
        max_points in 1u32..1_000,
        current in 0u32..1_000,
        delta in any::<i64>()
    ) {
        let current = current.min(max_points);
        prop_assert!(step(current, delta, max_points) <= max_points);
    }

    #[test]
    fn distribution_conserves_the_metric_fraction(
        weights in arb_weights(),
        max_points in 1u32..100,
        earned in 0u32..100
    ) {
        let earned = earned.min(max_points);
        let contributions = distribute(f64::from(earned), max_points, &weights);

        let total: f64 = contributions
            .iter()
            .map(|contribution| contribution.fraction_of_metric(max_points))
            .sum();
        let expected = f64::from(earned) / f64::from(max_points) * 100.0;
        prop_assert!((total - expected).abs() < 1e-6);
        prop_assert!(contributions.iter().all(|contribution| contribution.mass > 0.0));
    }

    #[test]
    fn aggregated_scores_stay_between_zero_and_one_hundred(
        raw in proptest::collection::vec(-20i64..40, 1..8)
    ) {
        let mut session = running_session();
        let exercises: Vec<Exercise> = session.plan().exercises().cloned().collect();
        for exercise in &exercises {
            session
                .submit(&PlayerId::new(ANA), exercise.id(), &entries_from(exercise, &raw), ts(10))
                .expect("whole values are accepted");
        }

        let aggregate = AggregationEngine::new(scoring_config())
            .aggregate(session.plan(), session.sheet(), &PlayerId::new(ANA));

        for skill in aggregate.skill_scores.values() {
            prop_assert!((0.0..=100.0).contains(&skill.score));
        }
        for category in aggregate.category_scores.values() {
            prop_assert!((0.0..=100.0).contains(&category.score));
        }
        let overall = aggregate.overall.expect("measured");
        prop_assert!((0.0..=100.0).contains(&overall));
        prop_assert!(aggregate.complete);
    }
}
