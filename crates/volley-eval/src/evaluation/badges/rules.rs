use super::super::aggregation::PlayerAggregate;
use super::super::config::SkillMatrix;
use super::super::domain::{CategoryName, Outcome, SkillTag};
use super::catalog::BadgeType;
use super::EvaluationRecord;
use serde::{Deserialize, Serialize};

const TOLERANCE: f64 = 1e-9;

/// Side-effect-free condition over an aggregate and the player's earlier evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgePredicate {
    /// The aggregate carries a decided outcome.
    FirstEvaluationCompleted,
    OutcomeIs(Outcome),
    OverallAtLeast(f64),
    SkillAtLeast { skill: SkillTag, min: f64 },
    AnySkillAtLeast(f64),
    CategoryAtLeast { category: CategoryName, min: f64 },
    /// Highest skill level reaches the named level of the skill matrix.
    LevelReached(String),
    /// Overall score rose by at least this much over the latest history entry.
    ImprovedBy(f64),
    /// The current and the previous `evaluations - 1` overall scores are all at least `min`.
    ConsistentlyAbove { min: f64, evaluations: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeRule {
    pub badge_type: BadgeType,
    pub predicate: BadgePredicate,
}

impl BadgeRule {
    pub fn new(badge_type: BadgeType, predicate: BadgePredicate) -> Self {
        Self {
            badge_type,
            predicate,
        }
    }
}

pub(crate) struct RuleContext<'a> {
    pub aggregate: &'a PlayerAggregate,
    /// Earlier evaluations, most recent first.
    pub history: &'a [&'a EvaluationRecord],
    pub matrix: Option<&'a SkillMatrix>,
}

fn at_least(score: Option<f64>, min: f64) -> bool {
    score.is_some_and(|value| value + TOLERANCE >= min)
}

impl BadgePredicate {
    pub(crate) fn holds(&self, ctx: &RuleContext<'_>) -> bool {
        let aggregate = ctx.aggregate;
        match self {
            Self::FirstEvaluationCompleted => {
                matches!(aggregate.outcome, Some(Outcome::Passed | Outcome::Failed))
            }
            Self::OutcomeIs(outcome) => aggregate.outcome == Some(*outcome),
            Self::OverallAtLeast(min) => at_least(aggregate.overall, *min),
            Self::SkillAtLeast { skill, min } => at_least(
                aggregate.skill_scores.get(skill).map(|entry| entry.score),
                *min,
            ),
            Self::AnySkillAtLeast(min) => aggregate
                .skill_scores
                .values()
                .any(|entry| at_least(Some(entry.score), *min)),
            Self::CategoryAtLeast { category, min } => at_least(
                aggregate
                    .category_scores
                    .get(category)
                    .map(|entry| entry.score),
                *min,
            ),
            Self::LevelReached(label) => {
                let required = ctx.matrix.and_then(|matrix| matrix.level_index(label));
                match (required, &aggregate.highest_level) {
                    (Some(required), Some(reached)) => reached.index >= required,
                    _ => false,
                }
            }
            Self::ImprovedBy(delta) => {
                let previous = ctx.history.iter().find_map(|entry| entry.overall);
                match (aggregate.overall, previous) {
                    (Some(current), Some(previous)) => current - previous + TOLERANCE >= *delta,
                    _ => false,
                }
            }
            Self::ConsistentlyAbove { min, evaluations } => {
                if *evaluations == 0 || !at_least(aggregate.overall, *min) {
                    return false;
                }
                let earlier = evaluations - 1;
                ctx.history.len() >= earlier
                    && ctx.history[..earlier]
                        .iter()
                        .all(|entry| at_least(entry.overall, *min))
            }
        }
    }
}
