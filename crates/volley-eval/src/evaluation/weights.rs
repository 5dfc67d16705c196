use super::domain::SkillTag;
use super::metric::SkillWeight;
use serde::Serialize;

/// Evidence one metric score contributes toward one skill.
///
/// `earned` and `mass` share the metric's `0..=max_points` scale: `earned` is the
/// weighted share of the achieved score, `mass` the weighted share of what the
/// metric could have contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillContribution {
    pub skill: SkillTag,
    pub earned: f64,
    pub mass: f64,
}

impl SkillContribution {
    /// Partial 0-100 score of this skill from this metric alone.
    pub fn partial_score(&self) -> f64 {
        if self.mass > 0.0 {
            self.earned / self.mass * 100.0
        } else {
            0.0
        }
    }

    /// Contribution expressed as percentage points of the metric's full score.
    pub fn fraction_of_metric(&self, max_points: u32) -> f64 {
        self.earned / f64::from(max_points) * 100.0
    }
}

/// Spread a metric score across the skills it measures.
///
/// An empty weight list yields no contributions.
pub fn distribute(
    metric_score: f64,
    max_points: u32,
    skill_weights: &[SkillWeight],
) -> Vec<SkillContribution> {
    let max = f64::from(max_points);
    skill_weights
        .iter()
        .filter(|weight| weight.percentage > 0)
        .map(|weight| {
            let share = f64::from(weight.percentage) / 100.0;
            SkillContribution {
                skill: weight.skill.clone(),
                earned: metric_score * share,
                mass: max * share,
            }
        })
        .collect()
}
