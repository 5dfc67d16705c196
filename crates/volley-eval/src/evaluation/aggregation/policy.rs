use super::super::config::{EvaluationThreshold, OutcomePolicy};
use super::super::domain::{Outcome, SkillTag};
use super::SkillScore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const TOLERANCE: f64 = 1e-9;

/// Result of checking one active threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    /// `None` when the threshold applies to the overall score.
    pub skill: Option<SkillTag>,
    pub score: Option<f64>,
    pub min_required: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCheck {
    pub passed: bool,
    pub skill_results: Vec<ThresholdResult>,
    pub suggested_outcome: Outcome,
}

pub(crate) fn check_thresholds(
    policy: &OutcomePolicy,
    skill_scores: &BTreeMap<SkillTag, SkillScore>,
    overall: Option<f64>,
    player_complete: bool,
) -> ThresholdCheck {
    let fallback;
    let mut active: Vec<&EvaluationThreshold> = policy
        .thresholds
        .iter()
        .filter(|threshold| threshold.active)
        .collect();
    if active.is_empty() {
        fallback = EvaluationThreshold::overall(policy.pass_mark);
        active.push(&fallback);
    }

    let skill_results: Vec<ThresholdResult> = active
        .into_iter()
        .map(|threshold| {
            let score = match &threshold.skill {
                Some(skill) => skill_scores.get(skill).map(|entry| entry.score),
                None => overall,
            };
            ThresholdResult {
                skill: threshold.skill.clone(),
                score,
                min_required: threshold.min_score,
                passed: score.is_some_and(|value| value + TOLERANCE >= threshold.min_score),
            }
        })
        .collect();

    let unmeasured = skill_results.iter().any(|result| result.score.is_none());
    let suggested_outcome = if unmeasured || (policy.require_complete && !player_complete) {
        Outcome::Pending
    } else if skill_results.iter().all(|result| result.passed) {
        Outcome::Passed
    } else {
        Outcome::Failed
    };

    ThresholdCheck {
        passed: suggested_outcome == Outcome::Passed,
        skill_results,
        suggested_outcome,
    }
}
