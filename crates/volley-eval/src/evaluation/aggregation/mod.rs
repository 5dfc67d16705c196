mod policy;
mod rules;
mod summary;

pub use policy::{ThresholdCheck, ThresholdResult};
pub use summary::{EvaluationSummary, PlayerSummaryEntry};

use super::config::{LevelReached, ScoringConfig};
use super::domain::{CategoryName, ExerciseId, Outcome, PlanId, PlayerId, SkillTag};
use super::plan::EvaluationPlan;
use super::session::{is_pair_complete, is_player_complete, ScoreSheet};
use policy::check_thresholds;
use rules::{tally_player, tally_skills, Tally};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stateless reducer turning a player's score records into skill, category and overall scores.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    config: ScoringConfig,
}

impl AggregationEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn aggregate(
        &self,
        plan: &EvaluationPlan,
        sheet: &ScoreSheet,
        player_id: &PlayerId,
    ) -> PlayerAggregate {
        let tallies = tally_player(plan, sheet.records_for_player(player_id));
        if tallies.records == 0 {
            return PlayerAggregate::empty(plan.id().clone(), player_id.clone());
        }

        let skill_scores: BTreeMap<SkillTag, SkillScore> = tallies
            .skills
            .iter()
            .filter_map(|(skill, tally)| {
                let score = tally.score()?;
                let level = self
                    .config
                    .skill_matrix
                    .as_ref()
                    .and_then(|matrix| matrix.level_for(skill, score));
                Some((
                    skill.clone(),
                    SkillScore {
                        skill: skill.clone(),
                        earned_points: tally.earned,
                        max_points: tally.mass,
                        score,
                        level,
                    },
                ))
            })
            .collect();

        let category_scores = self
            .config
            .categories
            .iter()
            .filter_map(|category| {
                let tally = tally_skills(&category.skills, &tallies.skills);
                let score = tally.score()?;
                Some((
                    category.name.clone(),
                    CategoryScore {
                        category: category.name.clone(),
                        earned_points: tally.earned,
                        max_points: tally.mass,
                        score,
                    },
                ))
            })
            .collect();

        let exercise_totals = plan
            .exercises()
            .filter_map(|exercise| {
                let tally: &Tally = tallies.exercises.get(exercise.id())?;
                Some(ExerciseTotal {
                    exercise_id: exercise.id().clone(),
                    earned_points: tally.earned,
                    max_points: exercise.max_total(),
                    complete: is_pair_complete(sheet, player_id, exercise),
                })
            })
            .collect();

        let overall = tallies.overall.score();
        let complete = is_player_complete(plan, sheet, player_id);
        let threshold_check = check_thresholds(&self.config.outcome, &skill_scores, overall, complete);
        let highest_level = skill_scores
            .values()
            .filter_map(|entry| entry.level.clone())
            .max_by_key(|level| level.index);

        PlayerAggregate {
            plan_id: plan.id().clone(),
            player_id: player_id.clone(),
            skill_scores,
            category_scores,
            overall,
            outcome: Some(threshold_check.suggested_outcome),
            threshold_check: Some(threshold_check),
            exercise_totals,
            highest_level,
            complete,
        }
    }

    /// Aggregate every player on the roster and count outcomes.
    pub fn summarize(&self, plan: &EvaluationPlan, sheet: &ScoreSheet) -> EvaluationSummary {
        let aggregates = plan
            .players()
            .iter()
            .map(|player| (player, self.aggregate(plan, sheet, &player.id)));
        EvaluationSummary::from_aggregates(plan.id().clone(), aggregates)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillScore {
    pub skill: SkillTag,
    pub earned_points: f64,
    /// Weight mass of every metric value that contributed to this skill.
    pub max_points: f64,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LevelReached>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: CategoryName,
    pub earned_points: f64,
    pub max_points: f64,
    pub score: f64,
}

/// Raw points recorded for one exercise, independent of skill weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseTotal {
    pub exercise_id: ExerciseId,
    pub earned_points: f64,
    pub max_points: f64,
    pub complete: bool,
}

/// Everything derived for one player from the current score sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAggregate {
    pub plan_id: PlanId,
    pub player_id: PlayerId,
    pub skill_scores: BTreeMap<SkillTag, SkillScore>,
    pub category_scores: BTreeMap<CategoryName, CategoryScore>,
    pub overall: Option<f64>,
    pub outcome: Option<Outcome>,
    pub threshold_check: Option<ThresholdCheck>,
    pub exercise_totals: Vec<ExerciseTotal>,
    pub highest_level: Option<LevelReached>,
    /// Every exercise of the plan has a complete set of values for this player.
    pub complete: bool,
}

impl PlayerAggregate {
    pub fn empty(plan_id: PlanId, player_id: PlayerId) -> Self {
        Self {
            plan_id,
            player_id,
            skill_scores: BTreeMap::new(),
            category_scores: BTreeMap::new(),
            overall: None,
            outcome: None,
            threshold_check: None,
            exercise_totals: Vec::new(),
            highest_level: None,
            complete: false,
        }
    }

    /// No score has been recorded for the player yet.
    pub fn is_empty(&self) -> bool {
        self.exercise_totals.is_empty()
    }

    pub fn skill_score(&self, skill: &str) -> Option<f64> {
        self.skill_scores
            .get(&SkillTag::new(skill))
            .map(|entry| entry.score)
    }

    pub fn category_score(&self, category: &str) -> Option<f64> {
        self.category_scores
            .get(&CategoryName::new(category))
            .map(|entry| entry.score)
    }
}
