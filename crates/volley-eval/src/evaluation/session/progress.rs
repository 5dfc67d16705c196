use super::sheet::ScoreSheet;
use super::EvaluationGroup;
use crate::evaluation::domain::{ExerciseId, PlayerId};
use crate::evaluation::plan::{EvaluationPlan, Exercise};
use serde::Serialize;
use std::collections::BTreeSet;

/// Completion state of one `(player, exercise)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStatus {
    NotStarted,
    InProgress,
    Complete,
}

impl PairStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        }
    }
}

/// Status of a pair derived from which metrics have a recorded value.
///
/// Completeness depends only on presence, so editing a value never moves a pair back.
pub fn pair_status(sheet: &ScoreSheet, player_id: &PlayerId, exercise: &Exercise) -> PairStatus {
    let recorded = exercise
        .metrics()
        .iter()
        .filter(|metric| sheet.get(player_id, exercise.id(), metric.id()).is_some())
        .count();

    if recorded == 0 {
        PairStatus::NotStarted
    } else if recorded == exercise.metrics().len() {
        PairStatus::Complete
    } else {
        PairStatus::InProgress
    }
}

pub fn is_pair_complete(sheet: &ScoreSheet, player_id: &PlayerId, exercise: &Exercise) -> bool {
    pair_status(sheet, player_id, exercise) == PairStatus::Complete
}

/// True once every roster × exercise pair is complete.
pub fn is_plan_complete(plan: &EvaluationPlan, sheet: &ScoreSheet) -> bool {
    plan.exercises().all(|exercise| {
        plan.players()
            .iter()
            .all(|player| is_pair_complete(sheet, &player.id, exercise))
    })
}

/// True once every exercise of the plan is complete for one player.
pub fn is_player_complete(plan: &EvaluationPlan, sheet: &ScoreSheet, player_id: &PlayerId) -> bool {
    plan.exercises()
        .all(|exercise| is_pair_complete(sheet, player_id, exercise))
}

/// Players with a complete pair for the given exercise.
pub fn scored_players(
    plan: &EvaluationPlan,
    sheet: &ScoreSheet,
    exercise: &Exercise,
) -> BTreeSet<PlayerId> {
    plan.players()
        .iter()
        .filter(|player| is_pair_complete(sheet, &player.id, exercise))
        .map(|player| player.id.clone())
        .collect()
}

/// Exercises for which every player on the roster is complete.
pub fn completed_exercises(plan: &EvaluationPlan, sheet: &ScoreSheet) -> BTreeSet<ExerciseId> {
    plan.exercises()
        .filter(|exercise| {
            plan.players()
                .iter()
                .all(|player| is_pair_complete(sheet, &player.id, exercise))
        })
        .map(|exercise| exercise.id().clone())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseProgressEntry {
    pub exercise_id: ExerciseId,
    pub exercise_name: String,
    pub players_scored: usize,
    pub total_players: usize,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupProgressEntry {
    pub group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluator: Option<String>,
    pub players_scored: usize,
    pub total_players: usize,
    pub exercises_completed: usize,
    pub total_exercises: usize,
}

/// Roll-up of scoring progress across the whole plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProgress {
    pub total_players: usize,
    pub total_exercises: usize,
    pub total_scored: usize,
    pub total_possible: usize,
    pub overall_progress: f64,
    pub plan_complete: bool,
    pub exercises: Vec<ExerciseProgressEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupProgressEntry>,
}

impl SessionProgress {
    pub fn compute(plan: &EvaluationPlan, sheet: &ScoreSheet, groups: &[EvaluationGroup]) -> Self {
        let total_players = plan.players().len();
        let done = completed_exercises(plan, sheet);
        let exercises: Vec<ExerciseProgressEntry> = plan
            .exercises()
            .map(|exercise| ExerciseProgressEntry {
                exercise_id: exercise.id().clone(),
                exercise_name: exercise.name().to_string(),
                players_scored: scored_players(plan, sheet, exercise).len(),
                total_players,
                complete: done.contains(exercise.id()),
            })
            .collect();

        let total_scored: usize = exercises.iter().map(|entry| entry.players_scored).sum();
        let total_possible = plan.total_pairs();
        let overall_progress = if total_possible == 0 {
            0.0
        } else {
            total_scored as f64 / total_possible as f64 * 100.0
        };

        let groups = groups
            .iter()
            .map(|group| group_progress(plan, sheet, group))
            .collect();

        Self {
            total_players,
            total_exercises: exercises.len(),
            total_scored,
            total_possible,
            overall_progress,
            plan_complete: total_scored == total_possible,
            exercises,
            groups,
        }
    }
}

fn group_progress(
    plan: &EvaluationPlan,
    sheet: &ScoreSheet,
    group: &EvaluationGroup,
) -> GroupProgressEntry {
    let players_scored = group
        .players
        .iter()
        .filter(|player| is_player_complete(plan, sheet, player))
        .count();
    let exercises_completed = plan
        .exercises()
        .filter(|exercise| {
            group
                .players
                .iter()
                .all(|player| is_pair_complete(sheet, player, exercise))
        })
        .count();

    GroupProgressEntry {
        group_name: group.name.clone(),
        evaluator: group.evaluator.clone(),
        players_scored,
        total_players: group.players.len(),
        exercises_completed,
        total_exercises: plan.items().len(),
    }
}
