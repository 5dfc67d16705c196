use super::progress::is_pair_complete;
use super::sheet::ScoreSheet;
use super::SessionError;
use crate::evaluation::domain::{ExerciseId, PlayerId, PlayerRef};
use crate::evaluation::plan::{EvaluationPlan, Exercise};
use serde::{Deserialize, Serialize};

/// Caller-owned navigation state over the player and exercise axes of a plan.
///
/// Both axes move independently and stop at their ends. Any pair can be selected
/// directly, whatever its completion state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCursor {
    player_index: usize,
    exercise_index: usize,
}

impl SessionCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player_index(&self) -> usize {
        self.player_index
    }

    pub fn exercise_index(&self) -> usize {
        self.exercise_index
    }

    pub fn current_player<'p>(&self, plan: &'p EvaluationPlan) -> Option<&'p PlayerRef> {
        plan.players().get(self.player_index)
    }

    pub fn current_exercise<'p>(&self, plan: &'p EvaluationPlan) -> Option<&'p Exercise> {
        plan.exercise_at(self.exercise_index)
    }

    /// Returns `true` when the cursor moved.
    pub fn next_player(&mut self, plan: &EvaluationPlan) -> bool {
        advance(&mut self.player_index, plan.players().len())
    }

    pub fn previous_player(&mut self) -> bool {
        retreat(&mut self.player_index)
    }

    pub fn next_exercise(&mut self, plan: &EvaluationPlan) -> bool {
        advance(&mut self.exercise_index, plan.items().len())
    }

    pub fn previous_exercise(&mut self) -> bool {
        retreat(&mut self.exercise_index)
    }

    pub fn select(
        &mut self,
        plan: &EvaluationPlan,
        player_id: &PlayerId,
        exercise_id: &ExerciseId,
    ) -> Result<(), SessionError> {
        let player_index =
            plan.player_index(player_id)
                .ok_or_else(|| SessionError::UnknownPlayer {
                    plan: plan.id().clone(),
                    player: player_id.clone(),
                })?;
        let exercise_index =
            plan.exercise_index(exercise_id)
                .ok_or_else(|| SessionError::UnknownExercise {
                    plan: plan.id().clone(),
                    exercise: exercise_id.clone(),
                })?;

        self.player_index = player_index;
        self.exercise_index = exercise_index;
        Ok(())
    }

    /// Jump to the next pair that is not complete, walking players within the current
    /// exercise first and wrapping around the plan once. Returns `false` when every
    /// pair is complete.
    pub fn next_incomplete(&mut self, plan: &EvaluationPlan, sheet: &ScoreSheet) -> bool {
        let players = plan.players().len();
        let exercises = plan.items().len();
        let total = players * exercises;
        if total == 0 {
            return false;
        }

        let start = self.exercise_index * players + self.player_index;
        for offset in 1..=total {
            let slot = (start + offset) % total;
            let (exercise_index, player_index) = (slot / players, slot % players);
            let (Some(exercise), Some(player)) = (
                plan.exercise_at(exercise_index),
                plan.players().get(player_index),
            ) else {
                continue;
            };

            if !is_pair_complete(sheet, &player.id, exercise) {
                self.exercise_index = exercise_index;
                self.player_index = player_index;
                return true;
            }
        }

        false
    }
}

fn advance(index: &mut usize, len: usize) -> bool {
    if *index + 1 < len {
        *index += 1;
        true
    } else {
        false
    }
}

fn retreat(index: &mut usize) -> bool {
    if *index > 0 {
        *index -= 1;
        true
    } else {
        false
    }
}
