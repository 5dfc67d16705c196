use super::domain::{DefinitionError, ExerciseId, ExerciseLevel, MetricId, PlanId, PlayerId, PlayerRef};
use super::metric::Metric;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Reusable, ordered bundle of metrics performed at one evaluation station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExerciseDefinition")]
pub struct Exercise {
    id: ExerciseId,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    level: ExerciseLevel,
    metrics: Vec<Metric>,
}

#[derive(Debug, Deserialize)]
struct ExerciseDefinition {
    id: ExerciseId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    level: ExerciseLevel,
    metrics: Vec<Metric>,
}

impl TryFrom<ExerciseDefinition> for Exercise {
    type Error = DefinitionError;

    fn try_from(value: ExerciseDefinition) -> Result<Self, Self::Error> {
        let mut exercise = Exercise::new(value.id, value.name, value.level, value.metrics)?;
        exercise.description = value.description;
        Ok(exercise)
    }
}

impl Exercise {
    pub fn new(
        id: impl Into<ExerciseId>,
        name: impl Into<String>,
        level: ExerciseLevel,
        metrics: Vec<Metric>,
    ) -> Result<Self, DefinitionError> {
        let id = id.into();
        if metrics.is_empty() {
            return Err(DefinitionError::EmptyExercise { exercise: id });
        }

        let mut seen = HashSet::new();
        for metric in &metrics {
            if !seen.insert(metric.id()) {
                return Err(DefinitionError::DuplicateMetric {
                    exercise: id,
                    metric: metric.id().clone(),
                });
            }
        }

        Ok(Self {
            id,
            name: name.into(),
            description: None,
            level,
            metrics,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> &ExerciseId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn level(&self) -> ExerciseLevel {
        self.level
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn metric(&self, id: &MetricId) -> Option<&Metric> {
        self.metrics.iter().find(|metric| metric.id() == id)
    }

    /// Sum of every metric's `max_points`, the denominator of the raw exercise total.
    ///
    /// Summed as `f64` so large per-metric maxima cannot overflow.
    pub fn max_total(&self) -> f64 {
        self.metrics
            .iter()
            .map(|metric| f64::from(metric.max_points()))
            .sum()
    }
}

/// Exercise placed in a plan at a given position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub exercise: Exercise,
    pub order: u32,
}

/// Ordered exercises plus the roster assigned to one evaluation event.
///
/// Items are kept sorted by `order`; the structure never changes once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlanDefinition")]
pub struct EvaluationPlan {
    id: PlanId,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    items: Vec<PlanItem>,
    players: Vec<PlayerRef>,
}

#[derive(Debug, Deserialize)]
struct PlanDefinition {
    id: PlanId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    items: Vec<PlanItem>,
    players: Vec<PlayerRef>,
}

impl TryFrom<PlanDefinition> for EvaluationPlan {
    type Error = DefinitionError;

    fn try_from(value: PlanDefinition) -> Result<Self, Self::Error> {
        let mut plan = EvaluationPlan::new(value.id, value.items, value.players)?;
        plan.name = value.name;
        plan.notes = value.notes;
        Ok(plan)
    }
}

impl EvaluationPlan {
    pub fn new(
        id: impl Into<PlanId>,
        mut items: Vec<PlanItem>,
        players: Vec<PlayerRef>,
    ) -> Result<Self, DefinitionError> {
        let id = id.into();
        if items.is_empty() {
            return Err(DefinitionError::NoExercises { plan: id });
        }
        if players.is_empty() {
            return Err(DefinitionError::NoPlayers { plan: id });
        }

        items.sort_by_key(|item| item.order);
        for pair in items.windows(2) {
            if pair[0].order == pair[1].order {
                return Err(DefinitionError::DuplicateOrder {
                    plan: id,
                    order: pair[0].order,
                });
            }
        }

        let mut exercises = HashSet::new();
        for item in &items {
            if !exercises.insert(item.exercise.id()) {
                return Err(DefinitionError::DuplicateExercise {
                    plan: id,
                    exercise: item.exercise.id().clone(),
                });
            }
        }

        let mut roster = HashSet::new();
        for player in &players {
            if !roster.insert(&player.id) {
                return Err(DefinitionError::DuplicatePlayer {
                    plan: id,
                    player: player.id.clone(),
                });
            }
        }

        Ok(Self {
            id,
            name: None,
            notes: None,
            items,
            players,
        })
    }

    /// Build a plan whose order follows the position of each exercise in `exercises`.
    pub fn from_exercises(
        id: impl Into<PlanId>,
        exercises: Vec<Exercise>,
        players: Vec<PlayerRef>,
    ) -> Result<Self, DefinitionError> {
        let items = exercises
            .into_iter()
            .zip(1u32..)
            .map(|(exercise, order)| PlanItem { exercise, order })
            .collect();
        Self::new(id, items, players)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn id(&self) -> &PlanId {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn items(&self) -> &[PlanItem] {
        &self.items
    }

    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> + '_ {
        self.items.iter().map(|item| &item.exercise)
    }

    pub fn exercise(&self, id: &ExerciseId) -> Option<&Exercise> {
        self.exercises().find(|exercise| exercise.id() == id)
    }

    pub fn exercise_at(&self, index: usize) -> Option<&Exercise> {
        self.items.get(index).map(|item| &item.exercise)
    }

    pub fn exercise_index(&self, id: &ExerciseId) -> Option<usize> {
        self.exercises().position(|exercise| exercise.id() == id)
    }

    pub fn players(&self) -> &[PlayerRef] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&PlayerRef> {
        self.players.iter().find(|player| &player.id == id)
    }

    pub fn player_index(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|player| &player.id == id)
    }

    pub fn has_player(&self, id: &PlayerId) -> bool {
        self.player_index(id).is_some()
    }

    /// Number of `(player, exercise)` pairs that must be scored.
    pub fn total_pairs(&self) -> usize {
        self.players.len() * self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::metric::{MetricConfig, SkillWeight};

    fn exercise(id: &str) -> Exercise {
        let metric = Metric::new(
            "m1",
            "Serve in",
            1,
            MetricConfig::checkbox(),
            vec![SkillWeight::new("Serving", 100)],
        )
        .expect("valid metric");
        Exercise::new(id, id, ExerciseLevel::Beginner, vec![metric]).expect("valid exercise")
    }

    #[test]
    fn exercise_requires_metrics() {
        let err = Exercise::new("empty", "Empty", ExerciseLevel::Beginner, vec![])
            .expect_err("no metrics");
        assert_eq!(
            err,
            DefinitionError::EmptyExercise {
                exercise: ExerciseId::new("empty")
            }
        );
    }

    #[test]
    fn plan_sorts_items_and_rejects_ties() {
        let plan = EvaluationPlan::new(
            "plan",
            vec![
                PlanItem {
                    exercise: exercise("b"),
                    order: 2,
                },
                PlanItem {
                    exercise: exercise("a"),
                    order: 1,
                },
            ],
            vec![PlayerRef::new("p1")],
        )
        .expect("valid plan");
        let ids: Vec<&str> = plan.exercises().map(|exercise| exercise.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let err = EvaluationPlan::new(
            "plan",
            vec![
                PlanItem {
                    exercise: exercise("a"),
                    order: 1,
                },
                PlanItem {
                    exercise: exercise("b"),
                    order: 1,
                },
            ],
            vec![PlayerRef::new("p1")],
        )
        .expect_err("tied order");
        assert!(matches!(err, DefinitionError::DuplicateOrder { order: 1, .. }));
    }

    #[test]
    fn plan_requires_exercises_and_players() {
        let err = EvaluationPlan::from_exercises("plan", vec![], vec![PlayerRef::new("p1")])
            .expect_err("no exercises");
        assert!(matches!(err, DefinitionError::NoExercises { .. }));

        let err = EvaluationPlan::from_exercises("plan", vec![exercise("a")], vec![])
            .expect_err("no players");
        assert!(matches!(err, DefinitionError::NoPlayers { .. }));

        let err = EvaluationPlan::from_exercises(
            "plan",
            vec![exercise("a")],
            vec![PlayerRef::new("p1"), PlayerRef::new("p1")],
        )
        .expect_err("duplicate player");
        assert!(matches!(err, DefinitionError::DuplicatePlayer { .. }));
    }
}
