use super::SessionError;
use crate::evaluation::domain::{ExerciseId, MetricId, PlanId, PlayerId};
use crate::evaluation::metric::{RawInput, SkillWeight};
use crate::evaluation::plan::EvaluationPlan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position of one recorded value inside a plan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScoreKey {
    pub player_id: PlayerId,
    pub exercise_id: ExerciseId,
    pub metric_id: MetricId,
}

/// Normalized metric value for one player, with the weighting in force when it was scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub plan_id: PlanId,
    pub player_id: PlayerId,
    pub exercise_id: ExerciseId,
    pub metric_id: MetricId,
    pub value: f64,
    pub max_points: u32,
    pub skill_weights: Vec<SkillWeight>,
    pub scored_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ScoreRecord {
    pub fn key(&self) -> ScoreKey {
        ScoreKey {
            player_id: self.player_id.clone(),
            exercise_id: self.exercise_id.clone(),
            metric_id: self.metric_id.clone(),
        }
    }
}

/// Wire shape of a single metric value submitted by a coach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub metric_id: MetricId,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Mutable set of score records for one plan. Writes are last-write-wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSheet {
    plan_id: PlanId,
    records: BTreeMap<ScoreKey, ScoreRecord>,
}

impl ScoreSheet {
    pub fn new(plan_id: PlanId) -> Self {
        Self {
            plan_id,
            records: BTreeMap::new(),
        }
    }

    pub fn plan_id(&self) -> &PlanId {
        &self.plan_id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Normalize and store one metric value, replacing any earlier value.
    pub fn record(
        &mut self,
        plan: &EvaluationPlan,
        player_id: &PlayerId,
        exercise_id: &ExerciseId,
        metric_id: &MetricId,
        input: RawInput,
        scored_at: DateTime<Utc>,
    ) -> Result<&ScoreRecord, SessionError> {
        let record = self.prepare(plan, player_id, exercise_id, metric_id, input, scored_at)?;
        Ok(self.insert(record))
    }

    /// Validate every entry for a `(player, exercise)` pair, then store them together.
    ///
    /// Nothing is written when any entry is rejected.
    pub fn submit(
        &mut self,
        plan: &EvaluationPlan,
        player_id: &PlayerId,
        exercise_id: &ExerciseId,
        entries: &[MetricEntry],
        scored_at: DateTime<Utc>,
    ) -> Result<Vec<ScoreRecord>, SessionError> {
        let exercise = plan
            .exercise(exercise_id)
            .ok_or_else(|| SessionError::UnknownExercise {
                plan: plan.id().clone(),
                exercise: exercise_id.clone(),
            })?;

        let mut prepared = Vec::with_capacity(entries.len());
        for entry in entries {
            let metric =
                exercise
                    .metric(&entry.metric_id)
                    .ok_or_else(|| SessionError::UnknownMetric {
                        exercise: exercise_id.clone(),
                        metric: entry.metric_id.clone(),
                    })?;
            let input = RawInput::parse(metric, entry.value)?;
            let mut record =
                self.prepare(plan, player_id, exercise_id, &entry.metric_id, input, scored_at)?;
            record.notes = entry.notes.clone();
            prepared.push(record);
        }

        Ok(prepared
            .into_iter()
            .map(|record| self.insert(record).clone())
            .collect())
    }

    /// Store a record produced elsewhere (e.g. replayed from persistence or an import).
    pub fn upsert(&mut self, record: ScoreRecord) -> Result<(), SessionError> {
        if record.plan_id != self.plan_id {
            return Err(SessionError::PlanMismatch {
                expected: self.plan_id.clone(),
                found: record.plan_id,
            });
        }
        self.insert(record);
        Ok(())
    }

    pub fn get(
        &self,
        player_id: &PlayerId,
        exercise_id: &ExerciseId,
        metric_id: &MetricId,
    ) -> Option<&ScoreRecord> {
        self.records.get(&ScoreKey {
            player_id: player_id.clone(),
            exercise_id: exercise_id.clone(),
            metric_id: metric_id.clone(),
        })
    }

    pub fn records(&self) -> impl Iterator<Item = &ScoreRecord> + '_ {
        self.records.values()
    }

    pub fn records_for_player<'a>(
        &'a self,
        player_id: &'a PlayerId,
    ) -> impl Iterator<Item = &'a ScoreRecord> + 'a {
        self.records
            .values()
            .filter(move |record| &record.player_id == player_id)
    }

    pub fn records_for_pair<'a>(
        &'a self,
        player_id: &'a PlayerId,
        exercise_id: &'a ExerciseId,
    ) -> impl Iterator<Item = &'a ScoreRecord> + 'a {
        self.records_for_player(player_id)
            .filter(move |record| &record.exercise_id == exercise_id)
    }

    pub fn has_scores_for(&self, player_id: &PlayerId) -> bool {
        self.records_for_player(player_id).next().is_some()
    }

    fn prepare(
        &self,
        plan: &EvaluationPlan,
        player_id: &PlayerId,
        exercise_id: &ExerciseId,
        metric_id: &MetricId,
        input: RawInput,
        scored_at: DateTime<Utc>,
    ) -> Result<ScoreRecord, SessionError> {
        if plan.id() != &self.plan_id {
            return Err(SessionError::PlanMismatch {
                expected: self.plan_id.clone(),
                found: plan.id().clone(),
            });
        }
        if !plan.has_player(player_id) {
            return Err(SessionError::UnknownPlayer {
                plan: plan.id().clone(),
                player: player_id.clone(),
            });
        }
        let exercise = plan
            .exercise(exercise_id)
            .ok_or_else(|| SessionError::UnknownExercise {
                plan: plan.id().clone(),
                exercise: exercise_id.clone(),
            })?;
        let metric = exercise
            .metric(metric_id)
            .ok_or_else(|| SessionError::UnknownMetric {
                exercise: exercise_id.clone(),
                metric: metric_id.clone(),
            })?;

        Ok(ScoreRecord {
            plan_id: self.plan_id.clone(),
            player_id: player_id.clone(),
            exercise_id: exercise_id.clone(),
            metric_id: metric_id.clone(),
            value: metric.normalize(input),
            max_points: metric.max_points(),
            skill_weights: metric.skill_weights().to_vec(),
            scored_at,
            notes: None,
        })
    }

    fn insert(&mut self, record: ScoreRecord) -> &ScoreRecord {
        let key = record.key();
        self.records.insert(key.clone(), record);
        &self.records[&key]
    }
}
