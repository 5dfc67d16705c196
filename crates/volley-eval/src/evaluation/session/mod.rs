mod cursor;
mod progress;
mod sheet;

pub use cursor::SessionCursor;
pub use progress::{
    completed_exercises, is_pair_complete, is_plan_complete, is_player_complete, pair_status,
    scored_players, ExerciseProgressEntry, GroupProgressEntry, PairStatus, SessionProgress,
};
pub use sheet::{MetricEntry, ScoreKey, ScoreRecord, ScoreSheet};

use super::domain::{ExerciseId, MetricId, PlanId, PlayerId};
use super::metric::{InputError, RawInput};
use super::plan::EvaluationPlan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a live scoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Draft,
    Running,
    Paused,
    Completed,
}

impl SessionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    pub const fn accepts_scores(self) -> bool {
        matches!(self, Self::Running)
    }

    const fn can_move_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Running)
                | (Self::Running, Self::Paused)
                | (Self::Paused, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Paused, Self::Completed)
        )
    }
}

/// Subset of the roster assigned to one evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationGroup {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluator: Option<String>,
    pub players: Vec<PlayerId>,
}

/// Error raised while recording scores or driving a session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("player '{player}' is not on the roster of plan '{plan}'")]
    UnknownPlayer { plan: PlanId, player: PlayerId },
    #[error("exercise '{exercise}' is not part of plan '{plan}'")]
    UnknownExercise { plan: PlanId, exercise: ExerciseId },
    #[error("metric '{metric}' does not belong to exercise '{exercise}'")]
    UnknownMetric {
        exercise: ExerciseId,
        metric: MetricId,
    },
    #[error("score belongs to plan '{found}', expected '{expected}'")]
    PlanMismatch { expected: PlanId, found: PlanId },
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("session is {} and does not accept scores", .status.label())]
    NotAcceptingScores { status: SessionStatus },
    #[error("session cannot move from {} to {}", .from.label(), .to.label())]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
    #[error("cannot split {players} player(s) into {groups} group(s)")]
    InvalidGroupCount { players: usize, groups: usize },
    #[error("evaluator group '{group}' does not exist")]
    UnknownGroup { group: String },
}

/// Live scoring state for one plan: lifecycle, evaluator groups and the score sheet.
#[derive(Debug, Clone)]
pub struct EvaluationSession {
    plan: EvaluationPlan,
    status: SessionStatus,
    sheet: ScoreSheet,
    groups: Vec<EvaluationGroup>,
    started_at: Option<DateTime<Utc>>,
    paused_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl EvaluationSession {
    pub fn new(plan: EvaluationPlan) -> Self {
        let sheet = ScoreSheet::new(plan.id().clone());
        Self {
            plan,
            status: SessionStatus::Draft,
            sheet,
            groups: Vec::new(),
            started_at: None,
            paused_at: None,
            completed_at: None,
        }
    }

    pub fn plan(&self) -> &EvaluationPlan {
        &self.plan
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn sheet(&self) -> &ScoreSheet {
        &self.sheet
    }

    pub fn groups(&self) -> &[EvaluationGroup] {
        &self.groups
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn paused_at(&self) -> Option<DateTime<Utc>> {
        self.paused_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn start(&mut self, at: DateTime<Utc>) -> Result<(), SessionError> {
        self.transition(SessionStatus::Running, at)
    }

    pub fn pause(&mut self, at: DateTime<Utc>) -> Result<(), SessionError> {
        self.transition(SessionStatus::Paused, at)
    }

    pub fn resume(&mut self, at: DateTime<Utc>) -> Result<(), SessionError> {
        self.transition(SessionStatus::Running, at)
    }

    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), SessionError> {
        self.transition(SessionStatus::Completed, at)
    }

    pub fn transition(&mut self, next: SessionStatus, at: DateTime<Utc>) -> Result<(), SessionError> {
        if !self.status.can_move_to(next) {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        match next {
            SessionStatus::Running => {
                self.started_at.get_or_insert(at);
                self.paused_at = None;
            }
            SessionStatus::Paused => self.paused_at = Some(at),
            SessionStatus::Completed => self.completed_at = Some(at),
            SessionStatus::Draft => {}
        }
        self.status = next;
        Ok(())
    }

    pub fn record(
        &mut self,
        player_id: &PlayerId,
        exercise_id: &ExerciseId,
        metric_id: &MetricId,
        input: RawInput,
        at: DateTime<Utc>,
    ) -> Result<&ScoreRecord, SessionError> {
        self.ensure_accepting()?;
        self.sheet
            .record(&self.plan, player_id, exercise_id, metric_id, input, at)
    }

    pub fn submit(
        &mut self,
        player_id: &PlayerId,
        exercise_id: &ExerciseId,
        entries: &[MetricEntry],
        at: DateTime<Utc>,
    ) -> Result<Vec<ScoreRecord>, SessionError> {
        self.ensure_accepting()?;
        self.sheet
            .submit(&self.plan, player_id, exercise_id, entries, at)
    }

    /// Merge records loaded from elsewhere into the sheet, bypassing the status gate.
    ///
    /// Existing values for other keys are kept and a later record for the same key wins.
    /// The sheet is unchanged when any record belongs to another plan.
    pub fn restore(&mut self, records: impl IntoIterator<Item = ScoreRecord>) -> Result<(), SessionError> {
        let mut staged = self.sheet.clone();
        for record in records {
            staged.upsert(record)?;
        }
        self.sheet = staged;
        Ok(())
    }

    /// Distribute the roster round-robin into `count` groups.
    pub fn auto_split_groups(&mut self, count: usize) -> Result<&[EvaluationGroup], SessionError> {
        let players = self.plan.players().len();
        if count == 0 || count > players {
            return Err(SessionError::InvalidGroupCount {
                players,
                groups: count,
            });
        }

        let mut groups: Vec<EvaluationGroup> = (1..=count)
            .map(|index| EvaluationGroup {
                name: format!("Group {index}"),
                evaluator: None,
                players: Vec::new(),
            })
            .collect();
        for (index, player) in self.plan.players().iter().enumerate() {
            groups[index % count].players.push(player.id.clone());
        }

        self.groups = groups;
        Ok(&self.groups)
    }

    /// Put a coach in charge of a group, replacing any earlier assignment.
    pub fn assign_evaluator(
        &mut self,
        group_name: &str,
        evaluator: impl Into<String>,
    ) -> Result<&EvaluationGroup, SessionError> {
        let group = self
            .groups
            .iter_mut()
            .find(|group| group.name == group_name)
            .ok_or_else(|| SessionError::UnknownGroup {
                group: group_name.to_string(),
            })?;
        group.evaluator = Some(evaluator.into());
        Ok(group)
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress::compute(&self.plan, &self.sheet, &self.groups)
    }

    pub fn is_plan_complete(&self) -> bool {
        is_plan_complete(&self.plan, &self.sheet)
    }

    fn ensure_accepting(&self) -> Result<(), SessionError> {
        if self.status.accepts_scores() {
            Ok(())
        } else {
            Err(SessionError::NotAcceptingScores {
                status: self.status,
            })
        }
    }
}
