use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::aggregation::{AggregationEngine, EvaluationSummary, PlayerAggregate};
use super::badges::{Badge, BadgeDeriver, CoachDecision, EvaluationRecord};
use super::config::ScoringConfig;
use super::domain::{EvaluationId, ExerciseId, PlanId, PlayerId};
use super::import::{ScoreImportError, ScoreSheetImporter};
use super::plan::EvaluationPlan;
use super::repository::{PlayerHistoryRepository, RepositoryError, SessionRepository, SessionView};
use super::session::{
    EvaluationGroup, EvaluationSession, MetricEntry, ScoreRecord, SessionError, SessionProgress,
    SessionStatus,
};

/// Service composing session storage, player history, aggregation and badge derivation.
pub struct EvaluationService<S, H> {
    sessions: Arc<S>,
    history: Arc<H>,
    engine: Arc<AggregationEngine>,
    badges: Arc<BadgeDeriver>,
    // read-modify-write on sessions and history must not interleave
    writes: Mutex<()>,
}

static EVALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_evaluation_id() -> EvaluationId {
    let id = EVALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EvaluationId(format!("eval-{id:06}"))
}

/// Current aggregate for a player together with the badges they hold.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerResult {
    pub aggregate: PlayerAggregate,
    pub badges: Vec<Badge>,
}

/// Outcome of finalizing a player's evaluation.
///
/// `aggregate.outcome` carries the final verdict; the threshold suggestion stays in
/// `aggregate.threshold_check`.
#[derive(Debug, Clone, Serialize)]
pub struct FinalizedEvaluation {
    pub record: EvaluationRecord,
    pub aggregate: PlayerAggregate,
    pub awarded: Vec<Badge>,
}

impl<S, H> EvaluationService<S, H>
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    pub fn new(sessions: Arc<S>, history: Arc<H>, config: ScoringConfig) -> Self {
        let badges = Arc::new(BadgeDeriver::from_config(&config));
        let engine = Arc::new(AggregationEngine::new(config));

        Self {
            sessions,
            history,
            engine,
            badges,
            writes: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        self.engine.config()
    }

    /// Register a plan and open a draft session for it.
    pub fn register_plan(&self, plan: EvaluationPlan) -> Result<SessionView, EvaluationServiceError> {
        let _guard = self.write_lock()?;
        let session = EvaluationSession::new(plan);
        let view = SessionView::from(&session);
        self.sessions.insert(session)?;
        info!(plan_id = %view.plan_id, players = view.players, exercises = view.exercises, "evaluation plan registered");
        Ok(view)
    }

    pub fn session(&self, plan_id: &PlanId) -> Result<EvaluationSession, EvaluationServiceError> {
        self.sessions
            .fetch(plan_id)?
            .ok_or_else(|| EvaluationServiceError::PlanNotFound(plan_id.clone()))
    }

    pub fn set_status(
        &self,
        plan_id: &PlanId,
        status: SessionStatus,
        at: DateTime<Utc>,
    ) -> Result<SessionView, EvaluationServiceError> {
        let _guard = self.write_lock()?;
        let mut session = self.session(plan_id)?;
        session.transition(status, at)?;
        let view = SessionView::from(&session);
        self.sessions.update(session)?;
        info!(%plan_id, status = status.label(), "session status changed");
        Ok(view)
    }

    pub fn split_groups(
        &self,
        plan_id: &PlanId,
        count: usize,
    ) -> Result<Vec<EvaluationGroup>, EvaluationServiceError> {
        let _guard = self.write_lock()?;
        let mut session = self.session(plan_id)?;
        let groups = session.auto_split_groups(count)?.to_vec();
        self.sessions.update(session)?;
        Ok(groups)
    }

    pub fn assign_evaluator(
        &self,
        plan_id: &PlanId,
        group_name: &str,
        evaluator: &str,
    ) -> Result<EvaluationGroup, EvaluationServiceError> {
        let _guard = self.write_lock()?;
        let mut session = self.session(plan_id)?;
        let group = session.assign_evaluator(group_name, evaluator.trim())?.clone();
        self.sessions.update(session)?;
        info!(%plan_id, group = %group.name, evaluator, "evaluator assigned");
        Ok(group)
    }

    /// Record every metric value of one `(player, exercise)` pair.
    pub fn submit_scores(
        &self,
        plan_id: &PlanId,
        player_id: &PlayerId,
        exercise_id: &ExerciseId,
        entries: &[MetricEntry],
        at: DateTime<Utc>,
    ) -> Result<Vec<ScoreRecord>, EvaluationServiceError> {
        let _guard = self.write_lock()?;
        let mut session = self.session(plan_id)?;
        let records = session.submit(player_id, exercise_id, entries, at)?;
        self.sessions.update(session)?;
        debug!(%plan_id, %player_id, %exercise_id, values = records.len(), "scores recorded");
        Ok(records)
    }

    /// Merge an offline CSV score export into a running session.
    ///
    /// Rows are validated against the plan first; nothing is stored when one fails.
    pub fn import_scores<R: Read>(
        &self,
        plan_id: &PlanId,
        reader: R,
        default_scored_at: DateTime<Utc>,
    ) -> Result<usize, EvaluationServiceError> {
        let _guard = self.write_lock()?;
        let mut session = self.session(plan_id)?;
        let status = session.status();
        if !status.accepts_scores() {
            return Err(SessionError::NotAcceptingScores { status }.into());
        }

        let mut sheet = session.sheet().clone();
        let rows = ScoreSheetImporter::apply(reader, session.plan(), &mut sheet, default_scored_at)?;
        session.restore(sheet.records().cloned())?;
        self.sessions.update(session)?;
        info!(%plan_id, rows, "score export imported");
        Ok(rows)
    }

    pub fn progress(&self, plan_id: &PlanId) -> Result<SessionProgress, EvaluationServiceError> {
        Ok(self.session(plan_id)?.progress())
    }

    pub fn summary(&self, plan_id: &PlanId) -> Result<EvaluationSummary, EvaluationServiceError> {
        let session = self.session(plan_id)?;
        Ok(self.engine.summarize(session.plan(), session.sheet()))
    }

    pub fn aggregate(
        &self,
        plan_id: &PlanId,
        player_id: &PlayerId,
    ) -> Result<PlayerAggregate, EvaluationServiceError> {
        let session = self.session(plan_id)?;
        if !session.plan().has_player(player_id) {
            return Err(EvaluationServiceError::PlayerNotFound {
                plan: plan_id.clone(),
                player: player_id.clone(),
            });
        }
        Ok(self
            .engine
            .aggregate(session.plan(), session.sheet(), player_id))
    }

    pub fn player_result(
        &self,
        plan_id: &PlanId,
        player_id: &PlayerId,
    ) -> Result<PlayerResult, EvaluationServiceError> {
        let aggregate = self.aggregate(plan_id, player_id)?;
        let badges = self.history.badges(player_id)?;
        Ok(PlayerResult { aggregate, badges })
    }

    pub fn player_badges(&self, player_id: &PlayerId) -> Result<Vec<Badge>, EvaluationServiceError> {
        Ok(self.history.badges(player_id)?)
    }

    /// Aggregate the player, record the coach's decision in their history and persist new
    /// badges.
    ///
    /// Badges are derived from the final outcome, so a coach overruling the thresholds also
    /// decides outcome-based badges. Finalizing the same plan again replaces the history
    /// entry and never re-awards a badge.
    pub fn finalize(
        &self,
        plan_id: &PlanId,
        player_id: &PlayerId,
        decision: CoachDecision,
        at: DateTime<Utc>,
    ) -> Result<FinalizedEvaluation, EvaluationServiceError> {
        let _guard = self.write_lock()?;
        let suggested = self.aggregate(plan_id, player_id)?;
        if suggested.is_empty() {
            return Err(EvaluationServiceError::NothingToFinalize {
                plan: plan_id.clone(),
                player: player_id.clone(),
            });
        }

        let (earlier, previous): (Vec<EvaluationRecord>, Vec<EvaluationRecord>) = self
            .history
            .history(player_id)?
            .into_iter()
            .partition(|entry| &entry.plan_id != plan_id);
        let evaluation_id = previous
            .into_iter()
            .next()
            .map(|entry| entry.evaluation_id)
            .unwrap_or_else(next_evaluation_id);

        let record = EvaluationRecord::from_aggregate(evaluation_id, &suggested, decision, at);
        let mut aggregate = suggested;
        aggregate.outcome = Some(record.outcome);

        let prior_badges = self.history.badges(player_id)?;
        let awarded = self.badges.derive(
            player_id,
            &aggregate,
            &earlier,
            &prior_badges,
            at,
            Some(&record.evaluation_id),
        );

        self.history.record_evaluation(record.clone())?;
        self.history.award(&awarded)?;

        info!(
            %plan_id,
            %player_id,
            evaluation_id = %record.evaluation_id,
            outcome = record.outcome.label(),
            suggested = record.suggested_outcome.label(),
            badges = awarded.len(),
            "evaluation finalized"
        );

        Ok(FinalizedEvaluation {
            record,
            aggregate,
            awarded,
        })
    }

    fn write_lock(&self) -> Result<MutexGuard<'_, ()>, EvaluationServiceError> {
        self.writes
            .lock()
            .map_err(|_| RepositoryError::Unavailable("write lock poisoned".to_string()).into())
    }
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error("plan '{0}' is not registered")]
    PlanNotFound(PlanId),
    #[error("player '{player}' is not on the roster of plan '{plan}'")]
    PlayerNotFound { plan: PlanId, player: PlayerId },
    #[error("player '{player}' has no scores in plan '{plan}'")]
    NothingToFinalize { plan: PlanId, player: PlayerId },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Import(#[from] ScoreImportError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
