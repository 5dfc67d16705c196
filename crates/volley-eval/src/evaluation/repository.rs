use serde::Serialize;

use super::badges::{Badge, EvaluationRecord};
use super::domain::{PlanId, PlayerId};
use super::session::{EvaluationGroup, EvaluationSession};
use chrono::{DateTime, Utc};

/// Storage for live sessions, keyed by plan.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, session: EvaluationSession) -> Result<(), RepositoryError>;
    fn update(&self, session: EvaluationSession) -> Result<(), RepositoryError>;
    fn fetch(&self, plan_id: &PlanId) -> Result<Option<EvaluationSession>, RepositoryError>;
}

/// Per-player evaluation history and held badges, consumed by badge derivation.
pub trait PlayerHistoryRepository: Send + Sync {
    fn history(&self, player_id: &PlayerId) -> Result<Vec<EvaluationRecord>, RepositoryError>;
    /// Store a finalized evaluation, replacing any earlier entry for the same plan and player.
    fn record_evaluation(&self, record: EvaluationRecord) -> Result<(), RepositoryError>;
    fn badges(&self, player_id: &PlayerId) -> Result<Vec<Badge>, RepositoryError>;
    fn award(&self, badges: &[Badge]) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized representation of a session for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub plan_id: PlanId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: &'static str,
    pub players: usize,
    pub exercises: usize,
    pub recorded_scores: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<EvaluationGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&EvaluationSession> for SessionView {
    fn from(session: &EvaluationSession) -> Self {
        let plan = session.plan();
        Self {
            plan_id: plan.id().clone(),
            name: plan.name().map(str::to_string),
            status: session.status().label(),
            players: plan.players().len(),
            exercises: plan.items().len(),
            recorded_scores: session.sheet().len(),
            groups: session.groups().to_vec(),
            started_at: session.started_at(),
            completed_at: session.completed_at(),
        }
    }
}
