use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::evaluation::badges::{Badge, EvaluationRecord};
use crate::evaluation::config::ScoringConfig;
use crate::evaluation::domain::{ExerciseId, ExerciseLevel, PlanId, PlayerId, PlayerRef};
use crate::evaluation::metric::{Metric, MetricConfig, MetricKind, SkillWeight};
use crate::evaluation::plan::{EvaluationPlan, Exercise};
use crate::evaluation::repository::{PlayerHistoryRepository, RepositoryError, SessionRepository};
use crate::evaluation::service::EvaluationService;
use crate::evaluation::session::{EvaluationSession, MetricEntry};

pub(super) const PLAN: &str = "tryouts-2026";
pub(super) const ANA: &str = "p-ana";
pub(super) const BEA: &str = "p-bea";
pub(super) const CRIS: &str = "p-cris";

pub(super) fn ts(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn metric(
    id: &str,
    max_points: u32,
    config: MetricConfig,
    weights: &[(&str, u8)],
) -> Metric {
    Metric::new(
        id,
        id.replace('_', " "),
        max_points,
        config,
        weights
            .iter()
            .map(|(skill, percentage)| SkillWeight::new(*skill, *percentage))
            .collect(),
    )
    .expect("valid metric")
}

pub(super) fn serve_test() -> Exercise {
    Exercise::new(
        "serve",
        "Serve Test",
        ExerciseLevel::Beginner,
        vec![
            metric("in_zone", 10, MetricConfig::ratio(), &[("Serving", 100)]),
            metric(
                "toss",
                5,
                MetricConfig::checkbox(),
                &[("Serving", 60), ("Control", 40)],
            ),
        ],
    )
    .expect("valid exercise")
}

pub(super) fn approach_jump() -> Exercise {
    Exercise::new(
        "approach",
        "Approach Jump",
        ExerciseLevel::Intermediate,
        vec![
            metric(
                "reach",
                10,
                MetricConfig::number(),
                &[("Power", 70), ("Vertical", 30)],
            ),
            metric("footwork", 5, MetricConfig::slider(), &[("Agility", 100)]),
        ],
    )
    .expect("valid exercise")
}

pub(super) fn serve_receive() -> Exercise {
    Exercise::new(
        "receive",
        "Serve Receive",
        ExerciseLevel::Intermediate,
        vec![
            metric(
                "passes",
                10,
                MetricConfig::ratio(),
                &[("Passing", 80), ("Control", 20)],
            ),
            metric(
                "calls_ball",
                5,
                MetricConfig::checkbox(),
                &[("Communication", 100)],
            ),
            metric("hustle", 3, MetricConfig::slider(), &[]),
        ],
    )
    .expect("valid exercise")
}

pub(super) fn plan() -> EvaluationPlan {
    EvaluationPlan::from_exercises(
        PLAN,
        vec![serve_test(), approach_jump(), serve_receive()],
        vec![
            PlayerRef::named(ANA, "Ana Costa"),
            PlayerRef::named(BEA, "Bea Lund"),
            PlayerRef::new(CRIS),
        ],
    )
    .expect("valid plan")
    .with_name("Spring tryouts")
}

pub(super) fn running_session() -> EvaluationSession {
    let mut session = EvaluationSession::new(plan());
    session.start(ts(9)).expect("draft sessions can start");
    session
}

pub(super) fn entry(metric_id: &str, value: f64) -> MetricEntry {
    MetricEntry {
        metric_id: metric_id.into(),
        value,
        notes: None,
    }
}

/// Entries scoring every metric of `exercise` at `fraction` of its range.
pub(super) fn entries_at(exercise: &Exercise, fraction: f64) -> Vec<MetricEntry> {
    exercise
        .metrics()
        .iter()
        .map(|metric| {
            let value = match metric.kind() {
                MetricKind::Checkbox => {
                    if fraction >= 0.5 {
                        1.0
                    } else {
                        0.0
                    }
                }
                _ => (f64::from(metric.max_points()) * fraction).round(),
            };
            entry(metric.id().as_str(), value)
        })
        .collect()
}

/// Score every exercise of the plan for one player.
pub(super) fn score_player(session: &mut EvaluationSession, player: &str, fraction: f64) {
    let exercises: Vec<Exercise> = session.plan().exercises().cloned().collect();
    for exercise in exercises {
        session
            .submit(
                &PlayerId::new(player),
                exercise.id(),
                &entries_at(&exercise, fraction),
                ts(10),
            )
            .expect("scores accepted");
    }
}

pub(super) fn exercise_id(id: &str) -> ExerciseId {
    ExerciseId::new(id)
}

pub(super) fn scoring_config() -> ScoringConfig {
    ScoringConfig::standard()
}

pub(super) fn build_service() -> (
    EvaluationService<MemorySessions, MemoryHistory>,
    Arc<MemorySessions>,
    Arc<MemoryHistory>,
) {
    let sessions = Arc::new(MemorySessions::default());
    let history = Arc::new(MemoryHistory::default());
    let service = EvaluationService::new(sessions.clone(), history.clone(), scoring_config());
    (service, sessions, history)
}

#[derive(Default, Clone)]
pub(super) struct MemorySessions {
    pub(super) sessions: Arc<Mutex<BTreeMap<PlanId, EvaluationSession>>>,
}

impl SessionRepository for MemorySessions {
    fn insert(&self, session: EvaluationSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        if guard.contains_key(session.plan().id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.plan().id().clone(), session);
        Ok(())
    }

    fn update(&self, session: EvaluationSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        guard.insert(session.plan().id().clone(), session);
        Ok(())
    }

    fn fetch(&self, plan_id: &PlanId) -> Result<Option<EvaluationSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("repository mutex poisoned");
        Ok(guard.get(plan_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryHistory {
    records: Arc<Mutex<Vec<EvaluationRecord>>>,
    badges: Arc<Mutex<Vec<Badge>>>,
}

impl MemoryHistory {
    pub(super) fn all_records(&self) -> Vec<EvaluationRecord> {
        self.records.lock().expect("history mutex poisoned").clone()
    }

    pub(super) fn seed(&self, record: EvaluationRecord) {
        self.records
            .lock()
            .expect("history mutex poisoned")
            .push(record);
    }
}

impl PlayerHistoryRepository for MemoryHistory {
    fn history(&self, player_id: &PlayerId) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("history mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| &record.player_id == player_id)
            .cloned()
            .collect())
    }

    fn record_evaluation(&self, record: EvaluationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("history mutex poisoned");
        guard.retain(|entry| {
            !(entry.player_id == record.player_id && entry.plan_id == record.plan_id)
        });
        guard.push(record);
        Ok(())
    }

    fn badges(&self, player_id: &PlayerId) -> Result<Vec<Badge>, RepositoryError> {
        let guard = self.badges.lock().expect("badge mutex poisoned");
        Ok(guard
            .iter()
            .filter(|badge| &badge.player_id == player_id)
            .cloned()
            .collect())
    }

    fn award(&self, badges: &[Badge]) -> Result<(), RepositoryError> {
        self.badges
            .lock()
            .expect("badge mutex poisoned")
            .extend_from_slice(badges);
        Ok(())
    }
}

pub(super) struct UnavailableSessions;

impl SessionRepository for UnavailableSessions {
    fn insert(&self, _session: EvaluationSession) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _session: EvaluationSession) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _plan_id: &PlanId) -> Result<Option<EvaluationSession>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn plan_json() -> Value {
    serde_json::json!({
        "id": "league-night",
        "name": "League night check-in",
        "items": [
            {
                "order": 2,
                "exercise": {
                    "id": "block",
                    "name": "Block Footwork",
                    "level": "advanced",
                    "metrics": [
                        {
                            "id": "closes",
                            "name": "Closes the block",
                            "max_points": 4,
                            "config": { "type": "slider", "step": 1 },
                            "skill_weights": [{ "skill": "Blocking", "percentage": 100 }]
                        }
                    ]
                }
            },
            {
                "order": 1,
                "exercise": {
                    "id": "pass",
                    "name": "Platform Pass",
                    "metrics": [
                        {
                            "id": "platform",
                            "name": "Solid platform",
                            "max_points": 1,
                            "config": { "type": "checkbox" },
                            "skill_weights": [{ "skill": "Passing", "percentage": 100 }]
                        }
                    ]
                }
            }
        ],
        "players": [
            { "id": "p-1", "name": "Dee" },
            { "id": "p-2" }
        ]
    })
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
