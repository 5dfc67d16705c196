use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use volley_eval::evaluation::{
    parse_timestamp, Badge, EvaluationRecord, EvaluationSession, PlanId, PlayerHistoryRepository,
    PlayerId, RepositoryError, SessionRepository,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{what} mutex poisoned")))
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<PlanId, EvaluationSession>>>,
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, session: EvaluationSession) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.sessions, "session")?;
        if guard.contains_key(session.plan().id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.plan().id().clone(), session);
        Ok(())
    }

    fn update(&self, session: EvaluationSession) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.sessions, "session")?;
        if guard.contains_key(session.plan().id()) {
            guard.insert(session.plan().id().clone(), session);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, plan_id: &PlanId) -> Result<Option<EvaluationSession>, RepositoryError> {
        let guard = lock(&self.sessions, "session")?;
        Ok(guard.get(plan_id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryHistoryRepository {
    records: Arc<Mutex<HashMap<PlayerId, Vec<EvaluationRecord>>>>,
    badges: Arc<Mutex<HashMap<PlayerId, Vec<Badge>>>>,
}

impl PlayerHistoryRepository for InMemoryHistoryRepository {
    fn history(&self, player_id: &PlayerId) -> Result<Vec<EvaluationRecord>, RepositoryError> {
        let guard = lock(&self.records, "history")?;
        Ok(guard.get(player_id).cloned().unwrap_or_default())
    }

    fn record_evaluation(&self, record: EvaluationRecord) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records, "history")?;
        let entries = guard.entry(record.player_id.clone()).or_default();
        entries.retain(|entry| entry.plan_id != record.plan_id);
        entries.push(record);
        Ok(())
    }

    fn badges(&self, player_id: &PlayerId) -> Result<Vec<Badge>, RepositoryError> {
        let guard = lock(&self.badges, "badge")?;
        Ok(guard.get(player_id).cloned().unwrap_or_default())
    }

    fn award(&self, badges: &[Badge]) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.badges, "badge")?;
        for badge in badges {
            guard
                .entry(badge.player_id.clone())
                .or_default()
                .push(badge.clone());
        }
        Ok(())
    }
}

/// Clap value parser over the importer's timestamp formats.
pub(crate) fn timestamp_arg(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw).ok_or_else(|| {
        format!("'{raw}' is not an RFC 3339 timestamp, `YYYY-MM-DD HH:MM:SS` or a date")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use volley_eval::evaluation::{Outcome, PlayerRef};
    use volley_eval::evaluation::{EvaluationId, EvaluationPlan, Exercise, ExerciseLevel};
    use volley_eval::evaluation::{Metric, MetricConfig};

    fn session(id: &str) -> EvaluationSession {
        let metric =
            Metric::new("touch", "Touch", 3, MetricConfig::slider(), vec![]).expect("metric");
        let exercise = Exercise::new("drill", "Drill", ExerciseLevel::Beginner, vec![metric])
            .expect("exercise");
        let plan = EvaluationPlan::from_exercises(id, vec![exercise], vec![PlayerRef::new("p-1")])
            .expect("plan");
        EvaluationSession::new(plan)
    }

    fn record(plan: &str, overall: f64) -> EvaluationRecord {
        EvaluationRecord {
            evaluation_id: EvaluationId::new(format!("eval-{plan}")),
            plan_id: PlanId::new(plan),
            player_id: PlayerId::new("p-1"),
            overall: Some(overall),
            outcome: Outcome::Passed,
            suggested_outcome: Outcome::Passed,
            coach_notes: None,
            completed_at: Utc
                .with_ymd_and_hms(2026, 3, 14, 10, 0, 0)
                .single()
                .expect("valid timestamp"),
            highest_level: None,
        }
    }

    #[test]
    fn session_repository_rejects_duplicates_and_unknown_updates() {
        let repository = InMemorySessionRepository::default();
        repository.insert(session("a")).expect("first insert");

        assert!(matches!(
            repository.insert(session("a")),
            Err(RepositoryError::Conflict)
        ));
        assert!(matches!(
            repository.update(session("b")),
            Err(RepositoryError::NotFound)
        ));
        assert!(repository
            .fetch(&PlanId::new("a"))
            .expect("fetch")
            .is_some());
    }

    #[test]
    fn history_repository_replaces_entries_for_the_same_plan() {
        let repository = InMemoryHistoryRepository::default();
        repository
            .record_evaluation(record("spring", 60.0))
            .expect("recorded");
        repository
            .record_evaluation(record("fall", 70.0))
            .expect("recorded");
        repository
            .record_evaluation(record("spring", 80.0))
            .expect("replaced");

        let history = repository.history(&PlayerId::new("p-1")).expect("history");
        assert_eq!(history.len(), 2);
        assert!(history
            .iter()
            .any(|entry| entry.plan_id == PlanId::new("spring") && entry.overall == Some(80.0)));
        assert!(repository
            .history(&PlayerId::new("p-2"))
            .expect("history")
            .is_empty());
    }

    #[test]
    fn timestamps_accept_dates_and_datetimes() {
        let expected = Utc
            .with_ymd_and_hms(2026, 3, 14, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(timestamp_arg("2026-03-14"), Ok(expected));
        assert_eq!(timestamp_arg("2026-03-14T00:00:00Z"), Ok(expected));
        let error = timestamp_arg("next tuesday").expect_err("not a timestamp");
        assert!(error.contains("next tuesday"));
    }
}
