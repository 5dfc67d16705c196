use std::sync::Arc;

use super::common::*;
use crate::evaluation::badges::{BadgeType, CoachDecision, EvaluationRecord};
use crate::evaluation::domain::{EvaluationId, Outcome, PlanId, PlayerId};
use crate::evaluation::import::ScoreImportError;
use crate::evaluation::repository::RepositoryError;
use crate::evaluation::service::{EvaluationService, EvaluationServiceError};
use crate::evaluation::session::{SessionError, SessionStatus};

fn plan_id() -> PlanId {
    PlanId::new(PLAN)
}

fn started_service() -> (
    EvaluationService<MemorySessions, MemoryHistory>,
    Arc<MemoryHistory>,
) {
    let (service, _, history) = build_service();
    service.register_plan(plan()).expect("plan registered");
    service
        .set_status(&plan_id(), SessionStatus::Running, ts(9))
        .expect("session started");
    (service, history)
}

fn score_everything(
    service: &EvaluationService<MemorySessions, MemoryHistory>,
    player: &str,
    fraction: f64,
) {
    for exercise in plan().exercises() {
        service
            .submit_scores(
                &plan_id(),
                &PlayerId::new(player),
                exercise.id(),
                &entries_at(exercise, fraction),
                ts(10),
            )
            .expect("scores accepted");
    }
}

#[test]
fn registering_a_plan_twice_conflicts() {
    let (service, _, _) = build_service();

    let view = service.register_plan(plan()).expect("first registration");
    assert_eq!(view.plan_id, plan_id());
    assert_eq!(view.status, "draft");
    assert_eq!(view.players, 3);
    assert_eq!(view.exercises, 3);

    match service.register_plan(plan()) {
        Err(EvaluationServiceError::Repository(RepositoryError::Conflict)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn scores_submitted_before_start_are_rejected() {
    let (service, _, _) = build_service();
    service.register_plan(plan()).expect("registered");

    match service.submit_scores(
        &plan_id(),
        &PlayerId::new(ANA),
        &exercise_id("serve"),
        &[entry("in_zone", 5.0)],
        ts(9),
    ) {
        Err(EvaluationServiceError::Session(SessionError::NotAcceptingScores { status })) => {
            assert_eq!(status, SessionStatus::Draft)
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn submitted_scores_are_persisted_between_calls() {
    let (service, _) = started_service();
    score_everything(&service, ANA, 1.0);

    let progress = service.progress(&plan_id()).expect("progress");
    assert_eq!(progress.total_scored, 3);

    let summary = service.summary(&plan_id()).expect("summary");
    assert_eq!(summary.passed_count, 1);
    assert_eq!(summary.pending_count, 2);

    let groups = service.split_groups(&plan_id(), 3).expect("split");
    assert_eq!(groups.len(), 3);
    let session = service.session(&plan_id()).expect("session");
    assert_eq!(session.groups().len(), 3);
    assert_eq!(session.sheet().len(), 7);
}

#[test]
fn finalizing_awards_badges_once() {
    let (service, history) = started_service();
    score_everything(&service, ANA, 1.0);
    let ana = PlayerId::new(ANA);

    let first = service
        .finalize(&plan_id(), &ana, CoachDecision::default(), ts(12))
        .expect("finalized");
    assert_eq!(first.record.outcome, Outcome::Passed);
    assert!(!first.record.is_overruled());
    assert!(first
        .record
        .overall
        .is_some_and(|overall| (overall - 100.0).abs() < 1e-9));
    assert!(first.record.evaluation_id.as_str().starts_with("eval-"));
    let awarded: Vec<BadgeType> = first.awarded.iter().map(|badge| badge.badge_type).collect();
    assert!(awarded.contains(&BadgeType::Effort));
    assert!(awarded.contains(&BadgeType::Star));
    assert!(first
        .awarded
        .iter()
        .all(|badge| badge.source_evaluation_id.as_ref() == Some(&first.record.evaluation_id)));

    let second = service
        .finalize(&plan_id(), &ana, CoachDecision::default(), ts(13))
        .expect("finalized again");
    assert!(second.awarded.is_empty());
    assert_eq!(second.record.evaluation_id, first.record.evaluation_id);

    let records = history.all_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].completed_at, ts(13));

    let held = service.player_badges(&ana).expect("badges");
    assert_eq!(held.len(), first.awarded.len());
    let result = service.player_result(&plan_id(), &ana).expect("result");
    assert_eq!(result.badges.len(), held.len());
}

#[test]
fn coach_can_overrule_the_suggested_outcome() {
    let (service, history) = started_service();
    score_everything(&service, ANA, 1.0);
    let ana = PlayerId::new(ANA);

    let held_back = service
        .finalize(
            &plan_id(),
            &ana,
            CoachDecision::overrule(Outcome::Pending).with_notes("  Re-test the float serve  "),
            ts(12),
        )
        .expect("finalized");

    assert_eq!(held_back.record.outcome, Outcome::Pending);
    assert_eq!(held_back.record.suggested_outcome, Outcome::Passed);
    assert!(held_back.record.is_overruled());
    assert_eq!(
        held_back.record.coach_notes.as_deref(),
        Some("Re-test the float serve")
    );
    assert_eq!(held_back.aggregate.outcome, Some(Outcome::Pending));
    assert_eq!(
        held_back
            .aggregate
            .threshold_check
            .as_ref()
            .map(|check| check.suggested_outcome),
        Some(Outcome::Passed)
    );
    let awarded: Vec<BadgeType> = held_back.awarded.iter().map(|badge| badge.badge_type).collect();
    assert!(awarded.contains(&BadgeType::Star));
    assert!(!awarded.contains(&BadgeType::Effort));

    let decided = service
        .finalize(&plan_id(), &ana, CoachDecision::overrule(Outcome::Failed), ts(13))
        .expect("finalized again");
    assert_eq!(decided.record.outcome, Outcome::Failed);
    assert_eq!(decided.record.coach_notes, None);
    let awarded: Vec<BadgeType> = decided.awarded.iter().map(|badge| badge.badge_type).collect();
    assert_eq!(awarded, vec![BadgeType::Effort]);

    let records = history.all_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, Outcome::Failed);
    assert_eq!(records[0].suggested_outcome, Outcome::Passed);
}

#[test]
fn earlier_plans_feed_improvement_badges() {
    let (service, history) = started_service();
    history.seed(EvaluationRecord {
        evaluation_id: EvaluationId::new("eval-fall"),
        plan_id: PlanId::new("fall-2025"),
        player_id: PlayerId::new(ANA),
        overall: Some(55.0),
        outcome: Outcome::Failed,
        suggested_outcome: Outcome::Failed,
        coach_notes: None,
        completed_at: ts(1),
        highest_level: None,
    });
    score_everything(&service, ANA, 1.0);

    let finalized = service
        .finalize(&plan_id(), &PlayerId::new(ANA), CoachDecision::default(), ts(12))
        .expect("finalized");

    assert!(finalized
        .awarded
        .iter()
        .any(|badge| badge.badge_type == BadgeType::Improvement));
    assert_eq!(history.all_records().len(), 2);
}

#[test]
fn finalizing_without_scores_is_rejected() {
    let (service, history) = started_service();

    match service.finalize(
        &plan_id(),
        &PlayerId::new(BEA),
        CoachDecision::default(),
        ts(12),
    ) {
        Err(EvaluationServiceError::NothingToFinalize { player, .. }) => {
            assert_eq!(player, PlayerId::new(BEA))
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(history.all_records().is_empty());
}

#[test]
fn unknown_plans_and_players_are_reported() {
    let (service, _) = started_service();

    match service.progress(&PlanId::new("missing")) {
        Err(EvaluationServiceError::PlanNotFound(plan)) => {
            assert_eq!(plan, PlanId::new("missing"))
        }
        other => panic!("unexpected result: {other:?}"),
    }

    match service.aggregate(&plan_id(), &PlayerId::new("p-ghost")) {
        Err(EvaluationServiceError::PlayerNotFound { player, .. }) => {
            assert_eq!(player, PlayerId::new("p-ghost"))
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn storage_failures_surface_as_repository_errors() {
    let service = EvaluationService::new(
        Arc::new(UnavailableSessions),
        Arc::new(MemoryHistory::default()),
        scoring_config(),
    );

    match service.register_plan(plan()) {
        Err(EvaluationServiceError::Repository(RepositoryError::Unavailable(reason))) => {
            assert_eq!(reason, "database offline")
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(
        service.summary(&plan_id()),
        Err(EvaluationServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}

#[test]
fn imported_exports_land_in_the_running_session() {
    let (service, _) = started_service();
    let csv = "Player,Exercise,Metric,Value,Scored At\n\
Ana Costa,Serve Test,in zone,9,2026-03-14T10:30:00Z\n\
p-ana,serve,toss,1,\n";

    let rows = service
        .import_scores(&plan_id(), csv.as_bytes(), ts(11))
        .expect("import applies");

    assert_eq!(rows, 2);
    let session = service.session(&plan_id()).expect("session");
    let toss = session
        .sheet()
        .get(
            &PlayerId::new(ANA),
            &exercise_id("serve"),
            &crate::evaluation::domain::MetricId::new("toss"),
        )
        .expect("toss imported");
    assert_eq!(toss.value, 5.0);
    assert_eq!(toss.scored_at, ts(11));
    assert_eq!(service.progress(&plan_id()).expect("progress").total_scored, 1);
}

#[test]
fn imports_follow_the_session_lifecycle_and_stay_atomic() {
    let (service, _, _) = build_service();
    service.register_plan(plan()).expect("registered");
    let csv = "Player,Exercise,Metric,Value,Scored At\np-ana,serve,toss,1,\n";

    assert!(matches!(
        service.import_scores(&plan_id(), csv.as_bytes(), ts(11)),
        Err(EvaluationServiceError::Session(SessionError::NotAcceptingScores { .. }))
    ));

    service
        .set_status(&plan_id(), SessionStatus::Running, ts(9))
        .expect("started");
    let partial = "Player,Exercise,Metric,Value,Scored At\n\
p-ana,serve,toss,1,\n\
p-ana,serve,spin,1,\n";
    match service.import_scores(&plan_id(), partial.as_bytes(), ts(11)) {
        Err(EvaluationServiceError::Import(ScoreImportError::UnknownMetric { line, .. })) => {
            assert_eq!(line, 3)
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(service
        .session(&plan_id())
        .expect("session")
        .sheet()
        .is_empty());
}
