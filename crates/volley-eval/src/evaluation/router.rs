use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::badges::{badge_catalog, CoachDecision};
use super::domain::{ExerciseId, PlanId, PlayerId};
use super::plan::EvaluationPlan;
use super::repository::{PlayerHistoryRepository, RepositoryError, SessionRepository, SessionView};
use super::service::{EvaluationService, EvaluationServiceError};
use super::session::{MetricEntry, SessionError, SessionStatus};

/// Batch of metric values for one player at one exercise station.
#[derive(Debug, Deserialize)]
pub struct ScoreSubmission {
    pub player_id: PlayerId,
    pub exercise_id: ExerciseId,
    pub scores: Vec<MetricEntry>,
    #[serde(default)]
    pub scored_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: SessionStatus,
}

#[derive(Debug, Deserialize)]
pub struct GroupSplit {
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct EvaluatorAssignment {
    pub evaluator: String,
}

/// Router builder exposing plan registration, live scoring and results.
pub fn evaluation_router<S, H>(service: Arc<EvaluationService<S, H>>) -> Router
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    Router::new()
        .route("/api/v1/evaluations/plans", post(register_handler::<S, H>))
        .route(
            "/api/v1/evaluations/plans/:plan_id",
            get(session_handler::<S, H>),
        )
        .route(
            "/api/v1/evaluations/plans/:plan_id/status",
            post(status_handler::<S, H>),
        )
        .route(
            "/api/v1/evaluations/plans/:plan_id/groups",
            post(groups_handler::<S, H>),
        )
        .route(
            "/api/v1/evaluations/plans/:plan_id/groups/:group/evaluator",
            post(evaluator_handler::<S, H>),
        )
        .route(
            "/api/v1/evaluations/plans/:plan_id/scores",
            post(scores_handler::<S, H>),
        )
        .route(
            "/api/v1/evaluations/plans/:plan_id/scores/import",
            post(import_handler::<S, H>),
        )
        .route(
            "/api/v1/evaluations/plans/:plan_id/progress",
            get(progress_handler::<S, H>),
        )
        .route(
            "/api/v1/evaluations/plans/:plan_id/summary",
            get(summary_handler::<S, H>),
        )
        .route(
            "/api/v1/evaluations/plans/:plan_id/players/:player_id/result",
            get(result_handler::<S, H>),
        )
        .route(
            "/api/v1/evaluations/plans/:plan_id/players/:player_id/finalize",
            post(finalize_handler::<S, H>),
        )
        .route(
            "/api/v1/evaluations/players/:player_id/badges",
            get(badges_handler::<S, H>),
        )
        .route("/api/v1/evaluations/badges", get(catalog_handler))
        .with_state(service)
}

fn error_response(error: EvaluationServiceError) -> Response {
    let status = match &error {
        EvaluationServiceError::PlanNotFound(_)
        | EvaluationServiceError::PlayerNotFound { .. }
        | EvaluationServiceError::Repository(RepositoryError::NotFound)
        | EvaluationServiceError::Session(SessionError::UnknownGroup { .. }) => StatusCode::NOT_FOUND,
        EvaluationServiceError::NothingToFinalize { .. }
        | EvaluationServiceError::Repository(RepositoryError::Conflict)
        | EvaluationServiceError::Session(
            SessionError::NotAcceptingScores { .. } | SessionError::InvalidTransition { .. },
        ) => StatusCode::CONFLICT,
        EvaluationServiceError::Session(_) | EvaluationServiceError::Import(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EvaluationServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        warn!(error = %error, "evaluation request failed");
    }

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn register_handler<S, H>(
    State(service): State<Arc<EvaluationService<S, H>>>,
    axum::Json(plan): axum::Json<EvaluationPlan>,
) -> Response
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    match service.register_plan(plan) {
        Ok(view) => (StatusCode::CREATED, axum::Json(view)).into_response(),
        Err(EvaluationServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({
                "error": "plan already registered",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn session_handler<S, H>(
    State(service): State<Arc<EvaluationService<S, H>>>,
    Path(plan_id): Path<String>,
) -> Response
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    match service.session(&PlanId(plan_id)) {
        Ok(session) => {
            let view = SessionView::from(&session);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn status_handler<S, H>(
    State(service): State<Arc<EvaluationService<S, H>>>,
    Path(plan_id): Path<String>,
    axum::Json(change): axum::Json<StatusChange>,
) -> Response
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    match service.set_status(&PlanId(plan_id), change.status, Utc::now()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn groups_handler<S, H>(
    State(service): State<Arc<EvaluationService<S, H>>>,
    Path(plan_id): Path<String>,
    axum::Json(split): axum::Json<GroupSplit>,
) -> Response
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    match service.split_groups(&PlanId(plan_id), split.count) {
        Ok(groups) => (StatusCode::OK, axum::Json(json!({ "groups": groups }))).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn evaluator_handler<S, H>(
    State(service): State<Arc<EvaluationService<S, H>>>,
    Path((plan_id, group)): Path<(String, String)>,
    axum::Json(assignment): axum::Json<EvaluatorAssignment>,
) -> Response
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    match service.assign_evaluator(&PlanId(plan_id), &group, &assignment.evaluator) {
        Ok(group) => (StatusCode::OK, axum::Json(group)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn scores_handler<S, H>(
    State(service): State<Arc<EvaluationService<S, H>>>,
    Path(plan_id): Path<String>,
    axum::Json(submission): axum::Json<ScoreSubmission>,
) -> Response
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    let plan_id = PlanId(plan_id);
    let at = submission.scored_at.unwrap_or_else(Utc::now);
    match service.submit_scores(
        &plan_id,
        &submission.player_id,
        &submission.exercise_id,
        &submission.scores,
        at,
    ) {
        Ok(records) => {
            let payload = json!({
                "plan_id": plan_id,
                "player_id": submission.player_id,
                "exercise_id": submission.exercise_id,
                "recorded": records,
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(EvaluationServiceError::Session(error)) => {
            warn!(%plan_id, player_id = %submission.player_id, %error, "score submission rejected");
            error_response(EvaluationServiceError::Session(error))
        }
        Err(other) => error_response(other),
    }
}

/// Accepts a raw CSV export in the request body.
pub(crate) async fn import_handler<S, H>(
    State(service): State<Arc<EvaluationService<S, H>>>,
    Path(plan_id): Path<String>,
    body: String,
) -> Response
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    let plan_id = PlanId(plan_id);
    match service.import_scores(&plan_id, body.as_bytes(), Utc::now()) {
        Ok(rows) => {
            let payload = json!({
                "plan_id": plan_id,
                "imported_rows": rows,
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(EvaluationServiceError::Import(error)) => {
            warn!(%plan_id, %error, "score import rejected");
            error_response(EvaluationServiceError::Import(error))
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn progress_handler<S, H>(
    State(service): State<Arc<EvaluationService<S, H>>>,
    Path(plan_id): Path<String>,
) -> Response
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    match service.progress(&PlanId(plan_id)) {
        Ok(progress) => (StatusCode::OK, axum::Json(progress)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn summary_handler<S, H>(
    State(service): State<Arc<EvaluationService<S, H>>>,
    Path(plan_id): Path<String>,
) -> Response
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    match service.summary(&PlanId(plan_id)) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn result_handler<S, H>(
    State(service): State<Arc<EvaluationService<S, H>>>,
    Path((plan_id, player_id)): Path<(String, String)>,
) -> Response
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    match service.player_result(&PlanId(plan_id), &PlayerId(player_id)) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(other) => error_response(other),
    }
}

/// An empty body accepts the suggested outcome; otherwise the body is a [`CoachDecision`].
pub(crate) async fn finalize_handler<S, H>(
    State(service): State<Arc<EvaluationService<S, H>>>,
    Path((plan_id, player_id)): Path<(String, String)>,
    body: Bytes,
) -> Response
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    let decision = if body.iter().all(u8::is_ascii_whitespace) {
        CoachDecision::default()
    } else {
        match serde_json::from_slice::<CoachDecision>(&body) {
            Ok(decision) => decision,
            Err(error) => {
                warn!(%plan_id, %player_id, %error, "coach decision rejected");
                let payload = json!({ "error": format!("invalid coach decision: {error}") });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
        }
    };

    match service.finalize(&PlanId(plan_id), &PlayerId(player_id), decision, Utc::now()) {
        Ok(finalized) => (StatusCode::OK, axum::Json(finalized)).into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn badges_handler<S, H>(
    State(service): State<Arc<EvaluationService<S, H>>>,
    Path(player_id): Path<String>,
) -> Response
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    let player_id = PlayerId(player_id);
    match service.player_badges(&player_id) {
        Ok(badges) => {
            let payload = json!({
                "player_id": player_id,
                "badges": badges,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(other) => error_response(other),
    }
}

pub(crate) async fn catalog_handler() -> Response {
    (StatusCode::OK, axum::Json(badge_catalog())).into_response()
}
