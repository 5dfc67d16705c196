use crate::infra::AppState;
use crate::report::{build_report, EvaluationReport, PlayerSelection};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use volley_eval::error::AppError;
use volley_eval::evaluation::{
    evaluation_router, EvaluationPlan, EvaluationService, PlayerHistoryRepository, PlayerId,
    ScoringConfig, SessionRepository,
};

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluationReportRequest {
    pub(crate) plan: EvaluationPlan,
    #[serde(default)]
    pub(crate) scores_csv: Option<String>,
    #[serde(default)]
    pub(crate) at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) include_players: bool,
    #[serde(default)]
    pub(crate) player_id: Option<PlayerId>,
}

pub(crate) fn with_evaluation_routes<S, H>(service: Arc<EvaluationService<S, H>>) -> axum::Router
where
    S: SessionRepository + 'static,
    H: PlayerHistoryRepository + 'static,
{
    let config = service.config().clone();
    evaluation_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/evaluations/report",
            axum::routing::post(move |payload: Json<EvaluationReportRequest>| {
                evaluation_report_endpoint(config.clone(), payload)
            }),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn evaluation_report_endpoint(
    config: ScoringConfig,
    Json(payload): Json<EvaluationReportRequest>,
) -> Result<Json<EvaluationReport>, AppError> {
    let EvaluationReportRequest {
        plan,
        scores_csv,
        at,
        include_players,
        player_id,
    } = payload;

    let selection = match (player_id, include_players) {
        (Some(player), _) => PlayerSelection::One(player),
        (None, true) => PlayerSelection::All,
        (None, false) => PlayerSelection::None,
    };
    let scores = scores_csv.map(|csv| Cursor::new(csv.into_bytes()));
    let at = at.unwrap_or_else(Utc::now);

    let report = build_report(plan, scores, &config, at, selection)?;
    Ok(Json(report))
}
