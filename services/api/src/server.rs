use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryHistoryRepository, InMemorySessionRepository};
use crate::routes::with_evaluation_routes;
use axum::{Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use volley_eval::config::AppConfig;
use volley_eval::error::AppError;
use volley_eval::evaluation::{EvaluationService, ScoringConfig};
use volley_eval::telemetry;

pub(crate) async fn run(args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    args.apply(&mut config.server);
    telemetry::init(&config.telemetry)?;

    let ready = Arc::new(AtomicBool::new(false));
    let app = build_app(config.scoring.resolve()?, ready.clone());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    ready.store(true, Ordering::Release);

    info!(?config.environment, %addr, scoring = ?config.scoring, "evaluation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_app(scoring: ScoringConfig, ready: Arc<AtomicBool>) -> Router {
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let state = AppState {
        readiness: ready,
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(EvaluationService::new(
        Arc::new(InMemorySessionRepository::default()),
        Arc::new(InMemoryHistoryRepository::default()),
        scoring,
    ));

    with_evaluation_routes(service)
        .layer(Extension(state))
        .layer(prometheus_layer)
}
