use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use ops_monitor::monitoring::{monitoring_router, AlertPublisher, MonitoringService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_monitoring_routes<A>(service: Arc<MonitoringService<A>>) -> axum::Router
where
    A: AlertPublisher + 'static,
{
    monitoring_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    match state.ready_since.get() {
        Some(since) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "since": since })),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        ),
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
