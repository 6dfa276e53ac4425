use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::alerts::AlertPublisher;
use super::domain::{CompoundRule, HistoryPoint, MetricHistory, MetricReading, Rule, RuleId};
use super::evaluation::EvaluationError;
use super::rulebook::RuleBookError;
use super::service::{MonitoringService, MonitoringServiceError, RuleUpdate};

/// Stateless evaluation request: readings, rules, and optional history.
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub readings: Vec<MetricReading>,
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub history: Vec<HistorySeries>,
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

/// Stateless compound evaluation request.
#[derive(Debug, Deserialize)]
pub struct CompoundEvaluateRequest {
    pub readings: Vec<MetricReading>,
    pub rules: Vec<CompoundRule>,
    #[serde(default)]
    pub history: Vec<HistorySeries>,
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CompoundToggle {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistorySeries {
    pub metric: String,
    pub scope: String,
    pub points: Vec<HistoryPoint>,
}

#[derive(Debug, Deserialize)]
pub struct SnapshotRequest {
    pub readings: Vec<MetricReading>,
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub metric: String,
    pub value: f64,
}

/// Router builder exposing evaluation, ingestion, and rule management.
pub fn monitoring_router<A>(service: Arc<MonitoringService<A>>) -> Router
where
    A: AlertPublisher + 'static,
{
    Router::new()
        .route("/api/v1/monitoring/evaluate", post(evaluate_handler::<A>))
        .route(
            "/api/v1/monitoring/evaluate/compound",
            post(evaluate_compound_handler::<A>),
        )
        .route("/api/v1/monitoring/snapshots", post(snapshot_handler::<A>))
        .route("/api/v1/monitoring/rules", get(rules_handler::<A>))
        .route(
            "/api/v1/monitoring/rules/:rule_id",
            patch(update_rule_handler::<A>),
        )
        .route(
            "/api/v1/monitoring/compound-rules",
            get(compound_rules_handler::<A>),
        )
        .route(
            "/api/v1/monitoring/compound-rules/:rule_id",
            patch(update_compound_rule_handler::<A>),
        )
        .route("/api/v1/monitoring/status", post(status_handler::<A>))
        .with_state(service)
}

pub(crate) async fn evaluate_handler<A>(
    State(service): State<Arc<MonitoringService<A>>>,
    axum::Json(request): axum::Json<EvaluateRequest>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let history = collect_history(&request.history);
    let as_of = request.as_of.unwrap_or_else(Utc::now);

    match service
        .engine()
        .evaluate(&request.readings, &request.rules, &history, as_of)
    {
        Ok(results) => (StatusCode::OK, axum::Json(results)).into_response(),
        Err(error) => evaluation_error_response(error),
    }
}

pub(crate) async fn evaluate_compound_handler<A>(
    State(service): State<Arc<MonitoringService<A>>>,
    axum::Json(request): axum::Json<CompoundEvaluateRequest>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let history = collect_history(&request.history);
    let as_of = request.as_of.unwrap_or_else(Utc::now);

    match service
        .engine()
        .evaluate_compound(&request.readings, &request.rules, &history, as_of)
    {
        Ok(results) => (StatusCode::OK, axum::Json(results)).into_response(),
        Err(error) => evaluation_error_response(error),
    }
}

fn collect_history(series: &[HistorySeries]) -> MetricHistory {
    let mut history = MetricHistory::new();
    for entry in series {
        for point in &entry.points {
            history.push(&entry.metric, &entry.scope, *point);
        }
    }
    history
}

pub(crate) async fn snapshot_handler<A>(
    State(service): State<Arc<MonitoringService<A>>>,
    axum::Json(request): axum::Json<SnapshotRequest>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let at = request.at.unwrap_or_else(Utc::now);
    match service.ingest(request.readings, at) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(MonitoringServiceError::AlertDelivery { failures, report }) => {
            let payload = json!({
                "error": format!("{} alert(s) failed to publish", failures.len()),
                "failures": failures.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "report": report,
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn compound_rules_handler<A>(
    State(service): State<Arc<MonitoringService<A>>>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    (StatusCode::OK, axum::Json(service.compound_rules())).into_response()
}

pub(crate) async fn update_compound_rule_handler<A>(
    State(service): State<Arc<MonitoringService<A>>>,
    Path(rule_id): Path<u32>,
    axum::Json(toggle): axum::Json<CompoundToggle>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    match service.set_compound_enabled(RuleId(rule_id), toggle.enabled) {
        Ok(rule) => (StatusCode::OK, axum::Json(rule)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn rules_handler<A>(State(service): State<Arc<MonitoringService<A>>>) -> Response
where
    A: AlertPublisher + 'static,
{
    (StatusCode::OK, axum::Json(service.rules())).into_response()
}

pub(crate) async fn update_rule_handler<A>(
    State(service): State<Arc<MonitoringService<A>>>,
    Path(rule_id): Path<u32>,
    axum::Json(update): axum::Json<RuleUpdate>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    match service.update_rule(RuleId(rule_id), update) {
        Ok(rule) => (StatusCode::OK, axum::Json(rule)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn status_handler<A>(
    State(service): State<Arc<MonitoringService<A>>>,
    axum::Json(request): axum::Json<StatusRequest>,
) -> Response
where
    A: AlertPublisher + 'static,
{
    let status = service.status_of(&request.metric, request.value);
    let payload = json!({
        "metric": request.metric,
        "value": request.value,
        "status": status.map(|level| level.label()),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn evaluation_error_response(error: EvaluationError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}

fn service_error_response(error: MonitoringServiceError) -> Response {
    let status = match &error {
        MonitoringServiceError::Evaluation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MonitoringServiceError::RuleBook(RuleBookError::UnknownRule(_)) => StatusCode::NOT_FOUND,
        MonitoringServiceError::RuleBook(RuleBookError::DuplicateRule(_)) => StatusCode::CONFLICT,
        MonitoringServiceError::RuleBook(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MonitoringServiceError::AlertDelivery { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
