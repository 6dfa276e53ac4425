use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::monitoring::alerts::{AlertError, AlertPublisher, MonitoringAlert};
use crate::monitoring::domain::{
    ComparisonDirection, HistoryPoint, MetricHistory, MetricReading, Rule, RuleId,
    ScopeSelector, Severity,
};
use crate::monitoring::{
    monitoring_router, EvaluationConfig, EvaluationEngine, MonitoringService, RuleBook,
};

pub(super) fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0)
        .single()
        .expect("valid timestamp")
        + chrono::Duration::minutes(minutes)
}

pub(super) fn reading(metric: &str, scope: &str, value: f64) -> MetricReading {
    MetricReading::new(metric, scope, value)
}

pub(super) fn rule(
    id: u32,
    metric: &str,
    direction: ComparisonDirection,
    threshold: f64,
    severity: Severity,
    applies_to: ScopeSelector,
) -> Rule {
    Rule {
        id: RuleId(id),
        name: format!("rule-{id}"),
        metric: metric.to_string(),
        direction,
        threshold,
        severity,
        enabled: true,
        applies_to,
        window_secs: None,
    }
}

pub(super) fn occupancy_rule() -> Rule {
    Rule {
        name: "High Occupancy Alert".to_string(),
        ..rule(
            1,
            "occupancy",
            ComparisonDirection::Above,
            85.0,
            Severity::Critical,
            ScopeSelector::only(["Emergency", "ICU"]),
        )
    }
}

pub(super) fn trend_rule(id: u32, metric: &str, direction: ComparisonDirection) -> Rule {
    Rule {
        window_secs: Some(3600),
        ..rule(id, metric, direction, 0.0, Severity::Warning, ScopeSelector::All)
    }
}

pub(super) fn history_of(metric: &str, scope: &str, points: &[(i64, f64)]) -> MetricHistory {
    let mut history = MetricHistory::new();
    for (minutes, value) in points {
        history.push(
            metric,
            scope,
            HistoryPoint {
                at: at(*minutes),
                value: *value,
            },
        );
    }
    history
}

pub(super) fn engine() -> EvaluationEngine {
    EvaluationEngine::new(EvaluationConfig::default())
}

#[derive(Default, Clone)]
pub(super) struct MemoryAlerts {
    events: Arc<Mutex<Vec<MonitoringAlert>>>,
}

impl MemoryAlerts {
    pub(super) fn events(&self) -> Vec<MonitoringAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl AlertPublisher for MemoryAlerts {
    fn publish(&self, alert: MonitoringAlert) -> Result<(), AlertError> {
        self.events
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(super) struct OfflineAlerts;

impl AlertPublisher for OfflineAlerts {
    fn publish(&self, _alert: MonitoringAlert) -> Result<(), AlertError> {
        Err(AlertError::Transport("pager offline".to_string()))
    }
}

/// Rejects alerts for one scope and keeps the rest.
pub(super) struct FlakyAlerts {
    failing_scope: String,
    delivered: Mutex<Vec<MonitoringAlert>>,
}

impl FlakyAlerts {
    pub(super) fn failing_for(scope: &str) -> Self {
        Self {
            failing_scope: scope.to_string(),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn delivered(&self) -> Vec<MonitoringAlert> {
        self.delivered.lock().expect("alert mutex poisoned").clone()
    }
}

impl AlertPublisher for FlakyAlerts {
    fn publish(&self, alert: MonitoringAlert) -> Result<(), AlertError> {
        if alert.scope == self.failing_scope {
            return Err(AlertError::Transport(format!("{} pager offline", alert.scope)));
        }
        self.delivered
            .lock()
            .expect("alert mutex poisoned")
            .push(alert);
        Ok(())
    }
}

pub(super) fn build_service() -> (MonitoringService<MemoryAlerts>, Arc<MemoryAlerts>) {
    let alerts = Arc::new(MemoryAlerts::default());
    let service = MonitoringService::new(
        RuleBook::hospital_defaults(),
        alerts.clone(),
        EvaluationConfig::default(),
        Duration::from_secs(2 * 3600),
    );
    (service, alerts)
}

pub(super) fn monitoring_router_with_service(
    service: MonitoringService<MemoryAlerts>,
) -> axum::Router {
    monitoring_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
