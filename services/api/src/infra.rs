use metrics_exporter_prometheus::PrometheusHandle;
use ops_monitor::config::MonitoringConfig;
use ops_monitor::monitoring::{
    AlertError, AlertPublisher, MonitoringAlert, MonitoringService, RuleBook,
};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) ready_since: Arc<OnceLock<DateTime<Utc>>>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

impl AppState {
    pub(crate) fn new(metrics: PrometheusHandle) -> Self {
        Self {
            ready_since: Arc::new(OnceLock::new()),
            metrics: Arc::new(metrics),
        }
    }

    /// Records the first moment the listener accepted connections.
    pub(crate) fn mark_ready(&self, at: DateTime<Utc>) {
        let _ = self.ready_since.set(at);
    }
}

/// Keeps raised alerts in memory and mirrors them to the log.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAlertPublisher {
    events: Arc<Mutex<Vec<MonitoringAlert>>>,
}

impl AlertPublisher for InMemoryAlertPublisher {
    fn publish(&self, alert: MonitoringAlert) -> Result<(), AlertError> {
        warn!(
            rule_id = %alert.rule_id,
            scope = %alert.scope,
            severity = alert.severity.label(),
            trigger = %alert.trigger,
            "{}",
            alert.rule_name
        );
        let mut guard = self
            .events
            .lock()
            .map_err(|_| AlertError::Transport("alert buffer poisoned".to_string()))?;
        guard.push(alert);
        Ok(())
    }
}

impl InMemoryAlertPublisher {
    pub(crate) fn events(&self) -> Vec<MonitoringAlert> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn build_monitoring_service(
    config: &MonitoringConfig,
) -> (
    Arc<MonitoringService<InMemoryAlertPublisher>>,
    Arc<InMemoryAlertPublisher>,
) {
    let alerts = Arc::new(InMemoryAlertPublisher::default());
    let service = Arc::new(MonitoringService::new(
        RuleBook::hospital_defaults(),
        alerts.clone(),
        config.evaluation_config(),
        config.history_retention,
    ));
    (service, alerts)
}
