use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::alerts::{AlertError, AlertPublisher, MonitoringAlert};
use super::catalog::MetricCatalog;
use super::domain::{
    CompoundResult, CompoundRule, EvaluationResult, MetricReading, Rule, RuleId,
};
use super::evaluation::{EvaluationConfig, EvaluationEngine, EvaluationError};
use super::history::HistoryBuffer;
use super::rulebook::{RuleBook, RuleBookError};
use super::status::StatusLevel;

/// Service composing the rule book, rolling history, engine, and alert hook.
pub struct MonitoringService<A> {
    rules: Mutex<RuleBook>,
    history: Mutex<HistoryBuffer>,
    engine: EvaluationEngine,
    alerts: Arc<A>,
}

/// Everything one snapshot produced.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SnapshotReport {
    pub results: Vec<EvaluationResult>,
    pub compound: Vec<CompoundResult>,
}

impl SnapshotReport {
    pub fn triggered_count(&self) -> usize {
        self.results.iter().filter(|result| result.triggered).count()
            + self.compound.iter().filter(|result| result.triggered).count()
    }
}

/// Partial rule edit applied by [`MonitoringService::update_rule`].
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct RuleUpdate {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub threshold: Option<f64>,
}

impl<A> MonitoringService<A>
where
    A: AlertPublisher + 'static,
{
    pub fn new(
        rules: RuleBook,
        alerts: Arc<A>,
        config: EvaluationConfig,
        retention: Duration,
    ) -> Self {
        Self {
            rules: Mutex::new(rules),
            history: Mutex::new(HistoryBuffer::new(retention)),
            engine: EvaluationEngine::new(config),
            alerts,
        }
    }

    pub fn engine(&self) -> &EvaluationEngine {
        &self.engine
    }

    /// Record a snapshot, evaluate it against the current rules, and publish
    /// an alert for every triggered result.
    ///
    /// Every alert is attempted even when some fail. Failures come back as
    /// [`MonitoringServiceError::AlertDelivery`], which still carries the
    /// report; the snapshot stays recorded either way.
    pub fn ingest(
        &self,
        readings: Vec<MetricReading>,
        at: DateTime<Utc>,
    ) -> Result<SnapshotReport, MonitoringServiceError> {
        let (rules, compound_rules) = {
            let book = self.lock_rules();
            (book.rules(), book.compound_rules())
        };

        let report = {
            let mut history = self.lock_history();
            // A rejected snapshot must leave no trace in the history.
            self.engine.validate(&readings, &rules)?;
            self.engine.validate_compound(&compound_rules)?;
            history.record(&readings, at);
            history.prune(at);
            SnapshotReport {
                results: self
                    .engine
                    .evaluate(&readings, &rules, history.history(), at)?,
                compound: self.engine.evaluate_compound(
                    &readings,
                    &compound_rules,
                    history.history(),
                    at,
                )?,
            }
        };

        debug!(
            readings = readings.len(),
            results = report.results.len(),
            compound = report.compound.len(),
            triggered = report.triggered_count(),
            "snapshot evaluated"
        );

        let alerts = report
            .results
            .iter()
            .filter(|result| result.triggered)
            .map(|result| MonitoringAlert::from_result(result, at))
            .chain(
                report
                    .compound
                    .iter()
                    .filter(|result| result.triggered)
                    .map(|result| MonitoringAlert::from_compound(result, at)),
            );

        let mut failures = Vec::new();
        for alert in alerts {
            info!(
                rule_id = %alert.rule_id,
                scope = %alert.scope,
                severity = alert.severity.label(),
                "alert raised"
            );
            if let Err(err) = self.alerts.publish(alert) {
                warn!(error = %err, "alert publish failed");
                failures.push(err);
            }
        }

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(MonitoringServiceError::AlertDelivery { failures, report })
        }
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.lock_rules().rules()
    }

    pub fn compound_rules(&self) -> Vec<CompoundRule> {
        self.lock_rules().compound_rules()
    }

    pub fn set_compound_enabled(
        &self,
        id: RuleId,
        enabled: bool,
    ) -> Result<CompoundRule, MonitoringServiceError> {
        let mut book = self.lock_rules();
        let rule = book.set_compound_enabled(id, enabled)?.clone();
        info!(rule_id = %id, enabled, "compound rule updated");
        Ok(rule)
    }

    pub fn catalog(&self) -> MetricCatalog {
        self.lock_rules().catalog().clone()
    }

    pub fn status_of(&self, metric: &str, value: f64) -> Option<StatusLevel> {
        self.lock_rules().catalog().status_of(metric, value)
    }

    /// Apply an enable flag and/or a threshold change. Both are validated
    /// before either is written.
    pub fn update_rule(
        &self,
        id: RuleId,
        update: RuleUpdate,
    ) -> Result<Rule, MonitoringServiceError> {
        let mut book = self.lock_rules();
        if book.get(id).is_none() {
            return Err(RuleBookError::UnknownRule(id).into());
        }

        if let Some(threshold) = update.threshold {
            book.update_threshold(id, threshold)?;
        }
        if let Some(enabled) = update.enabled {
            book.set_enabled(id, enabled)?;
        }

        let updated = book
            .get(id)
            .cloned()
            .ok_or(RuleBookError::UnknownRule(id))?;
        info!(
            rule_id = %id,
            enabled = updated.enabled,
            threshold = updated.threshold,
            "rule updated"
        );
        Ok(updated)
    }

    pub fn toggle_rule(&self, id: RuleId) -> Result<Rule, MonitoringServiceError> {
        let mut book = self.lock_rules();
        let rule = book.toggle(id)?.clone();
        Ok(rule)
    }

    fn lock_rules(&self) -> MutexGuard<'_, RuleBook> {
        self.rules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_history(&self) -> MutexGuard<'_, HistoryBuffer> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Error raised by the monitoring service.
#[derive(Debug, thiserror::Error)]
pub enum MonitoringServiceError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    RuleBook(#[from] RuleBookError),
    #[error("{} alert(s) failed to publish", .failures.len())]
    AlertDelivery {
        failures: Vec<AlertError>,
        report: SnapshotReport,
    },
}
