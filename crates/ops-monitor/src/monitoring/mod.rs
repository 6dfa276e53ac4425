//! Threshold and trend evaluation for hospital operations metrics.
//!
//! The engine in [`evaluation`] is a pure function of readings, rules, and
//! history. Everything stateful (rule edits, rolling history, alert fan-out,
//! simulated feeds) lives in the surrounding modules and calls into it.

pub mod alerts;
pub mod catalog;
pub mod domain;
pub mod evaluation;
pub mod feed;
pub mod history;
pub mod import;
pub mod router;
pub mod rulebook;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use alerts::{AlertError, AlertPublisher, AlertTrigger, MonitoringAlert};
pub use catalog::{InvalidDomain, MetricCatalog, MetricDomain, MetricProfile};
pub use domain::{
    ComparisonDirection, CompoundResult, CompoundRule, Condition, ConditionOutcome,
    EvaluationResult, HistoryPoint, MetricHistory, MetricReading, MetricValue, Rule, RuleId,
    ScopeSelector, SeriesKey, Severity, ALL_SCOPES,
};
pub use evaluation::{
    evaluate, evaluate_compound, EvaluationConfig, EvaluationEngine, EvaluationError,
};
pub use feed::{ward_baseline, DriftSimulator};
pub use history::HistoryBuffer;
pub use import::{ImportError, SnapshotImporter};
pub use router::monitoring_router;
pub use rulebook::{RuleBook, RuleBookError};
pub use service::{MonitoringService, MonitoringServiceError, RuleUpdate, SnapshotReport};
pub use status::{status_level, Polarity, StatusLevel, StatusThresholds};
