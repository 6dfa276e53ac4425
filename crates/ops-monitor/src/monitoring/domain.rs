use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scope sentinel meaning "every scope reporting the metric".
pub const ALL_SCOPES: &str = "all";

/// Identifier wrapper for configured rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub u32);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value carried by a reading. Most metrics are numeric; a few (e.g. predicted
/// demand) are labeled categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Numeric(f64),
    Category(String),
}

impl MetricValue {
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            MetricValue::Numeric(value) => Some(*value),
            MetricValue::Category(_) => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Numeric(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Category(value.to_string())
    }
}

/// A single metric value for one scope, captured at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub metric: String,
    pub scope: String,
    pub value: MetricValue,
}

impl MetricReading {
    pub fn new(
        metric: impl Into<String>,
        scope: impl Into<String>,
        value: impl Into<MetricValue>,
    ) -> Self {
        Self {
            metric: metric.into(),
            scope: scope.into(),
            value: value.into(),
        }
    }
}

/// Ordered alert level. Declaration order drives `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[serde(alias = "low")]
    Info,
    #[serde(alias = "medium")]
    Warning,
    #[serde(alias = "high")]
    Critical,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// How a rule compares readings against its threshold.
///
/// Directions outside the known set are kept verbatim so evaluation can
/// reject the rule with a precise error instead of failing at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComparisonDirection {
    Above,
    Below,
    Increasing,
    Decreasing,
    Unrecognized(String),
}

impl ComparisonDirection {
    pub fn is_trend(&self) -> bool {
        matches!(
            self,
            ComparisonDirection::Increasing | ComparisonDirection::Decreasing
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            ComparisonDirection::Above => "above",
            ComparisonDirection::Below => "below",
            ComparisonDirection::Increasing => "increasing",
            ComparisonDirection::Decreasing => "decreasing",
            ComparisonDirection::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for ComparisonDirection {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "above" => ComparisonDirection::Above,
            "below" => ComparisonDirection::Below,
            "increasing" => ComparisonDirection::Increasing,
            "decreasing" => ComparisonDirection::Decreasing,
            _ => ComparisonDirection::Unrecognized(value),
        }
    }
}

impl From<ComparisonDirection> for String {
    fn from(value: ComparisonDirection) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ComparisonDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which scopes a rule fans out to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum ScopeSelector {
    All,
    Only(BTreeSet<String>),
}

impl ScopeSelector {
    pub fn only<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(scopes.into_iter().map(Into::into).collect())
    }
}

/// Only the exact lowercase sentinel widens the selector; a scope spelled
/// `All` or `ALL` is an ordinary scope name.
impl From<Vec<String>> for ScopeSelector {
    fn from(value: Vec<String>) -> Self {
        if value.iter().any(|scope| scope == ALL_SCOPES) {
            ScopeSelector::All
        } else {
            ScopeSelector::Only(value.into_iter().collect())
        }
    }
}

impl From<ScopeSelector> for Vec<String> {
    fn from(value: ScopeSelector) -> Self {
        match value {
            ScopeSelector::All => vec![ALL_SCOPES.to_string()],
            ScopeSelector::Only(scopes) => scopes.into_iter().collect(),
        }
    }
}

/// Configured evaluation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub metric: String,
    pub direction: ComparisonDirection,
    pub threshold: f64,
    pub severity: Severity,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub applies_to: ScopeSelector,
    /// Trend window in seconds; only consulted by trend directions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_secs: Option<u64>,
}

fn enabled_by_default() -> bool {
    true
}

/// One clause of a [`CompoundRule`]. Threshold clauses (`above`/`below`)
/// compare readings; trend clauses look at the slope over their own window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub metric: String,
    pub direction: ComparisonDirection,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_secs: Option<u64>,
}

impl Condition {
    pub fn threshold(
        metric: impl Into<String>,
        direction: ComparisonDirection,
        threshold: f64,
    ) -> Self {
        Self {
            metric: metric.into(),
            direction,
            threshold,
            window_secs: None,
        }
    }

    pub fn trend(
        metric: impl Into<String>,
        direction: ComparisonDirection,
        window_secs: u64,
    ) -> Self {
        Self {
            metric: metric.into(),
            direction,
            threshold: 0.0,
            window_secs: Some(window_secs),
        }
    }
}

/// Rule that fires when every condition holds for one scope, at least
/// `minimum_occurrences` times inside `window_secs`.
///
/// An occurrence is an instant (the current snapshot, or a recorded history
/// timestamp) at which every threshold condition held. Trend conditions are
/// judged once, at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundRule {
    pub id: RuleId,
    pub name: String,
    pub conditions: Vec<Condition>,
    pub severity: Severity,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default = "every_scope")]
    pub applies_to: ScopeSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_secs: Option<u64>,
    #[serde(default = "single_occurrence")]
    pub minimum_occurrences: u32,
}

fn every_scope() -> ScopeSelector {
    ScopeSelector::All
}

fn single_occurrence() -> u32 {
    1
}

/// Time-stamped numeric sample used by trend rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub at: DateTime<Utc>,
    pub value: f64,
}

/// Key joining readings, history, and rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey {
    pub metric: String,
    pub scope: String,
}

impl SeriesKey {
    pub fn new(metric: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            scope: scope.into(),
        }
    }
}

/// Externally supplied history for trend rules, keyed by `(metric, scope)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricHistory {
    series: BTreeMap<SeriesKey, Vec<HistoryPoint>>,
}

impl MetricHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a point, keeping the series ordered by timestamp.
    pub fn push(&mut self, metric: &str, scope: &str, point: HistoryPoint) {
        let series = self
            .series
            .entry(SeriesKey::new(metric, scope))
            .or_default();
        let position = series.partition_point(|existing| existing.at <= point.at);
        series.insert(position, point);
    }

    pub fn series(&self, metric: &str, scope: &str) -> &[HistoryPoint] {
        self.series
            .get(&SeriesKey::new(metric, scope))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drops points strictly older than `cutoff` and any series left empty.
    pub fn retain_since(&mut self, cutoff: DateTime<Utc>) {
        self.series.retain(|_, points| {
            points.retain(|point| point.at >= cutoff);
            !points.is_empty()
        });
    }

    pub fn len(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Output of applying one rule to one matching reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub scope: String,
    pub severity: Severity,
    pub triggered: bool,
    pub observed_value: f64,
    pub threshold: f64,
    /// Least-squares slope in units per hour, present for trend rules with enough data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<f64>,
}

/// Per-condition detail inside a [`CompoundResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionOutcome {
    pub metric: String,
    pub direction: ComparisonDirection,
    pub threshold: f64,
    pub observed_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<f64>,
    pub holds: bool,
}

/// Output of applying one compound rule to one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundResult {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub scope: String,
    pub severity: Severity,
    pub triggered: bool,
    pub occurrences: u32,
    pub minimum_occurrences: u32,
    pub conditions: Vec<ConditionOutcome>,
}
