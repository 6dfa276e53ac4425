mod compound;
mod config;
mod rules;
mod validation;

pub use compound::evaluate_compound;
pub use config::EvaluationConfig;
pub use validation::EvaluationError;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use super::domain::{
    CompoundResult, CompoundRule, EvaluationResult, MetricHistory, MetricReading, Rule,
    ScopeSelector,
};
use rules::assess_rule;
use validation::{validate_compound_rules, validate_inputs};

/// Stateless evaluator joining a reading snapshot against the rule set.
#[derive(Debug, Clone, Default)]
pub struct EvaluationEngine {
    config: EvaluationConfig,
}

impl EvaluationEngine {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Runs input validation alone, without evaluating any rule.
    pub fn validate(
        &self,
        readings: &[MetricReading],
        rules: &[Rule],
    ) -> Result<(), EvaluationError> {
        validate_inputs(readings, rules)
    }

    /// Direction checks for compound rules; readings are covered by [`Self::validate`].
    pub fn validate_compound(&self, rules: &[CompoundRule]) -> Result<(), EvaluationError> {
        validate_compound_rules(rules)
    }

    pub fn evaluate(
        &self,
        readings: &[MetricReading],
        rules: &[Rule],
        history: &MetricHistory,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<EvaluationResult>, EvaluationError> {
        evaluate(readings, rules, history, as_of, &self.config)
    }

    pub fn evaluate_compound(
        &self,
        readings: &[MetricReading],
        rules: &[CompoundRule],
        history: &MetricHistory,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<CompoundResult>, EvaluationError> {
        evaluate_compound(readings, rules, history, as_of, &self.config)
    }
}

/// Evaluates every enabled rule against the snapshot.
///
/// Results are ordered by severity (highest first), then rule id, then scope.
/// Rules whose metric or scope is absent from the snapshot produce nothing, as
/// do categorical readings.
pub fn evaluate(
    readings: &[MetricReading],
    rules: &[Rule],
    history: &MetricHistory,
    as_of: DateTime<Utc>,
    config: &EvaluationConfig,
) -> Result<Vec<EvaluationResult>, EvaluationError> {
    validate_inputs(readings, rules)?;

    let mut by_metric: BTreeMap<&str, BTreeMap<&str, &MetricReading>> = BTreeMap::new();
    for reading in readings {
        by_metric
            .entry(reading.metric.as_str())
            .or_default()
            .insert(reading.scope.as_str(), reading);
    }

    let mut results = Vec::new();
    for rule in rules.iter().filter(|rule| rule.enabled) {
        let Some(scoped) = by_metric.get(rule.metric.as_str()) else {
            continue;
        };

        let candidates: BTreeSet<&str> = match &rule.applies_to {
            ScopeSelector::All => scoped.keys().copied().collect(),
            ScopeSelector::Only(scopes) => scopes.iter().map(String::as_str).collect(),
        };

        for scope in candidates {
            let Some(observed) = scoped
                .get(scope)
                .and_then(|reading| reading.value.as_numeric())
            else {
                continue;
            };

            let signal = assess_rule(
                rule,
                observed,
                history.series(&rule.metric, scope),
                as_of,
                config,
            );

            results.push(EvaluationResult {
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                scope: scope.to_string(),
                severity: rule.severity,
                triggered: signal.triggered,
                observed_value: observed,
                threshold: rule.threshold,
                trend: signal.trend,
            });
        }
    }

    results.sort_by(|left, right| {
        right
            .severity
            .cmp(&left.severity)
            .then_with(|| left.rule_id.cmp(&right.rule_id))
            .then_with(|| left.scope.cmp(&right.scope))
    });

    Ok(results)
}
