use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use super::super::domain::{
    CompoundResult, CompoundRule, Condition, ConditionOutcome, HistoryPoint, MetricHistory,
    MetricReading, ScopeSelector,
};
use super::config::EvaluationConfig;
use super::rules::{assess_comparison, window_start};
use super::validation::{validate_compound_inputs, EvaluationError};

/// Evaluates every enabled compound rule against the snapshot.
///
/// A scope is considered only when it reports a numeric reading for every
/// condition's metric. Results use the same ordering as single-metric results.
pub fn evaluate_compound(
    readings: &[MetricReading],
    rules: &[CompoundRule],
    history: &MetricHistory,
    as_of: DateTime<Utc>,
    config: &EvaluationConfig,
) -> Result<Vec<CompoundResult>, EvaluationError> {
    validate_compound_inputs(readings, rules)?;

    let mut by_metric: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();
    for reading in readings {
        if let Some(value) = reading.value.as_numeric() {
            by_metric
                .entry(reading.metric.as_str())
                .or_default()
                .insert(reading.scope.as_str(), value);
        }
    }

    let mut results = Vec::new();
    for rule in rules
        .iter()
        .filter(|rule| rule.enabled && !rule.conditions.is_empty())
    {
        for scope in candidate_scopes(rule, &by_metric) {
            let observed: Option<Vec<f64>> = rule
                .conditions
                .iter()
                .map(|condition| {
                    by_metric
                        .get(condition.metric.as_str())
                        .and_then(|scoped| scoped.get(scope))
                        .copied()
                })
                .collect();
            let Some(observed) = observed else {
                continue;
            };

            let outcomes: Vec<ConditionOutcome> = rule
                .conditions
                .iter()
                .zip(observed)
                .map(|(condition, value)| {
                    let signal = assess_comparison(
                        &condition.direction,
                        condition.threshold,
                        condition.window_secs,
                        value,
                        history.series(&condition.metric, scope),
                        as_of,
                        config,
                    );
                    ConditionOutcome {
                        metric: condition.metric.clone(),
                        direction: condition.direction.clone(),
                        threshold: condition.threshold,
                        observed_value: value,
                        trend: signal.trend,
                        holds: signal.triggered,
                    }
                })
                .collect();

            let trends_hold = outcomes
                .iter()
                .filter(|outcome| outcome.direction.is_trend())
                .all(|outcome| outcome.holds);
            let window_secs = rule
                .window_secs
                .unwrap_or(config.default_trend_window_secs);
            let occurrences = count_occurrences(rule, scope, &outcomes, history, as_of, window_secs);
            let minimum_occurrences = rule.minimum_occurrences.max(1);

            results.push(CompoundResult {
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                scope: scope.to_string(),
                severity: rule.severity,
                triggered: trends_hold && occurrences >= minimum_occurrences,
                occurrences,
                minimum_occurrences,
                conditions: outcomes,
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

fn candidate_scopes<'a>(
    rule: &'a CompoundRule,
    by_metric: &BTreeMap<&'a str, BTreeMap<&'a str, f64>>,
) -> BTreeSet<&'a str> {
    match &rule.applies_to {
        ScopeSelector::Only(scopes) => scopes.iter().map(String::as_str).collect(),
        ScopeSelector::All => {
            let mut reporting = rule.conditions.iter().map(|condition| {
                by_metric
                    .get(condition.metric.as_str())
                    .map(|scoped| scoped.keys().copied().collect::<BTreeSet<&str>>())
                    .unwrap_or_default()
            });
            let first = reporting.next().unwrap_or_default();
            reporting.fold(first, |acc, scopes| {
                acc.intersection(&scopes).copied().collect()
            })
        }
    }
}

/// Counts the instants in `[as_of - window, as_of]` at which every threshold
/// condition held: the snapshot itself, plus each earlier history timestamp
/// where all threshold metrics were recorded. History stamped exactly
/// `as_of` is the snapshot and is not counted twice.
fn count_occurrences(
    rule: &CompoundRule,
    scope: &str,
    outcomes: &[ConditionOutcome],
    history: &MetricHistory,
    as_of: DateTime<Utc>,
    window_secs: u64,
) -> u32 {
    let snapshot_holds = outcomes
        .iter()
        .filter(|outcome| !outcome.direction.is_trend())
        .all(|outcome| outcome.holds);
    let mut count = u32::from(snapshot_holds);

    let comparisons: Vec<&Condition> = rule
        .conditions
        .iter()
        .filter(|condition| !condition.direction.is_trend())
        .collect();
    let Some(lead) = comparisons.first() else {
        return count;
    };

    let start = window_start(as_of, window_secs);
    let mut previous: Option<DateTime<Utc>> = None;
    for point in history.series(&lead.metric, scope) {
        if point.at < start || point.at >= as_of || previous == Some(point.at) {
            continue;
        }
        previous = Some(point.at);

        let all_hold = comparisons.iter().all(|condition| {
            value_at(history.series(&condition.metric, scope), point.at)
                .map(|value| {
                    assess_comparison(
                        &condition.direction,
                        condition.threshold,
                        None,
                        value,
                        &[],
                        point.at,
                        &EvaluationConfig::default(),
                    )
                    .triggered
                })
                .unwrap_or(false)
        });
        if all_hold {
            count = count.saturating_add(1);
        }
    }

    count
}

/// Latest value recorded at exactly `at` in a timestamp-ordered series.
fn value_at(series: &[HistoryPoint], at: DateTime<Utc>) -> Option<f64> {
    let end = series.partition_point(|point| point.at <= at);
    series[..end]
        .last()
        .filter(|point| point.at == at)
        .map(|point| point.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).single().expect("valid")
            + chrono::Duration::minutes(minutes)
    }

    #[test]
    fn value_at_requires_an_exact_timestamp() {
        let series = vec![
            HistoryPoint { at: at(0), value: 1.0 },
            HistoryPoint { at: at(10), value: 2.0 },
            HistoryPoint { at: at(10), value: 3.0 },
        ];

        assert_eq!(value_at(&series, at(10)), Some(3.0));
        assert_eq!(value_at(&series, at(5)), None);
        assert_eq!(value_at(&[], at(0)), None);
    }
}
