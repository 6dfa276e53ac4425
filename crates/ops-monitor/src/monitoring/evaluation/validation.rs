use std::collections::HashSet;

use super::super::domain::{ComparisonDirection, CompoundRule, MetricReading, Rule, RuleId};

/// Input validation failures. Either the whole snapshot evaluates or nothing does.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("duplicate reading for metric '{metric}' in scope '{scope}'")]
    DuplicateReading { metric: String, scope: String },
    #[error("rule {rule_id} uses unknown comparison direction '{direction}'")]
    UnknownDirection { rule_id: RuleId, direction: String },
}

pub(crate) fn validate_inputs(
    readings: &[MetricReading],
    rules: &[Rule],
) -> Result<(), EvaluationError> {
    validate_readings(readings)?;
    for rule in rules.iter().filter(|rule| rule.enabled) {
        check_direction(rule.id, &rule.direction)?;
    }
    Ok(())
}

pub(crate) fn validate_compound_inputs(
    readings: &[MetricReading],
    rules: &[CompoundRule],
) -> Result<(), EvaluationError> {
    validate_readings(readings)?;
    validate_compound_rules(rules)
}

pub(crate) fn validate_compound_rules(rules: &[CompoundRule]) -> Result<(), EvaluationError> {
    for rule in rules.iter().filter(|rule| rule.enabled) {
        for condition in &rule.conditions {
            check_direction(rule.id, &condition.direction)?;
        }
    }
    Ok(())
}

fn validate_readings(readings: &[MetricReading]) -> Result<(), EvaluationError> {
    let mut seen = HashSet::with_capacity(readings.len());
    for reading in readings {
        if !seen.insert((reading.metric.as_str(), reading.scope.as_str())) {
            return Err(EvaluationError::DuplicateReading {
                metric: reading.metric.clone(),
                scope: reading.scope.clone(),
            });
        }
    }

    Ok(())
}

fn check_direction(rule_id: RuleId, direction: &ComparisonDirection) -> Result<(), EvaluationError> {
    match direction {
        ComparisonDirection::Unrecognized(raw) => Err(EvaluationError::UnknownDirection {
            rule_id,
            direction: raw.clone(),
        }),
        _ => Ok(()),
    }
}
