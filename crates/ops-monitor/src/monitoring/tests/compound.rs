use super::common::*;
use crate::monitoring::domain::{
    ComparisonDirection, CompoundRule, Condition, HistoryPoint, MetricHistory, RuleId,
    ScopeSelector, Severity,
};
use crate::monitoring::EvaluationError;

fn shortage_rule() -> CompoundRule {
    CompoundRule {
        id: RuleId(1),
        name: "Critical Resource Shortage".to_string(),
        conditions: vec![
            Condition::threshold("staffingLevel", ComparisonDirection::Below, 85.0),
            Condition::threshold("patientVolume", ComparisonDirection::Above, 90.0),
        ],
        severity: Severity::Critical,
        enabled: true,
        applies_to: ScopeSelector::All,
        window_secs: Some(2 * 3600),
        minimum_occurrences: 3,
    }
}

fn capacity_rule() -> CompoundRule {
    CompoundRule {
        id: RuleId(2),
        name: "Capacity Warning".to_string(),
        conditions: vec![
            Condition::threshold("occupancy", ComparisonDirection::Above, 85.0),
            Condition::trend("admissionRate", ComparisonDirection::Increasing, 3600),
            Condition::trend("dischargeRate", ComparisonDirection::Decreasing, 3600),
        ],
        severity: Severity::Warning,
        enabled: true,
        applies_to: ScopeSelector::All,
        window_secs: Some(3600),
        minimum_occurrences: 1,
    }
}

fn record(history: &mut MetricHistory, metric: &str, scope: &str, points: &[(i64, f64)]) {
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
}

fn icu_shortage_snapshot() -> Vec<crate::monitoring::MetricReading> {
    vec![
        reading("staffingLevel", "ICU", 80.0),
        reading("patientVolume", "ICU", 95.0),
    ]
}

#[test]
fn shortage_triggers_once_all_conditions_held_often_enough() {
    let mut history = MetricHistory::new();
    record(&mut history, "staffingLevel", "ICU", &[(0, 82.0), (20, 88.0), (40, 79.0)]);
    record(&mut history, "patientVolume", "ICU", &[(0, 92.0), (20, 95.0), (40, 96.0)]);

    let results = engine()
        .evaluate_compound(&icu_shortage_snapshot(), &[shortage_rule()], &history, at(60))
        .expect("evaluation succeeds");

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.scope, "ICU");
    // Snapshot plus minutes 0 and 40; at minute 20 staffing was fine.
    assert_eq!(result.occurrences, 3);
    assert_eq!(result.minimum_occurrences, 3);
    assert!(result.triggered);
    assert!(result.conditions.iter().all(|condition| condition.holds));
}

#[test]
fn too_few_occurrences_inside_the_window_stay_quiet() {
    let mut history = MetricHistory::new();
    record(&mut history, "staffingLevel", "ICU", &[(-200, 70.0), (30, 80.0)]);
    record(&mut history, "patientVolume", "ICU", &[(-200, 99.0), (30, 97.0)]);

    let results = engine()
        .evaluate_compound(&icu_shortage_snapshot(), &[shortage_rule()], &history, at(60))
        .expect("evaluation succeeds");

    assert_eq!(results[0].occurrences, 2);
    assert!(!results[0].triggered);
    assert!(results[0].conditions.iter().all(|condition| condition.holds));
}

#[test]
fn history_at_the_snapshot_instant_is_not_counted_twice() {
    let mut history = MetricHistory::new();
    record(&mut history, "staffingLevel", "ICU", &[(60, 80.0)]);
    record(&mut history, "patientVolume", "ICU", &[(60, 95.0)]);

    let results = engine()
        .evaluate_compound(&icu_shortage_snapshot(), &[shortage_rule()], &history, at(60))
        .expect("evaluation succeeds");

    assert_eq!(results[0].occurrences, 1);
}

#[test]
fn each_condition_reports_its_own_outcome() {
    let readings = vec![
        reading("staffingLevel", "ICU", 90.0),
        reading("patientVolume", "ICU", 95.0),
    ];

    let results = engine()
        .evaluate_compound(&readings, &[shortage_rule()], &MetricHistory::new(), at(0))
        .expect("evaluation succeeds");

    let outcomes = &results[0].conditions;
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].metric, "staffingLevel");
    assert_eq!(outcomes[0].observed_value, 90.0);
    assert!(!outcomes[0].holds);
    assert!(outcomes[1].holds);
    assert_eq!(results[0].occurrences, 0);
    assert!(!results[0].triggered);
}

#[test]
fn trend_conditions_gate_the_capacity_warning() {
    let readings = vec![
        reading("occupancy", "ICU", 90.0),
        reading("admissionRate", "ICU", 30.0),
        reading("dischargeRate", "ICU", 5.0),
    ];
    let mut history = MetricHistory::new();
    record(&mut history, "admissionRate", "ICU", &[(0, 10.0), (30, 20.0)]);
    record(&mut history, "dischargeRate", "ICU", &[(0, 20.0), (30, 10.0)]);

    let results = engine()
        .evaluate_compound(&readings, &[capacity_rule()], &history, at(60))
        .expect("evaluation succeeds");
    assert!(results[0].triggered);
    assert_eq!(results[0].conditions[1].trend, Some(20.0));

    let mut recovering = MetricHistory::new();
    record(&mut recovering, "admissionRate", "ICU", &[(0, 10.0), (30, 20.0)]);
    record(&mut recovering, "dischargeRate", "ICU", &[(0, 10.0), (30, 20.0)]);

    let results = engine()
        .evaluate_compound(&readings, &[capacity_rule()], &recovering, at(60))
        .expect("evaluation succeeds");
    assert!(!results[0].triggered);
    assert_eq!(results[0].occurrences, 1);
}

#[test]
fn scopes_missing_a_condition_metric_are_skipped() {
    let readings = vec![
        reading("staffingLevel", "ICU", 80.0),
        reading("patientVolume", "ICU", 95.0),
        reading("staffingLevel", "Surgery", 70.0),
    ];
    let mut listed = shortage_rule();
    listed.applies_to = ScopeSelector::only(["Surgery", "General"]);

    let results = engine()
        .evaluate_compound(
            &readings,
            &[shortage_rule(), listed],
            &MetricHistory::new(),
            at(0),
        )
        .expect("evaluation succeeds");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].scope, "ICU");
}

#[test]
fn unknown_condition_direction_rejects_enabled_rules_only() {
    let mut odd = shortage_rule();
    odd.conditions[1].direction = ComparisonDirection::from("sideways".to_string());

    let error = engine()
        .evaluate_compound(
            &icu_shortage_snapshot(),
            &[odd.clone()],
            &MetricHistory::new(),
            at(0),
        )
        .expect_err("unknown direction rejected");
    assert_eq!(
        error,
        EvaluationError::UnknownDirection {
            rule_id: RuleId(1),
            direction: "sideways".to_string(),
        }
    );

    odd.enabled = false;
    let results = engine()
        .evaluate_compound(&icu_shortage_snapshot(), &[odd], &MetricHistory::new(), at(0))
        .expect("disabled rules are not validated");
    assert!(results.is_empty());
}

#[test]
fn compound_results_follow_severity_then_id_then_scope() {
    let readings = vec![
        reading("staffingLevel", "ICU", 80.0),
        reading("patientVolume", "ICU", 95.0),
        reading("staffingLevel", "Emergency", 80.0),
        reading("patientVolume", "Emergency", 95.0),
        reading("occupancy", "ICU", 90.0),
        reading("admissionRate", "ICU", 30.0),
        reading("dischargeRate", "ICU", 5.0),
    ];

    let results = engine()
        .evaluate_compound(
            &readings,
            &[capacity_rule(), shortage_rule()],
            &MetricHistory::new(),
            at(0),
        )
        .expect("evaluation succeeds");

    let order: Vec<(u32, &str)> = results
        .iter()
        .map(|result| (result.rule_id.0, result.scope.as_str()))
        .collect();
    assert_eq!(order, vec![(1, "Emergency"), (1, "ICU"), (2, "ICU")]);
}
