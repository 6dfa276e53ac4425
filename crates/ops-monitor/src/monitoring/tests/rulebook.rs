use super::common::*;
use crate::monitoring::domain::{
    ComparisonDirection, CompoundRule, Condition, RuleId, ScopeSelector, Severity,
};
use crate::monitoring::{MetricCatalog, RuleBook, RuleBookError};

#[test]
fn defaults_mirror_ward_alert_rules() {
    let book = RuleBook::hospital_defaults();
    let rules = book.rules();

    let ids: Vec<u32> = rules.iter().map(|rule| rule.id.0).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert!(rules.iter().all(|rule| rule.enabled));
    assert_eq!(rules[2].applies_to, ScopeSelector::All);
    assert_eq!(rules[2].direction, ComparisonDirection::Below);
}

#[test]
fn toggle_flips_enabled_flag() {
    let mut book = RuleBook::hospital_defaults();

    assert!(!book.toggle(RuleId(2)).expect("rule exists").enabled);
    assert!(book.toggle(RuleId(2)).expect("rule exists").enabled);
}

#[test]
fn threshold_update_is_bounded_by_metric_domain() {
    let mut book = RuleBook::hospital_defaults();

    let updated = book
        .update_threshold(RuleId(1), 90.0)
        .expect("in-domain threshold accepted");
    assert_eq!(updated.threshold, 90.0);

    match book.update_threshold(RuleId(1), 120.0) {
        Err(RuleBookError::ThresholdOutOfDomain { metric, value, .. }) => {
            assert_eq!(metric, "occupancy");
            assert_eq!(value, 120.0);
        }
        other => panic!("expected domain error, got {other:?}"),
    }
    assert_eq!(book.get(RuleId(1)).expect("rule exists").threshold, 90.0);
}

#[test]
fn threshold_update_rejects_non_finite_values() {
    let mut book = RuleBook::hospital_defaults();

    assert_eq!(
        book.update_threshold(RuleId(2), f64::NAN).map(|rule| rule.threshold),
        Err(RuleBookError::NonFiniteThreshold)
    );
}

#[test]
fn unknown_rules_are_reported() {
    let mut book = RuleBook::hospital_defaults();

    assert_eq!(
        book.set_enabled(RuleId(99), false).map(|rule| rule.id),
        Err(RuleBookError::UnknownRule(RuleId(99)))
    );
}

#[test]
fn insert_rejects_duplicates_and_out_of_domain_rules() {
    let catalog = MetricCatalog::hospital_defaults();
    let valid = rule(
        10,
        "patientSatisfaction",
        ComparisonDirection::Below,
        80.0,
        Severity::Warning,
        ScopeSelector::All,
    );
    let mut book = RuleBook::with_rules(catalog, [valid.clone()]).expect("valid rule set");

    assert_eq!(book.insert(valid), Err(RuleBookError::DuplicateRule(RuleId(10))));

    let negative_wait = rule(
        11,
        "waitTime",
        ComparisonDirection::Above,
        -5.0,
        Severity::Info,
        ScopeSelector::All,
    );
    assert!(matches!(
        book.insert(negative_wait),
        Err(RuleBookError::ThresholdOutOfDomain { .. })
    ));
}

#[test]
fn metrics_outside_catalog_only_need_finite_thresholds() {
    let mut book = RuleBook::new(MetricCatalog::new());
    let custom = rule(
        20,
        "ventilatorsInUse",
        ComparisonDirection::Above,
        1_000.0,
        Severity::Info,
        ScopeSelector::All,
    );

    assert!(book.insert(custom).is_ok());
}

fn volume_surge(id: u32, conditions: Vec<Condition>) -> CompoundRule {
    CompoundRule {
        id: RuleId(id),
        name: format!("compound-{id}"),
        conditions,
        severity: Severity::Warning,
        enabled: true,
        applies_to: ScopeSelector::All,
        window_secs: None,
        minimum_occurrences: 1,
    }
}

#[test]
fn defaults_include_the_compound_dashboard_rules() {
    let book = RuleBook::hospital_defaults();
    let compound = book.compound_rules();

    assert_eq!(compound.len(), 2);
    assert_eq!(compound[0].name, "Critical Resource Shortage");
    assert_eq!(compound[0].minimum_occurrences, 3);
    assert_eq!(compound[0].window_secs, Some(7200));
    assert_eq!(compound[1].conditions.len(), 3);
    assert!(compound[1].conditions[1].direction.is_trend());
}

#[test]
fn compound_insert_checks_conditions() {
    let mut book = RuleBook::new(MetricCatalog::hospital_defaults());

    assert_eq!(
        book.insert_compound(volume_surge(7, Vec::new())),
        Err(RuleBookError::EmptyConditions(RuleId(7)))
    );
    assert!(matches!(
        book.insert_compound(volume_surge(
            7,
            vec![Condition::threshold("occupancy", ComparisonDirection::Above, 140.0)],
        )),
        Err(RuleBookError::ThresholdOutOfDomain { .. })
    ));

    // Trend clauses carry no meaningful threshold.
    let trend_only = volume_surge(
        7,
        vec![Condition {
            threshold: -1.0,
            ..Condition::trend("admissionRate", ComparisonDirection::Increasing, 3600)
        }],
    );
    book.insert_compound(trend_only.clone()).expect("trend clause accepted");
    assert_eq!(
        book.insert_compound(trend_only),
        Err(RuleBookError::DuplicateRule(RuleId(7)))
    );
    assert!(book.get_compound(RuleId(7)).is_some());
    assert!(book.get(RuleId(7)).is_none());
}
