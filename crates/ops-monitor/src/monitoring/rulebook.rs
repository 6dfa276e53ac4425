use std::collections::BTreeMap;

use super::catalog::{MetricCatalog, MetricDomain};
use super::domain::{
    ComparisonDirection, CompoundRule, Condition, Rule, RuleId, ScopeSelector, Severity,
};

/// Failures raised while editing the rule set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleBookError {
    #[error("rule {0} not found")]
    UnknownRule(RuleId),
    #[error("rule {0} already exists")]
    DuplicateRule(RuleId),
    #[error("threshold {value} for '{metric}' outside domain [{}, {}]", .domain.min(), .domain.max())]
    ThresholdOutOfDomain {
        metric: String,
        value: f64,
        domain: MetricDomain,
    },
    #[error("threshold must be a finite number")]
    NonFiniteThreshold,
    #[error("compound rule {0} has no conditions")]
    EmptyConditions(RuleId),
}

/// Rule store. Mutations go through explicit enable/disable and threshold
/// updates so thresholds never leave their metric's domain.
///
/// Compound rules keep their own id space.
#[derive(Debug, Clone)]
pub struct RuleBook {
    catalog: MetricCatalog,
    rules: BTreeMap<RuleId, Rule>,
    compound: BTreeMap<RuleId, CompoundRule>,
}

impl RuleBook {
    pub fn new(catalog: MetricCatalog) -> Self {
        Self {
            catalog,
            rules: BTreeMap::new(),
            compound: BTreeMap::new(),
        }
    }

    pub fn with_rules(
        catalog: MetricCatalog,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Result<Self, RuleBookError> {
        let mut book = Self::new(catalog);
        for rule in rules {
            book.insert(rule)?;
        }
        Ok(book)
    }

    /// The alert rules configured on the ward dashboards.
    pub fn hospital_defaults() -> Self {
        let rules = default_rules()
            .into_iter()
            .map(|rule| (rule.id, rule))
            .collect();
        let compound = default_compound_rules()
            .into_iter()
            .map(|rule| (rule.id, rule))
            .collect();
        Self {
            catalog: MetricCatalog::hospital_defaults(),
            rules,
            compound,
        }
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn insert(&mut self, rule: Rule) -> Result<(), RuleBookError> {
        if self.rules.contains_key(&rule.id) {
            return Err(RuleBookError::DuplicateRule(rule.id));
        }
        self.check_threshold(&rule.metric, rule.threshold)?;
        self.rules.insert(rule.id, rule);
        Ok(())
    }

    /// Rules ordered by id.
    pub fn rules(&self) -> Vec<Rule> {
        self.rules.values().cloned().collect()
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    pub fn set_enabled(&mut self, id: RuleId, enabled: bool) -> Result<&Rule, RuleBookError> {
        let rule = self
            .rules
            .get_mut(&id)
            .ok_or(RuleBookError::UnknownRule(id))?;
        rule.enabled = enabled;
        Ok(rule)
    }

    pub fn toggle(&mut self, id: RuleId) -> Result<&Rule, RuleBookError> {
        let enabled = self
            .rules
            .get(&id)
            .map(|rule| rule.enabled)
            .ok_or(RuleBookError::UnknownRule(id))?;
        self.set_enabled(id, !enabled)
    }

    pub fn update_threshold(&mut self, id: RuleId, threshold: f64) -> Result<&Rule, RuleBookError> {
        let metric = self
            .rules
            .get(&id)
            .map(|rule| rule.metric.clone())
            .ok_or(RuleBookError::UnknownRule(id))?;
        self.check_threshold(&metric, threshold)?;

        let rule = self
            .rules
            .get_mut(&id)
            .ok_or(RuleBookError::UnknownRule(id))?;
        rule.threshold = threshold;
        Ok(rule)
    }

    pub fn insert_compound(&mut self, rule: CompoundRule) -> Result<(), RuleBookError> {
        if self.compound.contains_key(&rule.id) {
            return Err(RuleBookError::DuplicateRule(rule.id));
        }
        if rule.conditions.is_empty() {
            return Err(RuleBookError::EmptyConditions(rule.id));
        }
        for condition in rule
            .conditions
            .iter()
            .filter(|condition| !condition.direction.is_trend())
        {
            self.check_threshold(&condition.metric, condition.threshold)?;
        }
        self.compound.insert(rule.id, rule);
        Ok(())
    }

    /// Compound rules ordered by id.
    pub fn compound_rules(&self) -> Vec<CompoundRule> {
        self.compound.values().cloned().collect()
    }

    pub fn get_compound(&self, id: RuleId) -> Option<&CompoundRule> {
        self.compound.get(&id)
    }

    pub fn set_compound_enabled(
        &mut self,
        id: RuleId,
        enabled: bool,
    ) -> Result<&CompoundRule, RuleBookError> {
        let rule = self
            .compound
            .get_mut(&id)
            .ok_or(RuleBookError::UnknownRule(id))?;
        rule.enabled = enabled;
        Ok(rule)
    }

    fn check_threshold(&self, metric: &str, threshold: f64) -> Result<(), RuleBookError> {
        if !threshold.is_finite() {
            return Err(RuleBookError::NonFiniteThreshold);
        }
        match self.catalog.domain(metric) {
            Some(domain) if !domain.contains(threshold) => {
                Err(RuleBookError::ThresholdOutOfDomain {
                    metric: metric.to_string(),
                    value: threshold,
                    domain,
                })
            }
            _ => Ok(()),
        }
    }
}

fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: RuleId(1),
            name: "High Occupancy Alert".to_string(),
            metric: "occupancy".to_string(),
            direction: ComparisonDirection::Above,
            threshold: 85.0,
            severity: Severity::Critical,
            enabled: true,
            applies_to: ScopeSelector::only(["Emergency", "ICU"]),
            window_secs: None,
        },
        Rule {
            id: RuleId(2),
            name: "Wait Time Warning".to_string(),
            metric: "waitTime".to_string(),
            direction: ComparisonDirection::Above,
            threshold: 40.0,
            severity: Severity::Warning,
            enabled: true,
            applies_to: ScopeSelector::only(["Emergency"]),
            window_secs: None,
        },
        Rule {
            id: RuleId(3),
            name: "Staff Coverage Alert".to_string(),
            metric: "staffingLevel".to_string(),
            direction: ComparisonDirection::Below,
            threshold: 85.0,
            severity: Severity::Critical,
            enabled: true,
            applies_to: ScopeSelector::All,
            window_secs: None,
        },
        Rule {
            id: RuleId(4),
            name: "Admission Surge".to_string(),
            metric: "admissionRate".to_string(),
            direction: ComparisonDirection::Increasing,
            threshold: 0.0,
            severity: Severity::Warning,
            enabled: true,
            applies_to: ScopeSelector::All,
            window_secs: Some(3600),
        },
        Rule {
            id: RuleId(5),
            name: "Discharge Slowdown".to_string(),
            metric: "dischargeRate".to_string(),
            direction: ComparisonDirection::Decreasing,
            threshold: 0.0,
            severity: Severity::Warning,
            enabled: true,
            applies_to: ScopeSelector::All,
            window_secs: Some(3600),
        },
    ]
}

fn default_compound_rules() -> Vec<CompoundRule> {
    vec![
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
        },
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
        },
    ]
}
