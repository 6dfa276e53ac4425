use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::status::{StatusLevel, StatusThresholds};

/// Inclusive numeric range a metric (and any threshold on it) must stay within.
///
/// Bounds are finite and ordered; deserialization goes through the same check
/// as [`MetricDomain::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DomainBounds", into = "DomainBounds")]
pub struct MetricDomain {
    min: f64,
    max: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct DomainBounds {
    min: f64,
    max: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("metric domain [{min}, {max}] must have finite bounds with min <= max")]
pub struct InvalidDomain {
    pub min: f64,
    pub max: f64,
}

impl MetricDomain {
    pub const PERCENTAGE: MetricDomain = MetricDomain {
        min: 0.0,
        max: 100.0,
    };

    pub fn new(min: f64, max: f64) -> Result<Self, InvalidDomain> {
        if min.is_finite() && max.is_finite() && min <= max {
            Ok(Self { min, max })
        } else {
            Err(InvalidDomain { min, max })
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Pulls `value` into the range. NaN lands on the lower bound.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.max(self.min).min(self.max)
    }
}

impl TryFrom<DomainBounds> for MetricDomain {
    type Error = InvalidDomain;

    fn try_from(bounds: DomainBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.min, bounds.max)
    }
}

impl From<MetricDomain> for DomainBounds {
    fn from(domain: MetricDomain) -> Self {
        Self {
            min: domain.min,
            max: domain.max,
        }
    }
}

/// Explicit per-metric configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricProfile {
    pub domain: MetricDomain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusThresholds>,
}

/// Lookup table of metric profiles, keyed by metric name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricCatalog {
    metrics: BTreeMap<String, MetricProfile>,
}

impl MetricCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metric(mut self, metric: impl Into<String>, profile: MetricProfile) -> Self {
        self.metrics.insert(metric.into(), profile);
        self
    }

    /// Catalog for the ward dashboards: occupancy, wait time, staffing,
    /// satisfaction, risk, and patient-flow rates.
    pub fn hospital_defaults() -> Self {
        let percentage = |status: Option<StatusThresholds>| MetricProfile {
            domain: MetricDomain::PERCENTAGE,
            status,
        };

        Self::new()
            .with_metric(
                "occupancy",
                percentage(Some(StatusThresholds::higher_is_worse(75.0, 85.0))),
            )
            .with_metric(
                "waitTime",
                MetricProfile {
                    domain: MetricDomain {
                        min: 0.0,
                        max: 240.0,
                    },
                    status: Some(StatusThresholds::higher_is_worse(30.0, 45.0)),
                },
            )
            .with_metric(
                "staffingLevel",
                percentage(Some(StatusThresholds::lower_is_worse(85.0, 80.0))),
            )
            .with_metric(
                "patientSatisfaction",
                percentage(Some(StatusThresholds::lower_is_worse(85.0, 80.0))),
            )
            .with_metric("riskScore", percentage(None))
            .with_metric("patientVolume", percentage(None))
            .with_metric("admissionRate", percentage(None))
            .with_metric("dischargeRate", percentage(None))
            .with_metric(
                "staffingGap",
                MetricProfile {
                    domain: MetricDomain {
                        min: 0.0,
                        max: 50.0,
                    },
                    status: None,
                },
            )
    }

    pub fn profile(&self, metric: &str) -> Option<&MetricProfile> {
        self.metrics.get(metric)
    }

    pub fn domain(&self, metric: &str) -> Option<MetricDomain> {
        self.metrics.get(metric).map(|profile| profile.domain)
    }

    /// Status band for a metric; `None` when the metric has no thresholds.
    pub fn status_of(&self, metric: &str, value: f64) -> Option<StatusLevel> {
        self.metrics
            .get(metric)
            .and_then(|profile| profile.status.as_ref())
            .map(|thresholds| super::status::status_level(metric, value, thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_metrics_have_no_status() {
        let catalog = MetricCatalog::hospital_defaults();

        assert_eq!(catalog.status_of("bedTurnover", 10.0), None);
        assert_eq!(catalog.status_of("riskScore", 99.0), None);
    }

    #[test]
    fn staffing_and_occupancy_use_opposite_polarity() {
        let catalog = MetricCatalog::hospital_defaults();

        assert_eq!(catalog.status_of("occupancy", 90.0), Some(StatusLevel::Critical));
        assert_eq!(catalog.status_of("staffingLevel", 90.0), Some(StatusLevel::Nominal));
        assert_eq!(catalog.status_of("staffingLevel", 78.0), Some(StatusLevel::Critical));
        assert_eq!(catalog.status_of("waitTime", 35.0), Some(StatusLevel::Warning));
    }

    #[test]
    fn inverted_or_unbounded_domains_are_rejected() {
        assert_eq!(
            MetricDomain::new(10.0, 0.0),
            Err(InvalidDomain { min: 10.0, max: 0.0 })
        );
        assert!(MetricDomain::new(0.0, f64::INFINITY).is_err());
        assert!(MetricDomain::new(f64::NAN, 1.0).is_err());

        let parsed: Result<MetricCatalog, _> = serde_json::from_value(serde_json::json!({
            "metrics": { "occupancy": { "domain": { "min": 10.0, "max": 0.0 } } }
        }));
        assert!(parsed.is_err());

        let domain = MetricDomain::new(-5.0, 5.0).expect("ordered bounds");
        let round_trip: MetricDomain =
            serde_json::from_value(serde_json::to_value(domain).expect("serializes"))
                .expect("deserializes");
        assert_eq!(round_trip, domain);
    }

    #[test]
    fn clamp_handles_extreme_inputs() {
        let domain = MetricDomain::PERCENTAGE;

        assert_eq!(domain.clamp(f64::INFINITY), 100.0);
        assert_eq!(domain.clamp(f64::NEG_INFINITY), 0.0);
        assert_eq!(domain.clamp(f64::NAN), 0.0);
        assert_eq!(domain.clamp(42.0), 42.0);
    }

    #[test]
    fn domain_rejects_non_finite_values() {
        let domain = MetricDomain::PERCENTAGE;

        assert!(domain.contains(0.0));
        assert!(domain.contains(100.0));
        assert!(!domain.contains(100.5));
        assert!(!domain.contains(f64::NAN));
        assert_eq!(domain.clamp(-3.0), 0.0);
    }
}
