use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::catalog::{MetricCatalog, MetricDomain};
use super::domain::{MetricReading, MetricValue};

/// Random-walk reading source for demos. Each call perturbs every numeric
/// reading by a uniform step and clamps it to the metric's domain.
///
/// A non-finite step freezes the walk.
#[derive(Debug)]
pub struct DriftSimulator {
    rng: StdRng,
    step: f64,
}

impl DriftSimulator {
    pub fn new(seed: u64, step: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            step: if step.is_finite() { step.abs() } else { 0.0 },
        }
    }

    pub fn advance(
        &mut self,
        snapshot: &[MetricReading],
        catalog: &MetricCatalog,
    ) -> Vec<MetricReading> {
        snapshot
            .iter()
            .map(|reading| {
                let value = match &reading.value {
                    MetricValue::Numeric(current) => {
                        let domain = catalog
                            .domain(&reading.metric)
                            .unwrap_or(MetricDomain::PERCENTAGE);
                        let delta = if self.step > 0.0 {
                            self.rng.gen_range(-1.0..=1.0) * self.step
                        } else {
                            0.0
                        };
                        MetricValue::Numeric(domain.clamp(current + delta))
                    }
                    category => category.clone(),
                };
                MetricReading {
                    metric: reading.metric.clone(),
                    scope: reading.scope.clone(),
                    value,
                }
            })
            .collect()
    }
}

/// Starting snapshot mirroring the department cards on the ward dashboard.
pub fn ward_baseline() -> Vec<MetricReading> {
    let departments = [
        ("Emergency", 85.0, 45.0, 92.0, 88.0, 91.0, "increasing"),
        ("ICU", 78.0, 15.0, 95.0, 91.0, 84.0, "stable"),
        ("Surgery", 72.0, 30.0, 88.0, 85.0, 76.0, "decreasing"),
        ("General", 80.0, 25.0, 90.0, 87.0, 80.0, "stable"),
    ];

    let mut readings = Vec::with_capacity(departments.len() * 6);
    for (scope, occupancy, wait_time, staffing, satisfaction, volume, demand) in departments {
        readings.push(MetricReading::new("occupancy", scope, occupancy));
        readings.push(MetricReading::new("waitTime", scope, wait_time));
        readings.push(MetricReading::new("staffingLevel", scope, staffing));
        readings.push(MetricReading::new("patientSatisfaction", scope, satisfaction));
        readings.push(MetricReading::new("patientVolume", scope, volume));
        readings.push(MetricReading::new("predictedDemand", scope, demand));
    }
    readings
}
