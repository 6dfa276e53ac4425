use std::time::Duration;

use chrono::{DateTime, Utc};

use super::domain::{HistoryPoint, MetricHistory, MetricReading};

/// Caller-side rolling history feeding trend rules.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    retention: Duration,
    history: MetricHistory,
}

impl HistoryBuffer {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            history: MetricHistory::new(),
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Appends every numeric reading as a point stamped `at`.
    pub fn record(&mut self, readings: &[MetricReading], at: DateTime<Utc>) {
        for reading in readings {
            if let Some(value) = reading.value.as_numeric() {
                self.history
                    .push(&reading.metric, &reading.scope, HistoryPoint { at, value });
            }
        }
    }

    /// Drops points older than the retention window measured back from `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = chrono::Duration::from_std(self.retention)
            .ok()
            .and_then(|retention| now.checked_sub_signed(retention))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.history.retain_since(cutoff);
    }

    pub fn history(&self) -> &MetricHistory {
        &self.history
    }
}
