use std::io::Read;

use serde::Deserialize;

use super::domain::{MetricReading, MetricValue};

/// Errors raised while reading a snapshot export.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read snapshot CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: &'static str },
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    metric: String,
    scope: String,
    value: String,
}

/// Parses `metric,scope,value` snapshots. Duplicate keys are left for the
/// evaluation engine to reject.
pub struct SnapshotImporter;

impl SnapshotImporter {
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<MetricReading>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut readings = Vec::new();
        for (index, row) in csv_reader.deserialize::<SnapshotRow>().enumerate() {
            let row = row?;
            let line = index + 2;
            if row.metric.is_empty() {
                return Err(ImportError::InvalidRow {
                    row: line,
                    reason: "metric is empty",
                });
            }
            if row.scope.is_empty() {
                return Err(ImportError::InvalidRow {
                    row: line,
                    reason: "scope is empty",
                });
            }
            if row.value.is_empty() {
                return Err(ImportError::InvalidRow {
                    row: line,
                    reason: "value is empty",
                });
            }

            let value = match row.value.parse::<f64>() {
                Ok(number) if number.is_finite() => MetricValue::Numeric(number),
                _ => MetricValue::Category(row.value),
            };

            readings.push(MetricReading {
                metric: row.metric,
                scope: row.scope,
                value,
            });
        }

        Ok(readings)
    }
}
