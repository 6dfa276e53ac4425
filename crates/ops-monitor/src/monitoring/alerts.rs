use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

use super::domain::{CompoundResult, EvaluationResult, RuleId, Severity};

/// Trait describing outbound alert hooks (pager, e-mail, dashboard push).
pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: MonitoringAlert) -> Result<(), AlertError>;
}

/// Payload emitted for every triggered evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringAlert {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub scope: String,
    pub severity: Severity,
    pub trigger: AlertTrigger,
    pub raised_at: DateTime<Utc>,
}

/// What tripped the rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertTrigger {
    Threshold { observed_value: f64, threshold: f64 },
    Occurrences { count: u32, minimum: u32 },
}

impl fmt::Display for AlertTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertTrigger::Threshold {
                observed_value,
                threshold,
            } => write!(f, "observed {observed_value:.1} vs threshold {threshold:.1}"),
            AlertTrigger::Occurrences { count, minimum } => {
                write!(f, "{count} occurrence(s), minimum {minimum}")
            }
        }
    }
}

impl MonitoringAlert {
    pub fn from_result(result: &EvaluationResult, raised_at: DateTime<Utc>) -> Self {
        Self {
            rule_id: result.rule_id,
            rule_name: result.rule_name.clone(),
            scope: result.scope.clone(),
            severity: result.severity,
            trigger: AlertTrigger::Threshold {
                observed_value: result.observed_value,
                threshold: result.threshold,
            },
            raised_at,
        }
    }

    pub fn from_compound(result: &CompoundResult, raised_at: DateTime<Utc>) -> Self {
        Self {
            rule_id: result.rule_id,
            rule_name: result.rule_name.clone(),
            scope: result.scope.clone(),
            severity: result.severity,
            trigger: AlertTrigger::Occurrences {
                count: result.occurrences,
                minimum: result.minimum_occurrences,
            },
            raised_at,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "[{}] {} in {}: {}",
            self.severity.label(),
            self.rule_name,
            self.scope,
            self.trigger
        )
    }
}

/// Alert dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}
