use serde::{Deserialize, Serialize};

/// Tunables for trend rules. Threshold rules need no configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Minimum absolute slope, in units per hour, for a trend rule to trigger.
    pub min_trend_change: f64,
    /// Window applied to trend rules that do not declare their own.
    pub default_trend_window_secs: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            min_trend_change: 0.0,
            default_trend_window_secs: 3600,
        }
    }
}
