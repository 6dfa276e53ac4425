use serde::{Deserialize, Serialize};

/// Whether larger or smaller values of a metric are the bad direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsWorse,
    LowerIsWorse,
}

/// Status band used for at-a-glance coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Nominal,
    Warning,
    Critical,
}

impl StatusLevel {
    pub fn label(&self) -> &'static str {
        match self {
            StatusLevel::Nominal => "nominal",
            StatusLevel::Warning => "warning",
            StatusLevel::Critical => "critical",
        }
    }
}

/// Warning/critical pair plus the direction they apply in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusThresholds {
    pub warning: f64,
    pub critical: f64,
    pub polarity: Polarity,
}

impl StatusThresholds {
    pub fn higher_is_worse(warning: f64, critical: f64) -> Self {
        Self {
            warning,
            critical,
            polarity: Polarity::HigherIsWorse,
        }
    }

    pub fn lower_is_worse(warning: f64, critical: f64) -> Self {
        Self {
            warning,
            critical,
            polarity: Polarity::LowerIsWorse,
        }
    }

    pub fn classify(&self, value: f64) -> StatusLevel {
        match self.polarity {
            Polarity::HigherIsWorse if value > self.critical => StatusLevel::Critical,
            Polarity::HigherIsWorse if value > self.warning => StatusLevel::Warning,
            Polarity::LowerIsWorse if value < self.critical => StatusLevel::Critical,
            Polarity::LowerIsWorse if value < self.warning => StatusLevel::Warning,
            _ => StatusLevel::Nominal,
        }
    }
}

/// Classifies a single value. The metric name is only used for diagnostics;
/// the direction always comes from `thresholds.polarity`.
pub fn status_level(metric: &str, value: f64, thresholds: &StatusThresholds) -> StatusLevel {
    let level = thresholds.classify(value);
    tracing::trace!(metric, value, level = level.label(), "classified metric status");
    level
}
