use chrono::{DateTime, Duration, Utc};

use super::super::domain::{ComparisonDirection, HistoryPoint, Rule};
use super::config::EvaluationConfig;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

pub(crate) struct RuleSignal {
    pub triggered: bool,
    pub trend: Option<f64>,
}

pub(crate) fn assess_rule(
    rule: &Rule,
    observed: f64,
    series: &[HistoryPoint],
    as_of: DateTime<Utc>,
    config: &EvaluationConfig,
) -> RuleSignal {
    assess_comparison(
        &rule.direction,
        rule.threshold,
        rule.window_secs,
        observed,
        series,
        as_of,
        config,
    )
}

/// Applies one direction to an observed value, or to the series when the
/// direction is a trend.
pub(crate) fn assess_comparison(
    direction: &ComparisonDirection,
    threshold: f64,
    window_secs: Option<u64>,
    observed: f64,
    series: &[HistoryPoint],
    as_of: DateTime<Utc>,
    config: &EvaluationConfig,
) -> RuleSignal {
    match direction {
        ComparisonDirection::Above => RuleSignal {
            triggered: observed > threshold,
            trend: None,
        },
        ComparisonDirection::Below => RuleSignal {
            triggered: observed < threshold,
            trend: None,
        },
        ComparisonDirection::Increasing | ComparisonDirection::Decreasing => {
            let window_secs = window_secs.unwrap_or(config.default_trend_window_secs);
            let trend = windowed_slope(series, as_of, window_secs);
            let triggered = trend
                .map(|slope| {
                    let matches_direction = match direction {
                        ComparisonDirection::Increasing => slope > 0.0,
                        _ => slope < 0.0,
                    };
                    matches_direction && slope.abs() > config.min_trend_change
                })
                .unwrap_or(false);
            RuleSignal { triggered, trend }
        }
        // Rejected during validation.
        ComparisonDirection::Unrecognized(_) => RuleSignal {
            triggered: false,
            trend: None,
        },
    }
}

/// Start of the inclusive window `[as_of - window_secs, as_of]`.
pub(crate) fn window_start(as_of: DateTime<Utc>, window_secs: u64) -> DateTime<Utc> {
    let max_secs = (i64::MAX / 1_000) as u64;
    let window = Duration::seconds(window_secs.min(max_secs) as i64);
    as_of
        .checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Least-squares slope (units per hour) of the points inside
/// `[as_of - window, as_of]`. `None` when fewer than two points fall inside
/// the window or they all share one timestamp.
pub(crate) fn windowed_slope(
    series: &[HistoryPoint],
    as_of: DateTime<Utc>,
    window_secs: u64,
) -> Option<f64> {
    let start = window_start(as_of, window_secs);
    let points: Vec<&HistoryPoint> = series
        .iter()
        .filter(|point| point.at >= start && point.at <= as_of)
        .collect();
    if points.len() < 2 {
        return None;
    }

    let origin = points[0].at;
    let xs: Vec<f64> = points
        .iter()
        .map(|point| (point.at - origin).num_milliseconds() as f64 / MILLIS_PER_HOUR)
        .collect();
    let count = points.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / count;
    let mean_y = points.iter().map(|point| point.value).sum::<f64>() / count;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (x, point) in xs.iter().zip(&points) {
        covariance += (x - mean_x) * (point.value - mean_y);
        variance += (x - mean_x) * (x - mean_x);
    }

    if variance <= f64::EPSILON {
        return None;
    }
    Some(covariance / variance)
}
