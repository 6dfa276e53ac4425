use crate::infra::build_monitoring_service;
use chrono::Utc;
use clap::Args;
use ops_monitor::config::AppConfig;
use ops_monitor::error::AppError;
use ops_monitor::monitoring::{
    ward_baseline, CompoundResult, DriftSimulator, EvaluationEngine, EvaluationResult,
    MetricCatalog, MetricHistory, MetricReading, RuleBook, SnapshotImporter,
};
use ops_monitor::telemetry;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// CSV snapshot with a `metric,scope,value` header
    #[arg(long)]
    pub(crate) readings: PathBuf,
    /// Print the results as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SimulateArgs {
    /// Number of evaluation ticks to run
    #[arg(long, default_value_t = 6)]
    pub(crate) ticks: u32,
    /// Tick interval in milliseconds (defaults to MONITOR_REFRESH_SECS)
    #[arg(long)]
    pub(crate) interval_ms: Option<u64>,
    /// Seed for the random walk
    #[arg(long, default_value_t = 7)]
    pub(crate) seed: u64,
    /// Largest per-tick change applied to each numeric reading
    #[arg(long, default_value_t = 3.0)]
    pub(crate) step: f64,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs { readings, json } = args;

    let config = AppConfig::load()?;
    let file = File::open(&readings)?;
    let snapshot = SnapshotImporter::from_reader(file)?;
    let book = RuleBook::hospital_defaults();
    let engine = EvaluationEngine::new(config.monitoring.evaluation_config());

    let results = engine.evaluate(
        &snapshot,
        &book.rules(),
        &MetricHistory::new(),
        Utc::now(),
    )?;

    if json {
        let rendered = serde_json::to_string_pretty(&results)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
        println!("{rendered}");
    } else {
        println!("Snapshot {} ({} readings)", readings.display(), snapshot.len());
        render_status_board(&snapshot, book.catalog());
        render_results(&results);
    }

    Ok(())
}

pub(crate) async fn run_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let SimulateArgs {
        ticks,
        interval_ms,
        seed,
        step,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let period = interval_ms
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(config.monitoring.refresh_interval);
    let (service, alerts) = build_monitoring_service(&config.monitoring);
    let catalog = service.catalog();
    let mut simulator = DriftSimulator::new(seed, step);
    let mut snapshot = ward_baseline();

    info!(ticks, ?period, seed, "starting ward simulation");
    println!("Ward simulation: {ticks} ticks every {} ms", period.as_millis());

    let mut interval = tokio::time::interval(period);
    for tick in 1..=ticks {
        interval.tick().await;
        let report = service.ingest(snapshot.clone(), Utc::now())?;
        println!(
            "\nTick {tick}: {} triggered of {} evaluated",
            report.triggered_count(),
            report.results.len() + report.compound.len()
        );
        render_results(&report.results);
        render_compound(&report.compound);
        snapshot = simulator.advance(&snapshot, &catalog);
    }

    let raised = alerts.events();
    println!("\n{} alert(s) raised during the simulation", raised.len());
    for alert in raised.iter().take(10) {
        println!("  - {}", alert.summary());
    }

    Ok(())
}

fn render_status_board(snapshot: &[MetricReading], catalog: &MetricCatalog) {
    println!("Status board:");
    for reading in snapshot {
        let Some(value) = reading.value.as_numeric() else {
            continue;
        };
        let status = catalog
            .status_of(&reading.metric, value)
            .map(|level| level.label())
            .unwrap_or("n/a");
        println!(
            "  - {:<12} {:<20} {:>7.1}  {}",
            reading.scope, reading.metric, value, status
        );
    }
}

fn render_compound(results: &[CompoundResult]) {
    for result in results {
        let marker = if result.triggered { "!!" } else { "ok" };
        let held: Vec<&str> = result
            .conditions
            .iter()
            .filter(|condition| condition.holds)
            .map(|condition| condition.metric.as_str())
            .collect();
        println!(
            "  [{marker}] {:<8} compound #{} {} ({}) {}/{} occurrences, holding: {}",
            result.severity.label(),
            result.rule_id,
            result.rule_name,
            result.scope,
            result.occurrences,
            result.minimum_occurrences,
            if held.is_empty() { "-".to_string() } else { held.join(", ") }
        );
    }
}

fn render_results(results: &[EvaluationResult]) {
    if results.is_empty() {
        println!("  (no applicable rules)");
        return;
    }
    for result in results {
        let marker = if result.triggered { "!!" } else { "ok" };
        let trend = result
            .trend
            .map(|slope| format!(" trend {slope:+.2}/h"))
            .unwrap_or_default();
        println!(
            "  [{marker}] {:<8} #{} {} ({}) observed {:.1} vs {:.1}{trend}",
            result.severity.label(),
            result.rule_id,
            result.rule_name,
            result.scope,
            result.observed_value,
            result.threshold
        );
    }
}
