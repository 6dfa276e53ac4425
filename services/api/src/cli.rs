use crate::demo::{run_evaluate, run_simulate, EvaluateArgs, SimulateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use ops_monitor::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Hospital Operations Monitor",
    about = "Evaluate ward metrics against alert rules from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a CSV snapshot against the default ward rules
    Evaluate(EvaluateArgs),
    /// Run a timer-driven drift simulation through the monitoring service
    Simulate(SimulateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args),
        Command::Simulate(args) => run_simulate(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["ops-monitor-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_simulate_overrides() {
        let cli = Cli::try_parse_from([
            "ops-monitor-api",
            "simulate",
            "--ticks",
            "3",
            "--interval-ms",
            "10",
            "--seed",
            "9",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Simulate(args)) => {
                assert_eq!(args.ticks, 3);
                assert_eq!(args.interval_ms, Some(10));
                assert_eq!(args.seed, 9);
            }
            other => panic!("expected simulate command, got {other:?}"),
        }
    }
}
