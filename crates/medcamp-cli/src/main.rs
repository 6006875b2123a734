//! `MedCamp` CLI
//!
//! Status, reconciliation and schedule checks for school medical campaign
//! consent workflows.

use std::io;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use medcamp_cli::args::parse_instant;
use medcamp_cli::reconcile_cmd::{self, ReconcileArgs};
use medcamp_cli::schedule_cmd::{self, ScheduleArgs};
use medcamp_cli::status_cmd::{self, StatusArgs};
use medcamp_cli::window_cmd::{self, WindowArgs};
use medcamp_core::Clock;
use medcamp_core::config;
use medcamp_core::tracing_init::init_tracing;

/// Exit status when reconciliation finds drift and failure was requested.
const EXIT_DRIFT: u8 = 2;
/// Exit status when a proposed schedule is rejected.
const EXIT_REJECTED: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "medcamp")]
#[command(
    version,
    about = "Consent workflow checks for school medical campaigns",
    long_about = None
)]
struct Cli {
    /// Evaluate as of this instant instead of the current time
    #[arg(long, global = true, value_parser = parse_instant)]
    now: Option<DateTime<Utc>>,

    /// Emit JSON log lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify every record in an export
    Status(StatusArgs),
    /// Compare status-derived counts against a confirmed-only export
    Reconcile(ReconcileArgs),
    /// Check a proposed campaign date against the minimum lead time
    Schedule(ScheduleArgs),
    /// Evaluate a manager-approval or parent-response window
    Window(WindowArgs),
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir()?;
    let config = config::load_config(Some(&cwd))?;
    init_tracing(&config.logging, cli.verbose, cli.log_json);

    // Sampled once so every record in a run is judged against the same instant.
    let now = match cli.now {
        Some(at) => at,
        None => config.clock.clock()?.now(),
    };
    info!(version = env!("CARGO_PKG_VERSION"), %now, "Starting medcamp");

    let mut out = io::stdout().lock();
    let code = match &cli.command {
        Commands::Status(args) => {
            status_cmd::run(args, now, &mut out)?;
            ExitCode::SUCCESS
        }
        Commands::Reconcile(args) => {
            let report = reconcile_cmd::run(args, &config.reconcile, now, &mut out)?;
            if reconcile_cmd::should_fail(args, &config.reconcile, &report) {
                ExitCode::from(EXIT_DRIFT)
            } else {
                ExitCode::SUCCESS
            }
        }
        Commands::Schedule(args) => {
            let validation = schedule_cmd::run(args, now, &mut out)?;
            if validation.is_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_REJECTED)
            }
        }
        Commands::Window(args) => {
            window_cmd::run(args, now, &mut out)?;
            ExitCode::SUCCESS
        }
    };
    Ok(code)
}
