// Scheduler binary - reads slice/packet scenarios and prints the resulting schedules
//
// Each input is parsed, scheduled, verified and scored. The schedule goes to stdout in the plain
// text format (or as a JSON report with --json); logs and the score go to stderr.

use clap::Parser;
use slice_scheduler::batch::run_batch;
use slice_scheduler::{write_schedule, Result, Scenario, SchedulerConfig};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command-line options.
#[derive(Parser, Debug)]
#[command(name = "slice-scheduler", version, about, long_about = None)]
struct Cli {
    /// Scenario files to schedule; reads a single scenario from stdin when omitted
    inputs: Vec<PathBuf>,

    /// JSON file overriding weights and tolerances
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a JSON report (schedule, missed packets, verification, score, metrics)
    #[arg(long)]
    json: bool,

    /// Worker threads used when several inputs are given
    #[arg(short, long, default_value_t = default_workers())]
    workers: usize,

    /// Increase log verbosity (-v, -vv, -vvv); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Install the stderr subscriber, honouring `RUST_LOG` before the `-v` count.
fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Read one scenario from `path`, or from stdin when no path is given.
fn load_scenario(path: Option<&Path>) -> Result<Scenario> {
    match path {
        Some(path) => Scenario::read_from(BufReader::new(File::open(path)?)),
        None => Scenario::read_from(io::stdin().lock()),
    }
}

/// Run every input and write its output.
///
/// # Returns
/// `Ok(true)` if every input was scheduled, `Ok(false)` if at least one was rejected.
fn run(cli: &Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => SchedulerConfig::from_json_file(path)?,
        None => SchedulerConfig::default(),
    };
    let loaded: Vec<(String, Result<Scenario>)> = if cli.inputs.is_empty() {
        vec![("<stdin>".to_string(), load_scenario(None))]
    } else {
        cli.inputs
            .iter()
            .map(|path| (path.display().to_string(), load_scenario(Some(path.as_path()))))
            .collect()
    };
    let labelled = loaded.len() > 1;

    // Unreadable inputs are reported and skipped; the rest still run.
    let mut all_ok = true;
    let mut names = Vec::with_capacity(loaded.len());
    let mut scenarios = Vec::with_capacity(loaded.len());
    for (name, result) in loaded {
        match result {
            Ok(scenario) => {
                names.push(name);
                scenarios.push(scenario);
            }
            Err(err) => {
                error!(input = %name, %err, "failed to read scenario");
                all_ok = false;
            }
        }
    }
    let results = run_batch(scenarios, &config, cli.workers)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (name, result) in names.into_iter().zip(results) {
        let evaluation = match result {
            Ok(evaluation) => evaluation,
            Err(err) => {
                error!(input = %name, %err, "scenario rejected");
                all_ok = false;
                continue;
            }
        };

        if labelled && !cli.json {
            writeln!(out, "# {name}")?;
        }
        if cli.json {
            evaluation.report().write_json(&mut out)?;
        } else {
            write_schedule(&mut out, &evaluation.outcome)?;
        }
        info!(
            input = %name,
            score = evaluation.score.value,
            missed = evaluation.outcome.missed.len(),
            "done"
        );
    }
    out.flush()?;
    Ok(all_ok)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(%err, "scheduler failed");
            ExitCode::FAILURE
        }
    }
}
