//! CLI command handlers.

use std::path::Path;
use std::process::ExitCode;

use tracing::{error, info};

use crate::config::SimConfig;
use crate::engine::{RunSummary, Simulation};
use crate::error::SimResult;
use crate::orbit::scenarios::Scenario;

use super::output::{print_help, print_summary, print_validation_ok, print_version, summary_json};
use super::{Args, Command};

/// Main CLI entry point.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    match args.command {
        Command::Run {
            target,
            ticks,
            dt,
            json,
        } => run_simulation(&target, ticks, dt, json),
        Command::Validate { config_path } => validate_config(&config_path),
        Command::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Command::Version => {
            print_version();
            ExitCode::SUCCESS
        }
    }
}

/// Resolve a preset name, falling back to a YAML path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not validate.
pub fn load_target(target: &str) -> SimResult<SimConfig> {
    if let Some(scenario) = Scenario::from_name(target) {
        info!(scenario = scenario.name(), "using preset");
        return Ok(scenario.config());
    }
    SimConfig::load(target)
}

/// Build, run and summarise.
///
/// A guard halt ends the run early but still yields a summary, with
/// `halted` set.
///
/// # Errors
///
/// Returns construction errors and tick errors other than a halt.
pub fn simulate(config: SimConfig, ticks: u64, dt: f64) -> SimResult<RunSummary> {
    let mut sim = Simulation::new(config)?;
    match sim.run(ticks, dt) {
        Err(e) if sim.halted().is_none() => Err(e),
        _ => Ok(sim.summary()),
    }
}

/// Run headless and print the summary.
#[must_use]
pub fn run_simulation(target: &str, ticks: u64, dt: f64, json: bool) -> ExitCode {
    let summary = match load_target(target).and_then(|config| simulate(config, ticks, dt)) {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, source = target, "run failed");
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    if json {
        match summary_json(&summary) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::from(1);
            }
        }
    } else {
        print_summary(&summary);
    }

    if summary.halted.is_some() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

/// Load and validate a configuration file.
#[must_use]
pub fn validate_config(path: &Path) -> ExitCode {
    match SimConfig::load(path) {
        Ok(config) => {
            print_validation_ok(&config);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {}: {e}", path.display());
            ExitCode::from(1)
        }
    }
}
