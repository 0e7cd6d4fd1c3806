//! CLI module tests.

use super::args::{Args, Command, DEFAULT_DT, DEFAULT_TICKS};
use super::commands::{load_target, run_cli, run_simulation, simulate, validate_config};
use super::output::{format_summary, summary_json, version_line};
use crate::config::SimConfig;
use crate::orbit::scenarios::Scenario;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

// ============================================================================
// Args parsing tests
// ============================================================================

#[test]
fn test_parse_no_args_shows_help() {
    let args = Args::parse_from(["tidelock"]);
    assert_eq!(args.command, Command::Help);
}

#[test]
fn test_parse_help_forms() {
    for flag in ["-h", "--help", "help"] {
        assert_eq!(Args::parse_from(["tidelock", flag]).command, Command::Help);
    }
}

#[test]
fn test_parse_version_forms() {
    for flag in ["-V", "--version", "version"] {
        assert_eq!(Args::parse_from(["tidelock", flag]).command, Command::Version);
    }
}

#[test]
fn test_parse_unknown_command() {
    let args = Args::parse_from(["tidelock", "orbit-everything"]);
    assert_eq!(args.command, Command::Help);
}

#[test]
fn test_parse_run_defaults() {
    let args = Args::parse_from(["tidelock", "run", "moon.yaml"]);
    assert_eq!(
        args.command,
        Command::Run {
            target: "moon.yaml".to_string(),
            ticks: DEFAULT_TICKS,
            dt: DEFAULT_DT,
            json: false,
        }
    );
}

#[test]
fn test_parse_run_with_options() {
    let args = Args::parse_from([
        "tidelock", "run", "eccentric", "--ticks", "50", "--dt", "0.5", "--json",
    ]);
    match args.command {
        Command::Run {
            target,
            ticks,
            dt,
            json,
        } => {
            assert_eq!(target, "eccentric");
            assert_eq!(ticks, 50);
            assert!((dt - 0.5).abs() < f64::EPSILON);
            assert!(json);
        }
        other => panic!("Expected Run command, got {other:?}"),
    }
}

#[test]
fn test_parse_run_bad_values_keep_defaults() {
    let args = Args::parse_from(["tidelock", "run", "x.yaml", "--ticks", "many", "--dt", "-1"]);
    match args.command {
        Command::Run { ticks, dt, .. } => {
            assert_eq!(ticks, DEFAULT_TICKS);
            assert!((dt - DEFAULT_DT).abs() < f64::EPSILON);
        }
        other => panic!("Expected Run command, got {other:?}"),
    }
}

#[test]
fn test_parse_run_without_target_shows_help() {
    let args = Args::parse_from(["tidelock", "run"]);
    assert_eq!(args.command, Command::Help);
}

#[test]
fn test_parse_validate() {
    let args = Args::parse_from(["tidelock", "validate", "moon.yaml"]);
    assert_eq!(
        args.command,
        Command::Validate {
            config_path: PathBuf::from("moon.yaml")
        }
    );
    assert_eq!(Args::parse_from(["tidelock", "validate"]).command, Command::Help);
}

// ============================================================================
// Command tests
// ============================================================================

#[test]
fn test_load_target_prefers_presets() {
    let config = load_target("lunar-ratio").expect("preset");
    assert_eq!(config.name, Scenario::LunarRatio.name());
}

#[test]
fn test_load_target_reads_files() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    let yaml = Scenario::Eccentric.config().to_yaml().expect("yaml");
    file.write_all(yaml.as_bytes()).expect("write");
    let config = load_target(file.path().to_str().expect("utf-8 path")).expect("load");
    assert_eq!(config.name, "eccentric");
}

#[test]
fn test_load_target_missing_file() {
    assert!(load_target("/nonexistent/tidelock.yaml").is_err());
}

#[test]
fn test_simulate_produces_summary() {
    let summary = simulate(Scenario::Eccentric.config(), 20, 0.1).expect("run");
    assert_eq!(summary.ticks, 20);
    assert_eq!(summary.kernel, "polar");
    assert!(summary.energy_drift < 1e-9);
    assert!(summary.halted.is_none());
}

#[test]
fn test_simulate_reports_guard_pause() {
    let mut config = Scenario::LunarRatio.config();
    config.jidoka.energy_tolerance = 1e-300;
    config.jidoka.max_warnings_before_pause = 1;
    config.integrator.num_substeps = 1;
    let summary = simulate(config, 5, 1.0).expect("run");
    assert!(summary.paused);
    assert!(summary.halted.is_none());
    // Ticks after the pause still count, but the orbit stands still.
    assert!(summary.sim_time <= 1.0 + 1e-12);
}

#[test]
fn test_simulate_reports_guard_halt() {
    let mut config = Scenario::EqualMassBinary.config();
    config.time_scale = 1e200;
    let summary = simulate(config, 5, 0.1).expect("halt still summarises");
    assert!(summary.halted.as_deref().is_some_and(|r| r.contains("Non-finite")));
    assert_eq!(summary.ticks, 1);
}

#[test]
fn test_run_simulation_exit_code_on_halt() {
    let mut config = Scenario::EqualMassBinary.config();
    config.time_scale = 1e200;
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(config.to_yaml().expect("yaml").as_bytes()).expect("write");
    let path = file.path().to_str().expect("utf-8 path");
    assert_eq!(run_simulation(path, 5, 0.1, false), ExitCode::from(2));
}

#[test]
fn test_format_summary_lists_fields() {
    let summary = simulate(SimConfig::default(), 3, 1.0 / 60.0).expect("run");
    let text = format_summary(&summary);
    assert!(text.contains("Simulation: earth-moon"));
    assert!(text.contains("orbital period"));
    assert!(text.contains("spin mode        continuous"));
    assert!(text.contains("locked           no"));
}

#[test]
fn test_summary_json_round_trips_through_value() {
    let summary = simulate(Scenario::EqualMassBinary.config(), 2, 0.1).expect("run");
    let json = summary_json(&summary).expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
    assert_eq!(value["name"], "equal-mass-binary");
    assert_eq!(value["ticks"], 2);
    assert_eq!(value["spin_mode"], "free");
}

#[test]
fn test_run_simulation_exit_codes() {
    assert_eq!(run_simulation("lunar-ratio", 3, 1.0, true), ExitCode::SUCCESS);
    assert_eq!(run_simulation("no-such-preset.yaml", 3, 1.0, false), ExitCode::from(1));
}

#[test]
fn test_validate_config_exit_codes() {
    let mut good = tempfile::NamedTempFile::new().expect("temp file");
    let yaml = SimConfig::default().to_yaml().expect("yaml");
    good.write_all(yaml.as_bytes()).expect("write");
    assert_eq!(validate_config(good.path()), ExitCode::SUCCESS);

    let mut bad = tempfile::NamedTempFile::new().expect("temp file");
    bad.write_all(b"bodies: [not, a, map]\n").expect("write");
    assert_eq!(validate_config(bad.path()), ExitCode::from(1));
}

#[test]
fn test_run_cli_help_and_version() {
    assert_eq!(run_cli(Args { command: Command::Help }), ExitCode::SUCCESS);
    assert_eq!(run_cli(Args { command: Command::Version }), ExitCode::SUCCESS);
}

#[test]
fn test_version_line_names_the_binary() {
    assert!(version_line().starts_with("tidelock "));
    assert!(version_line().contains(env!("CARGO_PKG_VERSION")));
}
