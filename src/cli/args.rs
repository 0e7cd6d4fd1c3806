//! CLI argument parsing.
//!
//! Hand-rolled so it can be driven from any iterator in tests.

use std::path::PathBuf;

/// Ticks a headless run takes unless `--ticks` says otherwise.
pub const DEFAULT_TICKS: u64 = 1_000;

/// Wall seconds per tick unless `--dt` says otherwise.
pub const DEFAULT_DT: f64 = 1.0 / 60.0;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Run a simulation headless and print its summary.
    Run {
        /// Config file path or preset name.
        target: String,
        /// Number of host ticks.
        ticks: u64,
        /// Wall seconds per tick.
        dt: f64,
        /// Print the summary as JSON.
        json: bool,
    },
    /// Check a config file without running it.
    Validate {
        /// Path to the YAML file.
        config_path: PathBuf,
    },
    /// Show help
    Help,
    /// Show version
    Version,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    ///
    /// The first item is the program name.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    fn parse_from_vec(args: &[String]) -> Self {
        let Some(first) = args.get(1) else {
            return Self {
                command: Command::Help,
            };
        };

        let command = match first.as_str() {
            "run" => Self::parse_run_command(args),
            "validate" => Self::parse_validate_command(args),
            "-h" | "--help" | "help" => Command::Help,
            "-V" | "--version" | "version" => Command::Version,
            unknown => {
                eprintln!("Unknown command: {unknown}");
                Command::Help
            }
        };

        Self { command }
    }

    fn parse_run_command(args: &[String]) -> Command {
        let Some(target) = args.get(2) else {
            eprintln!("Error: 'run' command requires a config path or preset name");
            return Command::Help;
        };

        let mut ticks = DEFAULT_TICKS;
        let mut dt = DEFAULT_DT;
        let mut json = false;

        let mut i = 3;
        while i < args.len() {
            match args[i].as_str() {
                "--ticks" => {
                    if let Some(n) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                        ticks = n;
                    } else {
                        eprintln!("Warning: --ticks expects a whole number, keeping {ticks}");
                    }
                    i += 2;
                }
                "--dt" => {
                    match args.get(i + 1).and_then(|s| s.parse::<f64>().ok()) {
                        Some(value) if value.is_finite() && value >= 0.0 => dt = value,
                        _ => eprintln!("Warning: --dt expects a non-negative number, keeping {dt}"),
                    }
                    i += 2;
                }
                "--json" => {
                    json = true;
                    i += 1;
                }
                other => {
                    eprintln!("Warning: ignoring argument {other}");
                    i += 1;
                }
            }
        }

        Command::Run {
            target: target.clone(),
            ticks,
            dt,
            json,
        }
    }

    fn parse_validate_command(args: &[String]) -> Command {
        let Some(path) = args.get(2) else {
            eprintln!("Error: 'validate' command requires a config path");
            return Command::Help;
        };
        Command::Validate {
            config_path: PathBuf::from(path),
        }
    }
}
