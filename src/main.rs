//! tidelock CLI - headless two-body and tidal-locking runs.
//!
//! All logic lives in the library's `cli` module; this installs logging
//! and hands over.

use std::process::ExitCode;

use tidelock::cli::{run_cli, Args};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    run_cli(Args::parse())
}
