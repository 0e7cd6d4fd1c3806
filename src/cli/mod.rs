//! CLI module for tidelock.
//!
//! All CLI logic lives here rather than in main.rs so it can be tested.
//! The entry point `run_cli` is called from main.rs with parsed arguments.

mod args;
mod commands;
mod output;

pub use args::{Args, Command, DEFAULT_DT, DEFAULT_TICKS};
pub use commands::{load_target, run_cli, run_simulation, simulate, validate_config};
pub use output::{
    format_summary, print_help, print_summary, print_validation_ok, print_version, summary_json,
    version_line,
};

#[cfg(test)]
mod tests;
