//! CLI output formatting.

use crate::config::SimConfig;
use crate::engine::RunSummary;
use crate::error::SimResult;
use crate::orbit::scenarios::Scenario;

/// Print version information.
pub fn print_version() {
    println!("{}", version_line());
}

/// `tidelock <version> (<git hash>)`, hash omitted when the build had none.
#[must_use]
pub fn version_line() -> String {
    let version = option_env!("TIDELOCK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    match option_env!("GIT_HASH").filter(|h| !h.is_empty()) {
        Some(hash) => format!("tidelock {version} ({})", hash.chars().take(12).collect::<String>()),
        None => format!("tidelock {version}"),
    }
}

/// Print help message.
pub fn print_help() {
    println!(
        r"tidelock - two-body orbits with tidal locking

USAGE:
    tidelock <COMMAND> [OPTIONS]

COMMANDS:
    run <config.yaml|preset>    Run headless and print a summary
        --ticks <N>             Host ticks to take (default: 1000)
        --dt <S>                Wall seconds per tick (default: 1/60)
        --json                  Print the summary as JSON

    validate <config.yaml>      Check a configuration file

    help                        Show this help message
    version                     Show version information

PRESETS:
{}
LOGGING:
    Set RUST_LOG (e.g. RUST_LOG=tidelock=debug) for diagnostics on stderr.
",
        preset_list()
    );
}

fn preset_list() -> String {
    Scenario::ALL
        .iter()
        .map(|s| format!("    {}\n", s.name()))
        .collect()
}

/// Human-readable summary.
#[must_use]
pub fn format_summary(summary: &RunSummary) -> String {
    let optional = |v: Option<f64>| v.map_or_else(|| "unbound".to_string(), |x| format!("{x:.6}"));
    let mut out = String::new();
    out.push_str(&format!("Simulation: {}\n", summary.name));
    out.push_str(&format!("  ticks            {}\n", summary.ticks));
    out.push_str(&format!("  sim time         {:.6}\n", summary.sim_time));
    out.push_str(&format!("  kernel           {}\n", summary.kernel));
    out.push_str(&format!("  orbital period   {}\n", optional(summary.orbital_period)));
    out.push_str(&format!("  semi-major axis  {}\n", optional(summary.semi_major_axis)));
    out.push_str(&format!("  eccentricity     {:.6}\n", summary.eccentricity));
    out.push_str(&format!("  energy drift     {:.3e}\n", summary.energy_drift));
    out.push_str(&format!("  resyncs          {}\n", summary.resyncs));
    out.push_str(&format!("  primary spin     {:.6}\n", summary.primary_rotation_period));
    out.push_str(&format!("  secondary spin   {:.6}\n", summary.secondary_rotation_period));
    out.push_str(&format!("  spin mode        {}\n", format!("{:?}", summary.spin_mode).to_lowercase()));
    out.push_str(&format!("  locked           {}\n", if summary.locked { "yes" } else { "no" }));
    out.push_str(&format!("  discrete cycles  {}\n", summary.discrete_cycles));
    if let Some(reason) = &summary.halted {
        out.push_str(&format!("  halted           {reason}\n"));
    } else if summary.paused {
        out.push_str("  paused           yes\n");
    }
    out
}

/// Print the summary as text.
pub fn print_summary(summary: &RunSummary) {
    print!("{}", format_summary(summary));
}

/// Summary as pretty JSON.
///
/// # Errors
///
/// Returns `Serialization` if encoding fails.
pub fn summary_json(summary: &RunSummary) -> SimResult<String> {
    serde_json::to_string_pretty(summary).map_err(|e| crate::error::SimError::serialization(e.to_string()))
}

/// Print what a valid configuration describes.
pub fn print_validation_ok(config: &SimConfig) {
    let bodies = &config.bodies;
    println!("✓ {} is valid", config.name);
    println!("  reduction        {:?}", bodies.reduction);
    println!("  primary mass     {}", bodies.primary.mass);
    println!("  secondary mass   {}", bodies.secondary.mass);
    println!("  substeps         {}", config.integrator.num_substeps);
    println!("  kernel           {:?}", config.integrator.kernel);
    println!("  spin mode        {:?}", config.spin.mode);
    println!("  time scale       {}", config.time_scale);
}
