//! Two-body orbit kernel.
//!
//! Implements the reduced two-body problem with:
//! - Unit systems with `G` cached once (Poka-Yoke: no mid-run unit changes)
//! - Substepped Cartesian Euler and drift-free polar analytic kernels
//! - Periodic resynchronisation to the exact initial state
//! - Jidoka guards with graceful degradation
//! - Pre-built scenarios (Earth–Moon, binary, lunar ratio, tidal locking)
//!
//! # Toyota Way Principles
//!
//! - **Jidoka (自働化)**: Graceful degradation anomaly detection
//! - **Poka-Yoke (ポカヨケ)**: Validated bodies and fixed units
//!
//! # Example
//!
//! ```rust
//! use tidelock::orbit::prelude::*;
//!
//! let config = Scenario::LunarRatio.config();
//! let result = run_orbit(&config, 10, 1.0).expect("valid scenario");
//! assert_eq!(result.steps, 10);
//! ```

pub mod body;
pub mod integrator;
pub mod jidoka;
pub mod metamorphic;
pub mod scenarios;
pub mod state;
pub mod units;
pub mod vector;

use tracing::warn;

use crate::config::SimConfig;
use crate::error::SimResult;
use jidoka::{JidokaResponse, OrbitJidokaGuard};
use state::TwoBodyState;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::body::{wrap_degrees, Body};
    pub use super::integrator::{
        CartesianEuler, KernelChoice, OrbitIntegrator, PolarAnalytic, StepKernel, StepOutcome,
        UpdateOrder,
    };
    pub use super::jidoka::{
        JidokaResponse, JidokaStatus, OrbitJidokaConfig, OrbitJidokaGuard, OrbitJidokaViolation,
    };
    pub use super::metamorphic::{run_all_metamorphic_tests, MetamorphicResult};
    pub use super::scenarios::{KeplerOrbit, Scenario};
    pub use super::state::{InitialConditions, OrbitalFrame, Reduction, TwoBodyState};
    pub use super::units::{LengthUnit, MassUnit, TimeUnit, UnitSystem};
    pub use super::vector::Vec3;
    pub use super::{run_orbit, OrbitRunResult};
}

/// Build the reduced state and integrator a configuration describes.
///
/// # Errors
///
/// Returns an error for invalid bodies, units or integrator settings.
pub fn build_orbit(config: &SimConfig) -> SimResult<(TwoBodyState, integrator::OrbitIntegrator)> {
    let units = config.units.unit_system()?;
    let a = config.bodies.primary.to_body()?;
    let b = config.bodies.secondary.to_body()?;
    let state = TwoBodyState::from_bodies(&a, &b, units.newton_g(), config.bodies.reduction)?
        .with_min_separation(config.integrator.min_separation)?;
    let mut integrator = integrator::OrbitIntegrator::new(config.integrator.num_substeps)?
        .with_kernel(config.integrator.kernel)
        .with_update_order(config.integrator.update_order)
        .with_reset_after_one_period(config.integrator.reset_after_one_period);
    integrator.prepare(&state);
    Ok((state, integrator))
}

/// Integrate the orbit alone for `steps` ticks of `dt`, under Jidoka.
///
/// Spin and tides are left out; this is the orbit kernel on its own.
///
/// # Errors
///
/// Returns an error for an invalid configuration, a bad `dt`, or a halt
/// raised by the guard.
pub fn run_orbit(config: &SimConfig, steps: u64, dt: f64) -> SimResult<OrbitRunResult> {
    config.validate_all()?;
    let (mut state, mut integrator) = build_orbit(config)?;
    let mut guard = OrbitJidokaGuard::new(config.jidoka.clone());
    guard.initialize(&state);

    let mut completed = 0u64;
    let mut warnings = 0u64;
    let mut paused = false;
    let mut max_energy_drift: f64 = 0.0;

    for _ in 0..steps {
        integrator.step(&mut state, dt, config.time_scale)?;
        completed += 1;
        max_energy_drift = max_energy_drift.max(state.energy_drift());

        match guard.check(&state) {
            JidokaResponse::Continue => {}
            JidokaResponse::Warning { .. } => warnings += 1,
            JidokaResponse::Pause { violation, .. } => {
                warn!(%violation, "orbit run paused by guard");
                paused = true;
                break;
            }
            JidokaResponse::Halt { violation } => return Err(violation.to_error()),
        }
    }

    Ok(OrbitRunResult {
        steps: completed,
        warnings,
        paused,
        resyncs: integrator.resync_count(),
        max_energy_drift,
        final_energy_drift: state.energy_drift(),
        sim_time: state.elapsed(),
        final_state: state,
    })
}

/// Result of [`run_orbit`].
#[derive(Debug, Clone)]
pub struct OrbitRunResult {
    /// Final reduced state.
    pub final_state: TwoBodyState,
    /// Number of steps completed.
    pub steps: u64,
    /// Number of guard warnings encountered.
    pub warnings: u64,
    /// Whether the guard paused the run.
    pub paused: bool,
    /// Periodic snaps performed.
    pub resyncs: u64,
    /// Worst relative energy error seen after any step.
    pub max_energy_drift: f64,
    /// Relative energy error at the end.
    pub final_energy_drift: f64,
    /// Simulated time.
    pub sim_time: f64,
}
