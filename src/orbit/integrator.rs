//! Substepped orbit integration with periodic resynchronisation.
//!
//! Two interchangeable kernels advance the relative coordinate:
//!
//! - [`CartesianEuler`]: first-order Euler on `r` and `v`. Works for any
//!   orbit, drifts measurably over many periods.
//! - [`PolarAnalytic`]: advances the true anomaly and reads `r` and `v`
//!   straight off the fixed ellipse. No energy drift, bound orbits only.
//!
//! Drift is cancelled by a hard snap: once the accumulated time reaches
//! one period the state is reset to its exact initial values.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::{debug, warn};

use crate::error::{SimError, SimResult};
use crate::orbit::state::TwoBodyState;

/// Substep count used when none is configured.
pub const DEFAULT_SUBSTEPS: u32 = 100;

/// One integration scheme for the relative coordinate.
pub trait StepKernel {
    /// Advance `state` by a single substep of length `h`.
    fn substep(&self, state: &mut TwoBodyState, h: f64);

    /// Short name for logs and summaries.
    fn name(&self) -> &'static str;
}

/// Which half of the Euler update runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateOrder {
    /// `v += a(r)·h; r += v·h` (semi-implicit, symplectic).
    #[default]
    VelocityFirst,
    /// `r += v·h; v += a(r_old)·h` (plain explicit Euler).
    PositionFirst,
}

/// Cartesian Euler kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartesianEuler {
    order: UpdateOrder,
}

impl CartesianEuler {
    /// Create a kernel with the given update order.
    #[must_use]
    pub const fn new(order: UpdateOrder) -> Self {
        Self { order }
    }

    /// Update order in use.
    #[must_use]
    pub const fn order(&self) -> UpdateOrder {
        self.order
    }
}

impl StepKernel for CartesianEuler {
    fn substep(&self, state: &mut TwoBodyState, h: f64) {
        let accel = state.acceleration_at(state.r);
        match self.order {
            UpdateOrder::VelocityFirst => {
                state.v += accel * h;
                state.r += state.v * h;
            }
            UpdateOrder::PositionFirst => {
                state.r += state.v * h;
                state.v += accel * h;
            }
        }
    }

    fn name(&self) -> &'static str {
        "cartesian"
    }
}

/// Polar analytic kernel.
///
/// `θ̇ = |L| / (μ·r²)` in the orbital frame, whose normal is along `L`;
/// the radius then follows from `r(θ) = a(1 − e²)/(1 + e·cos θ)`. The
/// shape `a`, `e` is taken as fixed for the whole run, which holds only
/// while no torque acts on the orbit.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolarAnalytic;

impl StepKernel for PolarAnalytic {
    fn substep(&self, state: &mut TwoBodyState, h: f64) {
        let r_mag = state.r.magnitude().max(state.min_separation());
        let specific_l = state.angular_momentum().magnitude() / state.reduced_mass();
        let theta = (state.theta + specific_l / (r_mag * r_mag) * h).rem_euclid(TAU);
        if let Some((r, v)) = state.analytic_point(theta) {
            state.theta = theta;
            state.r = r;
            state.v = v;
        }
    }

    fn name(&self) -> &'static str {
        "polar"
    }
}

/// Requested kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KernelChoice {
    /// Polar for bound planar orbits, Cartesian otherwise.
    #[default]
    Auto,
    /// Always Cartesian Euler.
    Cartesian,
    /// Polar where possible; unbound or radial orbits fall back to Cartesian.
    Polar,
}

/// What a call to [`OrbitIntegrator::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepOutcome {
    /// The integrator was paused and nothing moved.
    pub skipped: bool,
    /// The state was snapped back to its initial values this step.
    pub resynced: bool,
}

/// Drives a [`TwoBodyState`] forward in substeps.
#[derive(Debug, Clone)]
pub struct OrbitIntegrator {
    num_substeps: u32,
    kernel: KernelChoice,
    cartesian: CartesianEuler,
    reset_after_one_period: bool,
    reset_timer: f64,
    resync_count: u64,
    paused: bool,
}

impl Default for OrbitIntegrator {
    fn default() -> Self {
        Self {
            num_substeps: DEFAULT_SUBSTEPS,
            kernel: KernelChoice::Auto,
            cartesian: CartesianEuler::default(),
            reset_after_one_period: true,
            reset_timer: 0.0,
            resync_count: 0,
            paused: false,
        }
    }
}

impl OrbitIntegrator {
    /// Create an integrator with `num_substeps` substeps per step.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `num_substeps` is zero.
    pub fn new(num_substeps: u32) -> SimResult<Self> {
        if num_substeps == 0 {
            return Err(SimError::invalid_parameter("num_substeps", 0.0));
        }
        Ok(Self {
            num_substeps,
            ..Self::default()
        })
    }

    /// Select the kernel.
    #[must_use]
    pub const fn with_kernel(mut self, kernel: KernelChoice) -> Self {
        self.kernel = kernel;
        self
    }

    /// Select the Cartesian update order.
    #[must_use]
    pub const fn with_update_order(mut self, order: UpdateOrder) -> Self {
        self.cartesian = CartesianEuler::new(order);
        self
    }

    /// Enable or disable the once-per-period snap.
    #[must_use]
    pub const fn with_reset_after_one_period(mut self, enabled: bool) -> Self {
        self.reset_after_one_period = enabled;
        self
    }

    /// Kernel that will actually run for `state`.
    #[must_use]
    pub fn active_kernel(&self, state: &TwoBodyState) -> &dyn StepKernel {
        match self.kernel {
            KernelChoice::Cartesian => &self.cartesian,
            KernelChoice::Auto | KernelChoice::Polar if state.supports_polar() => &PolarAnalytic,
            KernelChoice::Auto | KernelChoice::Polar => &self.cartesian,
        }
    }

    /// Log the kernel decision for a freshly reset state and clear the timer.
    pub fn prepare(&mut self, state: &TwoBodyState) {
        self.reset_timer = 0.0;
        let active = self.active_kernel(state).name();
        if self.kernel == KernelChoice::Polar && active != "polar" {
            warn!(
                bound = state.is_bound(),
                "polar kernel cannot represent this orbit, using cartesian"
            );
        }
        debug!(kernel = active, substeps = self.num_substeps, "integrator prepared");
    }

    /// Advance `state` by `dt · time_scale`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a negative or non-finite `dt` or
    /// `time_scale`. A state that blows up is returned as is, without a
    /// resync; [`crate::orbit::jidoka::OrbitJidokaGuard`] decides what happens next.
    pub fn step(&mut self, state: &mut TwoBodyState, dt: f64, time_scale: f64) -> SimResult<StepOutcome> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(SimError::invalid_parameter("dt", dt));
        }
        if !(time_scale.is_finite() && time_scale >= 0.0) {
            return Err(SimError::invalid_parameter("time_scale", time_scale));
        }
        if self.paused {
            return Ok(StepOutcome {
                skipped: true,
                resynced: false,
            });
        }

        let scaled = dt * time_scale;
        let h = scaled / f64::from(self.num_substeps);
        {
            let kernel = self.active_kernel(state);
            for _ in 0..self.num_substeps {
                kernel.substep(state, h);
            }
        }
        state.elapsed += scaled;

        let mut outcome = StepOutcome::default();
        // A blown-up state is left for the guard to halt on; a resync would hide it.
        if !state.r.is_finite() || !state.v.is_finite() {
            warn!(elapsed = state.elapsed, "relative state is no longer finite");
            return Ok(outcome);
        }

        self.reset_timer += scaled;
        // An unbound orbit has an infinite period and never resyncs.
        let period = state.period();
        if self.reset_after_one_period && period.is_finite() && self.reset_timer >= period {
            self.reset_timer = 0.0;
            state.snap_to_initial();
            self.resync_count += 1;
            outcome.resynced = true;
            debug!(count = self.resync_count, period, "periodic resync");
        }
        Ok(outcome)
    }

    /// Forget accumulated time and counters.
    pub fn reset(&mut self) {
        self.reset_timer = 0.0;
        self.resync_count = 0;
    }

    /// Stop advancing until [`Self::resume`].
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after [`Self::pause`].
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether stepping is suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fraction of the current period elapsed since the last snap, in `[0, 1)`.
    ///
    /// Always zero for unbound orbits.
    #[must_use]
    pub fn orbital_phase(&self, state: &TwoBodyState) -> f64 {
        let period = state.period();
        if period.is_finite() && period > 0.0 {
            (self.reset_timer / period).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Substeps per step.
    #[must_use]
    pub const fn num_substeps(&self) -> u32 {
        self.num_substeps
    }

    /// Requested kernel.
    #[must_use]
    pub const fn kernel(&self) -> KernelChoice {
        self.kernel
    }

    /// Whether the once-per-period snap is on.
    #[must_use]
    pub const fn reset_after_one_period(&self) -> bool {
        self.reset_after_one_period
    }

    /// Time accumulated since the last snap.
    #[must_use]
    pub const fn reset_timer(&self) -> f64 {
        self.reset_timer
    }

    /// Number of snaps since construction or [`Self::reset`].
    #[must_use]
    pub const fn resync_count(&self) -> u64 {
        self.resync_count
    }
}
