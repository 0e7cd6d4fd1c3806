//! Metamorphic testing for orbital physics invariants.
//!
//! Per Chen et al. [33], metamorphic testing verifies **relations** rather
//! than specific outputs. The integrator is first order and drifts, so the
//! useful checks compare runs against each other or against quantities
//! fixed at reset.
//!
//! # Metamorphic Relations
//!
//! 1. **Rotation Invariance**: Rotating the initial conditions preserves `|r(t)|`
//! 2. **Resync Round Trip**: One period with resync returns the exact initial state
//! 3. **Polar Energy Exactness**: The polar kernel never leaves the energy shell
//! 4. **Substep Refinement**: More substeps never increase Cartesian energy drift
//! 5. **Relaxation Monotonicity**: Spin relaxation closes the gap without oscillating
//!
//! # References
//!
//! [33] Chen et al., "Metamorphic testing: a new approach," Hong Kong UST, 1998.

use crate::error::SimResult;
use crate::orbit::integrator::{KernelChoice, OrbitIntegrator};
use crate::orbit::state::TwoBodyState;
use crate::orbit::vector::Vec3;
use crate::spin::ContinuousRelaxation;

/// Metamorphic test result.
#[derive(Debug, Clone)]
pub struct MetamorphicResult {
    /// Name of the relation tested.
    pub relation: String,
    /// Whether the relation holds within tolerance.
    pub passed: bool,
    /// Measured error/deviation.
    pub error: f64,
    /// Tolerance used.
    pub tolerance: f64,
    /// Additional details.
    pub details: String,
}

impl MetamorphicResult {
    /// Create a passing result.
    #[must_use]
    pub fn pass(relation: &str, error: f64, tolerance: f64) -> Self {
        Self {
            relation: relation.to_string(),
            passed: true,
            error,
            tolerance,
            details: String::new(),
        }
    }

    /// Create a failing result.
    #[must_use]
    pub fn fail(relation: &str, error: f64, tolerance: f64, details: &str) -> Self {
        Self {
            relation: relation.to_string(),
            passed: false,
            error,
            tolerance,
            details: details.to_string(),
        }
    }

    fn judge(relation: &str, error: f64, tolerance: f64) -> Self {
        if error <= tolerance {
            Self::pass(relation, error, tolerance)
        } else {
            Self::fail(relation, error, tolerance, "Deviation exceeds tolerance")
        }
    }

    fn errored(relation: &str, error: &crate::error::SimError) -> Self {
        Self::fail(relation, f64::INFINITY, 0.0, &error.to_string())
    }
}

/// Rebuild `state` with every initial vector rotated about +Y.
fn rotate_state(state: &TwoBodyState, angle: f64) -> SimResult<TwoBodyState> {
    let initial = state.initial();
    let rot = |v: Vec3| v.rotate_about_y(angle);
    TwoBodyState::reset(
        rot(initial.position_a),
        rot(initial.velocity_a),
        state.mass_a(),
        rot(initial.position_b),
        rot(initial.velocity_b),
        state.mass_b(),
        state.newton_g(),
        state.reduction(),
    )?
    .with_min_separation(state.min_separation())
}

fn integrator(num_substeps: u32, kernel: KernelChoice, resync: bool) -> SimResult<OrbitIntegrator> {
    Ok(OrbitIntegrator::new(num_substeps)?
        .with_kernel(kernel)
        .with_reset_after_one_period(resync))
}

/// MR-1: Rotation Invariance
///
/// Separation history must not depend on where in the plane the orbit starts.
pub fn test_rotation_invariance(
    state: &TwoBodyState,
    kernel: KernelChoice,
    angle: f64,
    steps: usize,
    dt: f64,
    tolerance: f64,
) -> MetamorphicResult {
    const RELATION: &str = "Rotation Invariance";
    let run = || -> SimResult<f64> {
        let mut original = state.clone();
        let mut rotated = rotate_state(state, angle)?;
        let mut int_a = integrator(100, kernel, false)?;
        let mut int_b = int_a.clone();
        int_a.prepare(&original);
        int_b.prepare(&rotated);

        let mut max_error: f64 = 0.0;
        for _ in 0..steps {
            int_a.step(&mut original, dt, 1.0)?;
            int_b.step(&mut rotated, dt, 1.0)?;
            let a = original.relative_position().magnitude();
            let b = rotated.relative_position().magnitude();
            max_error = max_error.max((a - b).abs() / a.max(f64::EPSILON));
        }
        Ok(max_error)
    };
    match run() {
        Ok(error) => MetamorphicResult::judge(RELATION, error, tolerance),
        Err(e) => MetamorphicResult::errored(RELATION, &e),
    }
}

/// MR-2: Resync Round Trip
///
/// Integrating one full period with resync enabled lands back on the
/// initial relative state.
pub fn test_resync_round_trip(state: &TwoBodyState, steps: usize, tolerance: f64) -> MetamorphicResult {
    const RELATION: &str = "Resync Round Trip";
    let period = state.period();
    if !period.is_finite() || steps == 0 {
        return MetamorphicResult::fail(RELATION, f64::INFINITY, tolerance, "Orbit has no finite period");
    }
    let run = || -> SimResult<(f64, bool)> {
        let mut s = state.clone();
        let mut int = integrator(100, KernelChoice::Cartesian, true)?;
        int.prepare(&s);
        let dt = period / steps as f64;
        for _ in 1..steps {
            int.step(&mut s, dt, 1.0)?;
        }
        // Land on (or just past) the period despite accumulated rounding.
        let remaining = (period - int.reset_timer()) * (1.0 + 1e-12);
        let outcome = int.step(&mut s, remaining, 1.0)?;
        let r0 = state.initial().position_b - state.initial().position_a;
        Ok(((s.relative_position() - r0).magnitude(), outcome.resynced))
    };
    match run() {
        Ok((_, false)) => MetamorphicResult::fail(RELATION, f64::INFINITY, tolerance, "No resync after one period"),
        Ok((error, true)) => MetamorphicResult::judge(RELATION, error, tolerance),
        Err(e) => MetamorphicResult::errored(RELATION, &e),
    }
}

/// MR-3: Polar Energy Exactness
pub fn test_polar_energy_exactness(state: &TwoBodyState, steps: usize, dt: f64, tolerance: f64) -> MetamorphicResult {
    const RELATION: &str = "Polar Energy Exactness";
    if !state.supports_polar() {
        return MetamorphicResult::fail(RELATION, f64::INFINITY, tolerance, "Orbit not representable by polar kernel");
    }
    let run = || -> SimResult<f64> {
        let mut s = state.clone();
        let mut int = integrator(10, KernelChoice::Polar, false)?;
        int.prepare(&s);
        let mut max_drift: f64 = 0.0;
        for _ in 0..steps {
            int.step(&mut s, dt, 1.0)?;
            max_drift = max_drift.max(s.energy_drift());
        }
        Ok(max_drift)
    };
    match run() {
        Ok(error) => MetamorphicResult::judge(RELATION, error, tolerance),
        Err(e) => MetamorphicResult::errored(RELATION, &e),
    }
}

/// MR-4: Substep Refinement
///
/// Doubling the substep count must not make the Cartesian energy drift
/// over one period worse. Reported error is `fine / coarse`.
pub fn test_substep_refinement(state: &TwoBodyState, num_substeps: u32, steps: usize) -> MetamorphicResult {
    const RELATION: &str = "Substep Refinement";
    let period = state.period();
    if !period.is_finite() || steps == 0 {
        return MetamorphicResult::fail(RELATION, f64::INFINITY, 1.0, "Orbit has no finite period");
    }
    let max_drift = |n: u32| -> SimResult<f64> {
        let mut s = state.clone();
        let mut int = integrator(n, KernelChoice::Cartesian, false)?;
        int.prepare(&s);
        let dt = period / steps as f64;
        let mut drift: f64 = 0.0;
        for _ in 0..steps {
            int.step(&mut s, dt, 1.0)?;
            drift = drift.max(s.energy_drift());
        }
        Ok(drift)
    };
    match (max_drift(num_substeps), max_drift(num_substeps.saturating_mul(2))) {
        (Ok(coarse), Ok(fine)) => {
            let ratio = if coarse > 0.0 { fine / coarse } else { 0.0 };
            MetamorphicResult::judge(RELATION, ratio, 1.0)
        }
        (Err(e), _) | (_, Err(e)) => MetamorphicResult::errored(RELATION, &e),
    }
}

/// MR-5: Relaxation Monotonicity
///
/// `|P − T|` never grows, its sign changes at most once, and the lock is
/// reached. The reported error is the number of sign changes.
pub fn test_relaxation_monotonicity(
    spin_period: f64,
    orbital_period: f64,
    scaled_dt: f64,
    max_ticks: usize,
) -> MetamorphicResult {
    const RELATION: &str = "Relaxation Monotonicity";
    let mut law = ContinuousRelaxation::default();
    let mut period = spin_period;
    let mut gap = (period - orbital_period).abs();
    let mut sign = (period - orbital_period).signum();
    let mut sign_changes = 0_u32;

    for _ in 0..max_ticks {
        let step = match law.advance(period, orbital_period, scaled_dt) {
            Ok(step) => step,
            Err(e) => return MetamorphicResult::errored(RELATION, &e),
        };
        period = step.period;
        let new_gap = (period - orbital_period).abs();
        if new_gap > gap {
            return MetamorphicResult::fail(RELATION, new_gap - gap, 0.0, "Gap to orbital period grew");
        }
        gap = new_gap;
        let new_sign = (period - orbital_period).signum();
        if gap > 0.0 && (new_sign - sign).abs() > 0.0 {
            sign_changes += 1;
            sign = new_sign;
        }
        if law.is_locked() {
            return MetamorphicResult::judge(RELATION, f64::from(sign_changes), 1.0);
        }
    }
    MetamorphicResult::fail(RELATION, gap, 0.0, "Spin never locked")
}

/// Run every relation against one bound orbit.
#[must_use]
pub fn run_all_metamorphic_tests(state: &TwoBodyState) -> Vec<MetamorphicResult> {
    let period = state.period();
    let dt = if period.is_finite() { period / 200.0 } else { 1.0 };
    vec![
        test_rotation_invariance(state, KernelChoice::Cartesian, 0.7, 200, dt, 1e-9),
        test_resync_round_trip(state, 200, 1e-12),
        test_polar_energy_exactness(state, 200, dt, 1e-9),
        test_substep_refinement(state, 50, 100),
        test_relaxation_monotonicity(period * 0.2, period, dt, 1_000_000),
    ]
}
