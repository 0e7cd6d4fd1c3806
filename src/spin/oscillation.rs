//! Damped return of a displaced tidal bulge.
//!
//! After the bulge is dragged off the line to the primary it swings back
//! as a damped harmonic oscillator, `m·ẍ = −k·x − b·ẋ`, integrated with
//! substepped semi-implicit Euler.

use serde::{Deserialize, Serialize};

use crate::error::{require_positive, SimError, SimResult};

/// Upper bound on substeps per call.
pub const MAX_SUBSTEPS: u32 = 100_000;

/// `e^-40` of the starting amplitude counts as rest.
const SETTLED_EXPONENT: f64 = 40.0;

/// Oscillator constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorParams {
    /// Spring constant `k`.
    pub stiffness: f64,
    /// Damping `b`.
    pub damping: f64,
    /// Mass `m`.
    pub mass: f64,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            stiffness: 8.0,
            damping: 5.0,
            mass: 1.0,
        }
    }
}

/// Bulge angle offset in degrees and its rate.
#[derive(Debug, Clone, Default)]
pub struct BulgeOscillator {
    params: OscillatorParams,
    displacement: f64,
    velocity: f64,
    held: bool,
}

impl BulgeOscillator {
    /// Create with explicit constants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` unless stiffness and mass are positive and
    /// damping is non-negative.
    pub fn new(params: OscillatorParams) -> SimResult<Self> {
        require_positive("stiffness", params.stiffness)?;
        require_positive("oscillator_mass", params.mass)?;
        if !(params.damping.is_finite() && params.damping >= 0.0) {
            return Err(SimError::invalid_parameter("damping", params.damping));
        }
        Ok(Self {
            params,
            ..Self::default()
        })
    }

    /// Hold the bulge at `degrees` off the rest position (user drag).
    pub fn grab(&mut self, degrees: f64) {
        self.displacement = degrees;
        self.velocity = 0.0;
        self.held = true;
    }

    /// Let go; the bulge starts swinging back on the next step.
    pub fn release(&mut self) {
        self.held = false;
    }

    /// Advance by `scaled_dt` in at least `min_substeps` pieces.
    ///
    /// The substep never exceeds [`Self::max_substep`], so a large time
    /// multiplier costs more substeps instead of blowing up. A step long
    /// enough for the damping to erase the motion lands at rest; beyond
    /// [`MAX_SUBSTEPS`] a lightly damped bulge advances only
    /// `MAX_SUBSTEPS` stable substeps, its phase being arbitrary by then.
    pub fn step(&mut self, scaled_dt: f64, min_substeps: u32) {
        if self.held || scaled_dt.is_nan() || scaled_dt <= 0.0 {
            return;
        }
        if scaled_dt * self.decay_rate() > SETTLED_EXPONENT {
            self.displacement = 0.0;
            self.velocity = 0.0;
            return;
        }
        let h_max = self.max_substep();
        let needed = (scaled_dt / h_max).ceil();
        if needed > f64::from(MAX_SUBSTEPS) {
            self.integrate(h_max, MAX_SUBSTEPS);
            return;
        }
        let substeps = (needed as u32).max(min_substeps).max(1);
        self.integrate(scaled_dt / f64::from(substeps), substeps);
    }

    /// Longest substep semi-implicit Euler takes without ringing up:
    /// `1 / (√(k/m) + b/m)`.
    #[must_use]
    pub fn max_substep(&self) -> f64 {
        let OscillatorParams {
            stiffness,
            damping,
            mass,
        } = self.params;
        1.0 / ((stiffness / mass).sqrt() + damping / mass)
    }

    /// Slowest exponential decay rate of the free motion.
    fn decay_rate(&self) -> f64 {
        let OscillatorParams {
            stiffness,
            damping,
            mass,
        } = self.params;
        let half_gamma = 0.5 * damping / mass;
        let omega_sq = stiffness / mass;
        if half_gamma * half_gamma > omega_sq {
            // Overdamped: the slow root dominates.
            half_gamma - (half_gamma * half_gamma - omega_sq).sqrt()
        } else {
            half_gamma
        }
    }

    fn integrate(&mut self, h: f64, substeps: u32) {
        let OscillatorParams {
            stiffness,
            damping,
            mass,
        } = self.params;
        for _ in 0..substeps {
            let accel = (-stiffness * self.displacement - damping * self.velocity) / mass;
            self.velocity += accel * h;
            self.displacement += self.velocity * h;
        }
    }

    /// Zero the oscillator.
    pub fn reset(&mut self) {
        self.displacement = 0.0;
        self.velocity = 0.0;
        self.held = false;
    }

    /// Current offset in degrees.
    #[must_use]
    pub const fn displacement(&self) -> f64 {
        self.displacement
    }

    /// Current angular rate in degrees per time unit.
    #[must_use]
    pub const fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Whether the user is holding the bulge.
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.held
    }

    /// Whether the motion has died out below `tolerance` degrees.
    #[must_use]
    pub fn is_settled(&self, tolerance: f64) -> bool {
        self.displacement.abs() < tolerance && self.velocity.abs() < tolerance
    }
}
