//! Continuous power-law relaxation of a spin period toward the orbital period.
//!
//! ```text
//! d   = |P − T| / T
//! rate = sign(P − T) · k · d^p
//! P  ← P − rate · Δt
//! ```
//!
//! When a step would carry `P` across `T` the period snaps to `T` and the
//! relaxation is locked: the sign of `P − T` changes at most once over a
//! whole run.

use tracing::info;

use crate::error::{require_positive, SimError, SimResult};

/// Default rate constant `k`.
pub const DEFAULT_RATE_CONSTANT: f64 = 5.0;

/// Default exponent `p`.
pub const DEFAULT_EXPONENT: f64 = 0.8;

/// Relative gap treated as already locked; keeps `p ≥ 1` from
/// approaching the fixed point forever.
const LOCK_TOLERANCE: f64 = 1e-9;

/// Result of one relaxation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationStep {
    /// Spin period after the tick.
    pub period: f64,
    /// The period reached the orbital period on this tick.
    pub locked_now: bool,
}

/// Power-law spin relaxation with an overshoot snap and a period floor.
#[derive(Debug, Clone)]
pub struct ContinuousRelaxation {
    rate_constant: f64,
    exponent: f64,
    min_period: f64,
    locked: bool,
}

impl Default for ContinuousRelaxation {
    fn default() -> Self {
        Self {
            rate_constant: DEFAULT_RATE_CONSTANT,
            exponent: DEFAULT_EXPONENT,
            min_period: 1e-3,
            locked: false,
        }
    }
}

impl ContinuousRelaxation {
    /// Create a relaxation law.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` unless `rate_constant`, `exponent` and
    /// `min_period` are all positive and finite.
    pub fn new(rate_constant: f64, exponent: f64, min_period: f64) -> SimResult<Self> {
        Ok(Self {
            rate_constant: require_positive("rate_constant", rate_constant)?,
            exponent: require_positive("exponent", exponent)?,
            min_period: require_positive("min_period", min_period)?,
            locked: false,
        })
    }

    /// Advance `spin_period` by `scaled_dt` toward `orbital_period`.
    ///
    /// An infinite orbital period (unbound orbit) leaves the spin untouched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a non-positive spin period.
    pub fn advance(
        &mut self,
        spin_period: f64,
        orbital_period: f64,
        scaled_dt: f64,
    ) -> SimResult<RelaxationStep> {
        require_positive("spin_period", spin_period)?;
        if !orbital_period.is_finite() || orbital_period <= 0.0 {
            return Ok(RelaxationStep {
                period: spin_period,
                locked_now: false,
            });
        }
        if self.locked {
            return Ok(RelaxationStep {
                period: orbital_period.max(self.min_period),
                locked_now: false,
            });
        }

        let previous = spin_period - orbital_period;
        let gap = previous.abs() / orbital_period;
        if gap <= LOCK_TOLERANCE {
            return Ok(self.lock(orbital_period));
        }

        let rate = previous.signum() * self.rate_constant * gap.powf(self.exponent);
        let next = spin_period - rate * scaled_dt;
        let current = next - orbital_period;
        if current == 0.0 || current.signum() != previous.signum() {
            return Ok(self.lock(orbital_period));
        }

        let period = next.max(self.min_period);
        if !period.is_finite() {
            return Err(SimError::NonFiniteValue {
                location: "spin period".to_string(),
            });
        }
        Ok(RelaxationStep {
            period,
            locked_now: false,
        })
    }

    fn lock(&mut self, orbital_period: f64) -> RelaxationStep {
        self.locked = true;
        let period = orbital_period.max(self.min_period);
        info!(period, "spin locked to orbital period");
        RelaxationStep {
            period,
            locked_now: true,
        }
    }

    /// Whether the spin has locked.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Forget the lock, e.g. after the user changes the spin period.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Rate constant `k`.
    #[must_use]
    pub const fn rate_constant(&self) -> f64 {
        self.rate_constant
    }

    /// Exponent `p`.
    #[must_use]
    pub const fn exponent(&self) -> f64 {
        self.exponent
    }

    /// Period floor.
    #[must_use]
    pub const fn min_period(&self) -> f64 {
        self.min_period
    }
}
