//! Stepped tidal locking.
//!
//! The body spins freely while the orbit sweeps up to `max_step_angle`
//! degrees. At the cap the orbit pauses and the bulge is swung back onto
//! the line to the primary (see [`crate::transition`]); afterwards the
//! spin period moves one notch closer to the orbital period through a
//! [`PeriodFactorSync`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{require_positive, SimError, SimResult};

/// Default sweep before a realignment, in degrees.
pub const DEFAULT_MAX_STEP_ANGLE: f64 = 45.0;

/// Default fraction of the remaining gap closed per cycle.
pub const DEFAULT_SYNC_GAIN: f64 = 0.3;

/// Default distance from 1 at which the factor snaps.
pub const DEFAULT_SYNC_TOLERANCE: f64 = 0.05;

/// Where the discrete cycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscretePhase {
    /// Orbit and spin advance.
    #[default]
    Orbiting,
    /// Orbit paused while the bulge realigns.
    Reshaping,
}

/// Orbit-sweep bookkeeping for stepped locking.
#[derive(Debug, Clone)]
pub struct DiscreteLocking {
    max_step_angle: f64,
    orbital_angle_offset: f64,
    phase: DiscretePhase,
    cycles: u64,
}

impl Default for DiscreteLocking {
    fn default() -> Self {
        Self {
            max_step_angle: DEFAULT_MAX_STEP_ANGLE,
            orbital_angle_offset: 0.0,
            phase: DiscretePhase::Orbiting,
            cycles: 0,
        }
    }
}

impl DiscreteLocking {
    /// Create with a sweep cap in degrees.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `max_step_angle` is not positive.
    pub fn new(max_step_angle: f64) -> SimResult<Self> {
        Ok(Self {
            max_step_angle: require_positive("max_step_angle", max_step_angle)?,
            ..Self::default()
        })
    }

    /// Record `delta_degrees` of orbital sweep. Returns `true` when the cap
    /// is reached and the caller must start a realignment.
    pub fn record_sweep(&mut self, delta_degrees: f64) -> bool {
        if self.phase == DiscretePhase::Reshaping {
            return false;
        }
        self.orbital_angle_offset += delta_degrees.abs();
        if self.orbital_angle_offset >= self.max_step_angle {
            self.phase = DiscretePhase::Reshaping;
            debug!(
                swept = self.orbital_angle_offset,
                cap = self.max_step_angle,
                "discrete step cap reached"
            );
            return true;
        }
        false
    }

    /// Close the current cycle after the realignment finished.
    pub fn finish_reshape(&mut self) {
        self.orbital_angle_offset = 0.0;
        self.phase = DiscretePhase::Orbiting;
        self.cycles += 1;
    }

    /// Abandon the current realignment; the sweep starts over uncounted.
    pub fn abort_reshape(&mut self) {
        self.orbital_angle_offset = 0.0;
        self.phase = DiscretePhase::Orbiting;
    }

    /// Return to the start of a cycle and forget completed cycles.
    pub fn reset(&mut self) {
        self.orbital_angle_offset = 0.0;
        self.phase = DiscretePhase::Orbiting;
        self.cycles = 0;
    }

    /// Sweep cap in degrees.
    #[must_use]
    pub const fn max_step_angle(&self) -> f64 {
        self.max_step_angle
    }

    /// Sweep accumulated since the last realignment.
    #[must_use]
    pub const fn orbital_angle_offset(&self) -> f64 {
        self.orbital_angle_offset
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> DiscretePhase {
        self.phase
    }

    /// Completed cycles.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }
}

/// Steps a period factor `f` (spin period = `f · T_orbit`) toward 1.
#[derive(Debug, Clone)]
pub struct PeriodFactorSync {
    factor: f64,
    gain: f64,
    tolerance: f64,
}

impl PeriodFactorSync {
    /// Start from `factor` with the default gain and tolerance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `factor` is not positive.
    pub fn new(factor: f64) -> SimResult<Self> {
        Self::with_gain(factor, DEFAULT_SYNC_GAIN, DEFAULT_SYNC_TOLERANCE)
    }

    /// Start from `factor` with explicit constants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` unless all three are positive; a gain above 1
    /// would overshoot and is rejected too.
    pub fn with_gain(factor: f64, gain: f64, tolerance: f64) -> SimResult<Self> {
        require_positive("period_factor", factor)?;
        require_positive("sync_gain", gain)?;
        require_positive("sync_tolerance", tolerance)?;
        if gain > 1.0 {
            return Err(SimError::invalid_parameter("sync_gain", gain));
        }
        Ok(Self {
            factor,
            gain,
            tolerance,
        })
    }

    /// One cycle: `f += gain · (1 − f)`, snapping to 1 inside the tolerance.
    /// Returns the new factor.
    pub fn step(&mut self) -> f64 {
        let offset = 1.0 - self.factor;
        if offset.abs() < self.tolerance {
            if (self.factor - 1.0).abs() > 0.0 {
                info!("period factor synchronised");
            }
            self.factor = 1.0;
        } else {
            self.factor += self.gain * offset;
        }
        self.factor
    }

    /// Current factor.
    #[must_use]
    pub const fn factor(&self) -> f64 {
        self.factor
    }

    /// Whether `f` has reached 1.
    #[must_use]
    pub fn is_synchronised(&self) -> bool {
        (self.factor - 1.0).abs() < f64::EPSILON
    }

    /// Spin period implied by the factor.
    #[must_use]
    pub fn spin_period(&self, orbital_period: f64) -> f64 {
        self.factor * orbital_period
    }
}
