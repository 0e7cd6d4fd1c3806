//! Spin–orbit coupling (tidal locking).
//!
//! A rotating body's spin period can be left alone ([`SpinMode::Free`]),
//! relaxed smoothly toward the orbital period
//! ([`SpinMode::Continuous`]), or locked in steps with a bulge
//! realignment between them ([`SpinMode::Discrete`]).
//!
//! Whatever the mode, the spin angle itself always advances by
//! `Δθ = Δt_scaled · 360 / P` with the period current at that tick.

pub mod discrete;
pub mod oscillation;
pub mod relaxation;

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::orbit::body::Body;

pub use discrete::{DiscreteLocking, DiscretePhase, PeriodFactorSync, DEFAULT_SYNC_GAIN, DEFAULT_SYNC_TOLERANCE};
pub use oscillation::{BulgeOscillator, OscillatorParams};
pub use relaxation::{ContinuousRelaxation, RelaxationStep};

/// How the secondary's spin period evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpinMode {
    /// Period stays where it was set.
    Free,
    /// Power-law relaxation toward the orbital period.
    #[default]
    Continuous,
    /// Stepped locking with periodic bulge realignment.
    Discrete,
}

/// A spin period change worth telling observers about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodChange {
    /// Period before the change.
    pub old: f64,
    /// Period after the change.
    pub new: f64,
    /// The change completed the lock.
    pub locked: bool,
}

/// Mode-dispatching spin coupling for the secondary body.
#[derive(Debug, Clone)]
pub struct SpinCoupling {
    mode: SpinMode,
    relaxation: ContinuousRelaxation,
    discrete: DiscreteLocking,
    sync_gain: f64,
    sync_tolerance: f64,
    factor: Option<PeriodFactorSync>,
}

impl SpinCoupling {
    /// Assemble from parts.
    #[must_use]
    pub const fn new(mode: SpinMode, relaxation: ContinuousRelaxation, discrete: DiscreteLocking) -> Self {
        Self {
            mode,
            relaxation,
            discrete,
            sync_gain: DEFAULT_SYNC_GAIN,
            sync_tolerance: DEFAULT_SYNC_TOLERANCE,
            factor: None,
        }
    }

    /// Replace the discrete period-factor gain and snap tolerance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` unless `0 < gain ≤ 1` and `tolerance > 0`.
    pub fn with_sync(mut self, gain: f64, tolerance: f64) -> SimResult<Self> {
        PeriodFactorSync::with_gain(1.0, gain, tolerance)?;
        self.sync_gain = gain;
        self.sync_tolerance = tolerance;
        Ok(self)
    }

    /// Prime the discrete factor from the body's current spin.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the implied factor is not positive.
    pub fn prime(&mut self, body: &Body, orbital_period: f64) -> SimResult<()> {
        self.relaxation.unlock();
        self.discrete.reset();
        self.factor = if orbital_period.is_finite() && orbital_period > 0.0 {
            Some(PeriodFactorSync::with_gain(
                body.rotation_period() / orbital_period,
                self.sync_gain,
                self.sync_tolerance,
            )?)
        } else {
            None
        };
        Ok(())
    }

    /// Continuous-mode period update for one tick.
    ///
    /// # Errors
    ///
    /// Propagates relaxation errors.
    pub fn relax(&mut self, body: &mut Body, orbital_period: f64, scaled_dt: f64) -> SimResult<Option<PeriodChange>> {
        if self.mode != SpinMode::Continuous {
            return Ok(None);
        }
        let old = body.rotation_period();
        let step = self.relaxation.advance(old, orbital_period, scaled_dt)?;
        if (step.period - old).abs() > 0.0 || step.locked_now {
            body.set_rotation_period(step.period)?;
            return Ok(Some(PeriodChange {
                old,
                new: step.period,
                locked: step.locked_now,
            }));
        }
        Ok(None)
    }

    /// Discrete-mode bookkeeping after a realignment: close the cycle and
    /// move the period one notch toward the orbital period.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting period is rejected by the body.
    pub fn complete_cycle(&mut self, body: &mut Body, orbital_period: f64) -> SimResult<Option<PeriodChange>> {
        self.discrete.finish_reshape();
        let Some(factor) = self.factor.as_mut() else {
            return Ok(None);
        };
        let was_synchronised = factor.is_synchronised();
        factor.step();
        let old = body.rotation_period();
        let new = factor.spin_period(orbital_period).max(self.relaxation.min_period());
        body.set_rotation_period(new)?;
        Ok(Some(PeriodChange {
            old,
            new,
            locked: factor.is_synchronised() && !was_synchronised,
        }))
    }

    /// Discrete-mode bookkeeping when a realignment is abandoned: the sweep
    /// restarts and the period is left as it was.
    pub fn abort_cycle(&mut self) {
        self.discrete.abort_reshape();
    }

    /// Whether the spin has reached the orbital period.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        match self.mode {
            SpinMode::Free => false,
            SpinMode::Continuous => self.relaxation.is_locked(),
            SpinMode::Discrete => self.factor.as_ref().is_some_and(PeriodFactorSync::is_synchronised),
        }
    }

    /// Active mode.
    #[must_use]
    pub const fn mode(&self) -> SpinMode {
        self.mode
    }

    /// Continuous relaxation law.
    #[must_use]
    pub const fn relaxation(&self) -> &ContinuousRelaxation {
        &self.relaxation
    }

    /// Discrete sweep bookkeeping.
    #[must_use]
    pub const fn discrete(&self) -> &DiscreteLocking {
        &self.discrete
    }

    /// Record orbital sweep in discrete mode; `true` when a realignment is due.
    pub fn record_sweep(&mut self, delta_degrees: f64) -> bool {
        self.mode == SpinMode::Discrete && self.discrete.record_sweep(delta_degrees)
    }

    /// Discrete period factor, once primed against a bound orbit.
    #[must_use]
    pub const fn period_factor(&self) -> Option<&PeriodFactorSync> {
        self.factor.as_ref()
    }
}
