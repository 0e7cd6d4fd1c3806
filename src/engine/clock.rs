//! Simulation clock management.
//!
//! The host supplies wall time per tick; the clock scales it by the
//! user-controlled time multiplier and keeps running totals of both.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Wall and simulation time bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimClock {
    /// Total wall time fed in by the host.
    wall: f64,
    /// Total simulation time actually advanced.
    sim: f64,
    /// Number of ticks taken.
    ticks: u64,
    /// Wall-to-simulation multiplier.
    time_scale: f64,
}

impl SimClock {
    /// Create a new clock with the given time multiplier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `time_scale` is negative or not finite.
    pub fn new(time_scale: f64) -> SimResult<Self> {
        let mut clock = Self {
            wall: 0.0,
            sim: 0.0,
            ticks: 0,
            time_scale: 1.0,
        };
        clock.set_time_scale(time_scale)?;
        Ok(clock)
    }

    /// Change the multiplier; applies from the next tick.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `time_scale` is negative or not finite.
    pub fn set_time_scale(&mut self, time_scale: f64) -> SimResult<()> {
        if !(time_scale.is_finite() && time_scale >= 0.0) {
            return Err(SimError::invalid_parameter("time_scale", time_scale));
        }
        self.time_scale = time_scale;
        Ok(())
    }

    /// Record one host tick of `dt` wall time.
    ///
    /// Simulation time only accumulates while `running`. Returns the
    /// scaled duration of the tick either way.
    pub fn tick(&mut self, dt: f64, running: bool) -> f64 {
        let scaled = dt * self.time_scale;
        self.wall += dt;
        self.ticks += 1;
        if running {
            self.sim += scaled;
        }
        scaled
    }

    /// Back to zero, keeping the multiplier.
    pub fn reset(&mut self) {
        self.wall = 0.0;
        self.sim = 0.0;
        self.ticks = 0;
    }

    /// Current multiplier.
    #[must_use]
    pub const fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Wall time seen so far.
    #[must_use]
    pub const fn wall_time(&self) -> f64 {
        self.wall
    }

    /// Simulation time advanced so far.
    #[must_use]
    pub const fn sim_time(&self) -> f64 {
        self.sim
    }

    /// Number of ticks taken.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}
