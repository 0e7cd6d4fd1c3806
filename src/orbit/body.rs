//! A gravitating body with finite extent and its own spin.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::orbit::vector::Vec3;

/// One point mass with a visual radius and an axial spin.
///
/// `radius` only scales the visual outline and tidal sample points; it
/// never enters the gravity law.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// World-space position.
    pub position: Vec3,
    /// World-space velocity.
    pub velocity: Vec3,
    mass: f64,
    radius: f64,
    /// Spin angle in degrees, always kept in `[0, 360)`.
    rotation_angle: f64,
    /// Time for one full spin.
    rotation_period: f64,
}

impl Body {
    /// Create a body, rejecting non-positive mass or radius.
    ///
    /// The rotation period starts at 1 time unit and the spin angle at 0.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBody` if `mass` or `radius` is not positive and finite.
    pub fn new(position: Vec3, velocity: Vec3, mass: f64, radius: f64) -> SimResult<Self> {
        check_positive("mass", mass)?;
        check_positive("radius", radius)?;
        Ok(Self {
            position,
            velocity,
            mass,
            radius,
            rotation_angle: 0.0,
            rotation_period: 1.0,
        })
    }

    /// Set the initial spin period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBody` if `period` is not positive and finite.
    pub fn with_rotation_period(mut self, period: f64) -> SimResult<Self> {
        self.set_rotation_period(period)?;
        Ok(self)
    }

    /// Mass.
    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// Visual radius.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Change the visual radius.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBody` if `radius` is not positive and finite.
    pub fn set_radius(&mut self, radius: f64) -> SimResult<()> {
        self.radius = check_positive("radius", radius)?;
        Ok(())
    }

    /// Spin angle in degrees, in `[0, 360)`.
    #[must_use]
    pub const fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    /// Current spin period.
    #[must_use]
    pub const fn rotation_period(&self) -> f64 {
        self.rotation_period
    }

    /// Replace the spin period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBody` if `period` is not positive and finite.
    pub fn set_rotation_period(&mut self, period: f64) -> SimResult<()> {
        self.rotation_period = check_positive("rotation_period", period)?;
        Ok(())
    }

    /// Overwrite the spin angle (wrapped into `[0, 360)`).
    pub fn set_rotation_angle(&mut self, degrees: f64) {
        self.rotation_angle = wrap_degrees(degrees);
    }

    /// Advance the spin angle by `delta` degrees.
    pub fn increment_rotation(&mut self, delta: f64) {
        self.rotation_angle = wrap_degrees(self.rotation_angle + delta);
    }

    /// Spin angle increment for one tick, using the *current* period.
    #[must_use]
    pub fn spin_increment(&self, scaled_dt: f64) -> f64 {
        scaled_dt * 360.0 / self.rotation_period
    }

    /// Momentum `m·v`.
    #[must_use]
    pub fn momentum(&self) -> Vec3 {
        self.velocity * self.mass
    }
}

fn check_positive(field: &str, value: f64) -> SimResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::invalid_body(field, value))
    }
}

/// Wrap an angle in degrees into `[0, 360)`.
#[must_use]
pub fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
