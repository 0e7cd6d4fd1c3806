//! Differential (tidal) gravity on a body's surface.
//!
//! The quantity drawn is `F(point) − F(centre)`, the pull at a surface point
//! minus the pull on the body's centre of mass. The raw force would point
//! toward the primary everywhere; subtracting the centre term leaves the
//! two-lobed stretching pattern.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::error::{require_positive, SimResult};
use crate::orbit::vector::Vec3;

/// Scale applied to the force differential so it is visible next to the body.
pub const DEFAULT_VECTOR_SCALE: f64 = 500.0;

/// One surface point and the tidal force there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TidalSample {
    /// World-space surface point.
    pub point: Vec3,
    /// Scaled force differential at `point`.
    pub force: Vec3,
}

/// Evaluates tidal force differentials for a secondary in a primary's field.
#[derive(Debug, Clone)]
pub struct TidalFieldSampler {
    newton_g: f64,
    primary_mass: f64,
    secondary_mass: f64,
    vector_scale: f64,
    min_separation: f64,
}

impl TidalFieldSampler {
    /// Create a sampler.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `G`, either mass or the scale is not
    /// positive and finite.
    pub fn new(newton_g: f64, primary_mass: f64, secondary_mass: f64, vector_scale: f64) -> SimResult<Self> {
        Ok(Self {
            newton_g: require_positive("newton_g", newton_g)?,
            primary_mass: require_positive("primary_mass", primary_mass)?,
            secondary_mass: require_positive("secondary_mass", secondary_mass)?,
            vector_scale: require_positive("vector_scale", vector_scale)?,
            min_separation: crate::orbit::state::DEFAULT_MIN_SEPARATION,
        })
    }

    /// Replace the separation floor used for `1/|r|²`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `min_separation` is not positive.
    pub fn with_min_separation(mut self, min_separation: f64) -> SimResult<Self> {
        self.min_separation = require_positive("min_separation", min_separation)?;
        Ok(self)
    }

    /// Gravitational force of the primary on the secondary's mass placed at `point`.
    #[must_use]
    pub fn force_at(&self, primary_position: Vec3, point: Vec3) -> Vec3 {
        let r = point - primary_position;
        let raw = r.magnitude();
        if raw < f64::EPSILON {
            return Vec3::zero();
        }
        let dist = raw.max(self.min_separation);
        let magnitude = -self.newton_g * self.primary_mass * self.secondary_mass / (dist * dist);
        r * (magnitude / raw)
    }

    /// Scaled differential `F(point) − centre_force`.
    #[must_use]
    pub fn sample(&self, primary_position: Vec3, point: Vec3, centre_force: Vec3) -> TidalSample {
        TidalSample {
            point,
            force: (self.force_at(primary_position, point) - centre_force) * self.vector_scale,
        }
    }

    /// Samples around the secondary's outline, an ellipse with semi-axes
    /// `radius_x` (along the bulge) and `radius_z`, turned by `spin_degrees`.
    ///
    /// `n` points run from 0 to 2π inclusive, so the first and last coincide.
    #[must_use]
    pub fn sample_ring(
        &self,
        primary_position: Vec3,
        centre: Vec3,
        radius_x: f64,
        radius_z: f64,
        spin_degrees: f64,
        n: usize,
    ) -> Vec<TidalSample> {
        let centre_force = self.force_at(primary_position, centre);
        let step = if n > 1 { TAU / (n - 1) as f64 } else { 0.0 };
        (0..n)
            .map(|i| {
                let phi = step * i as f64;
                let radius = ellipse_radius(radius_x, radius_z, phi);
                let point = surface_point(centre, phi, radius, spin_degrees);
                self.sample(primary_position, point, centre_force)
            })
            .collect()
    }

    /// Visual scale factor.
    #[must_use]
    pub const fn vector_scale(&self) -> f64 {
        self.vector_scale
    }
}

/// Polar radius of an axis-aligned ellipse at angle `phi`.
#[must_use]
pub fn ellipse_radius(radius_x: f64, radius_z: f64, phi: f64) -> f64 {
    let (sin, cos) = phi.sin_cos();
    let denom = (radius_x * radius_x * sin * sin + radius_z * radius_z * cos * cos).sqrt();
    if denom < f64::EPSILON {
        0.0
    } else {
        radius_x * radius_z / denom
    }
}

/// Point at angle `phi` and distance `radius` from `centre` in the body's
/// XZ plane, turned by the body's spin.
#[must_use]
pub fn surface_point(centre: Vec3, phi: f64, radius: f64, spin_degrees: f64) -> Vec3 {
    let local = Vec3::new(radius * phi.cos(), 0.0, radius * phi.sin());
    centre + local.rotate_about_y(spin_degrees.to_radians())
}
