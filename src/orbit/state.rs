//! Reduced two-body state and its conserved quantities.
//!
//! The pair of bodies is reduced to the relative vector `r = B − A` and
//! its derivative `v`. Energy, angular momentum and the orbit shape are
//! evaluated once at [`TwoBodyState::reset`] and then treated as fixed
//! integration parameters: only the instantaneous phase advances.
//!
//! # Governing Equations
//!
//! ```text
//! E  = ½·μ·|v|² − G·μ·M/|r|
//! L  = μ·(r × v)
//! a  = −G·μ·M / (2E)                       (E < 0)
//! e  = sqrt(1 + 2E·|L|² / (μ·(G·μ·M)²))
//! T  = 2π·sqrt(a³ / (G·M))                 (∞ when E ≥ 0)
//! r(θ) = a(1 − e²) / (1 + e·cos θ)
//! ```
//!
//! The fixed shape is exact only because nothing perturbs the pair; any
//! back-reaction of the tides on the orbit would invalidate `a` and `e`
//! and is not modelled.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::{debug, warn};

use crate::error::{require_positive, SimError, SimResult};
use crate::orbit::body::Body;
use crate::orbit::vector::Vec3;

/// Default floor on `|r|` used wherever `1/|r|` or `1/|r|²` is evaluated.
pub const DEFAULT_MIN_SEPARATION: f64 = 1e-9;

/// Angular momentum magnitudes below this are treated as radial motion.
const PLANAR_EPSILON: f64 = 1e-12;

/// Eccentricities below this are treated as circular when locating `θ₀`.
const CIRCULAR_EPSILON: f64 = 1e-9;

/// How the two bodies are reduced to one relative coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reduction {
    /// Both bodies orbit their common centre of mass, which drifts
    /// uniformly with the initial momentum.
    #[default]
    CentreOfMass,
    /// Body A is pinned at its initial position and B moves as a test
    /// particle in A's field (the one-body classroom setup).
    FixedPrimary,
}

impl Reduction {
    /// Reduced mass `μ` and field mass `M` for the pair.
    #[must_use]
    pub fn masses(self, mass_a: f64, mass_b: f64) -> (f64, f64) {
        let total = mass_a + mass_b;
        match self {
            Self::CentreOfMass => (mass_a * mass_b / total, total),
            Self::FixedPrimary => (mass_b, mass_a),
        }
    }
}

/// Initial conditions captured at reset, used for drift-cancelling snaps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    /// Position of body A.
    pub position_a: Vec3,
    /// Velocity of body A.
    pub velocity_a: Vec3,
    /// Position of body B.
    pub position_b: Vec3,
    /// Velocity of body B.
    pub velocity_b: Vec3,
}

/// Right-handed frame of the orbital plane.
///
/// `z_hat` is along the angular momentum, `x_hat` points at periapsis
/// (for circular orbits: at the initial separation), `y_hat = z × x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalFrame {
    /// Periapsis direction.
    pub x_hat: Vec3,
    /// In-plane direction 90° ahead of periapsis.
    pub y_hat: Vec3,
    /// Orbit normal.
    pub z_hat: Vec3,
}

/// Relative-motion state of a gravitating pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoBodyState {
    reduction: Reduction,
    newton_g: f64,
    mass_a: f64,
    mass_b: f64,
    total_mass: f64,
    reduced_mass: f64,
    /// Mass `M` that sources the field in `G·M`.
    gravitating_mass: f64,
    min_separation: f64,

    initial: InitialConditions,
    centre_of_mass: Vec3,
    centre_of_mass_velocity: Vec3,

    // Conserved quantities, fixed at reset.
    energy: f64,
    angular_momentum: Vec3,
    angular_momentum_magnitude: f64,
    semi_major_axis: f64,
    eccentricity: f64,
    period: f64,
    initial_theta: f64,
    frame: Option<OrbitalFrame>,

    // Instantaneous phase.
    pub(crate) r: Vec3,
    pub(crate) v: Vec3,
    pub(crate) theta: f64,
    pub(crate) elapsed: f64,
}

impl TwoBodyState {
    /// Build the reduced state from two bodies.
    ///
    /// # Errors
    ///
    /// Returns an error if `newton_g` is not positive and finite.
    pub fn from_bodies(a: &Body, b: &Body, newton_g: f64, reduction: Reduction) -> SimResult<Self> {
        Self::reset(
            a.position, a.velocity, a.mass(), b.position, b.velocity, b.mass(), newton_g, reduction,
        )
    }

    /// Compute and store every derived quantity from initial conditions.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBody` for non-positive masses and `InvalidParameter`
    /// for a non-positive `newton_g`.
    #[allow(clippy::too_many_arguments)] // Mirrors the physical inputs one to one
    pub fn reset(
        position_a: Vec3,
        velocity_a: Vec3,
        mass_a: f64,
        position_b: Vec3,
        velocity_b: Vec3,
        mass_b: f64,
        newton_g: f64,
        reduction: Reduction,
    ) -> SimResult<Self> {
        for (field, value) in [("mass", mass_a), ("mass", mass_b)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::invalid_body(field, value));
            }
        }
        require_positive("newton_g", newton_g)?;
        let all_finite = [position_a, velocity_a, position_b, velocity_b]
            .iter()
            .all(Vec3::is_finite);
        if !all_finite {
            return Err(SimError::NonFiniteValue {
                location: "initial conditions".to_string(),
            });
        }

        let total_mass = mass_a + mass_b;
        let (reduced_mass, gravitating_mass) = reduction.masses(mass_a, mass_b);

        let mut state = Self {
            reduction,
            newton_g,
            mass_a,
            mass_b,
            total_mass,
            reduced_mass,
            gravitating_mass,
            min_separation: DEFAULT_MIN_SEPARATION,
            initial: InitialConditions {
                position_a,
                velocity_a,
                position_b,
                velocity_b,
            },
            centre_of_mass: (position_a * mass_a + position_b * mass_b) * (1.0 / total_mass),
            centre_of_mass_velocity: (velocity_a * mass_a + velocity_b * mass_b) * (1.0 / total_mass),
            energy: 0.0,
            angular_momentum: Vec3::zero(),
            angular_momentum_magnitude: 0.0,
            semi_major_axis: f64::INFINITY,
            eccentricity: 0.0,
            period: f64::INFINITY,
            initial_theta: 0.0,
            frame: None,
            r: position_b - position_a,
            v: velocity_b - velocity_a,
            theta: 0.0,
            elapsed: 0.0,
        };
        state.derive_conserved_quantities();
        Ok(state)
    }

    /// Replace the separation floor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `min_separation` is not positive and finite.
    pub fn with_min_separation(mut self, min_separation: f64) -> SimResult<Self> {
        self.min_separation = require_positive("min_separation", min_separation)?;
        Ok(self)
    }

    fn derive_conserved_quantities(&mut self) {
        let r_raw = self.r.magnitude();
        if r_raw < self.min_separation {
            warn!(separation = r_raw, floor = self.min_separation, "initial separation clamped");
        }
        let r_mag = r_raw.max(self.min_separation);
        let mu = self.reduced_mass;
        let k = self.newton_g * mu * self.gravitating_mass; // G·μ·M

        self.energy = 0.5 * mu * self.v.magnitude_squared() - k / r_mag;
        self.angular_momentum = self.r.cross(&self.v) * mu;
        self.angular_momentum_magnitude = self.angular_momentum.magnitude();
        let l = self.angular_momentum_magnitude;

        self.semi_major_axis = -0.5 * k / self.energy;
        // Floating-point noise can push a circular orbit's radicand below zero.
        let radicand = 1.0 + 2.0 * self.energy * l * l / (mu * k * k);
        self.eccentricity = radicand.max(0.0).sqrt();

        if self.energy >= 0.0 {
            self.period = f64::INFINITY;
            self.initial_theta = 0.0;
            self.frame = None;
            debug!(energy = self.energy, "unbound orbit, periodic resync disabled");
        } else {
            let a = self.semi_major_axis;
            self.period = TAU * (a.powi(3) / (self.newton_g * self.gravitating_mass)).sqrt();
            self.initial_theta = self.locate_initial_theta(r_mag);
            self.frame = self.build_frame(r_mag);
            debug!(
                period = self.period,
                semi_major_axis = a,
                eccentricity = self.eccentricity,
                "bound orbit reset"
            );
        }
        self.theta = self.initial_theta;
    }

    /// Invert the orbit equation for the starting true anomaly.
    ///
    /// `e·cos θ = h²/(GM·r) − 1` and `e·sin θ = h·(r·v)/(GM·r)`. The cosine
    /// is clamped to [−1, 1] since rounding overshoots it at an apsis;
    /// taking `atan2` with the sine keeps full precision there, where
    /// `acos` alone loses half the digits.
    fn locate_initial_theta(&self, r_mag: f64) -> f64 {
        let e = self.eccentricity;
        if e < CIRCULAR_EPSILON {
            return 0.0;
        }
        let gm = self.gravitational_parameter();
        let h = self.angular_momentum_magnitude / self.reduced_mass;
        let cos_theta = ((h * h / (gm * r_mag) - 1.0) / e).clamp(-1.0, 1.0);
        // Negative when approaching periapsis.
        let sin_theta = h * self.r.dot(&self.v) / (gm * r_mag * e);
        sin_theta.atan2(cos_theta)
    }

    fn build_frame(&self, r_mag: f64) -> Option<OrbitalFrame> {
        if self.angular_momentum_magnitude < PLANAR_EPSILON {
            return None;
        }
        let z_hat = self.angular_momentum.normalize();
        let r_hat = self.r * (1.0 / r_mag);
        let t_hat = z_hat.cross(&r_hat);
        let (sin_t, cos_t) = self.initial_theta.sin_cos();
        let x_hat = r_hat * cos_t - t_hat * sin_t;
        let y_hat = z_hat.cross(&x_hat);
        Some(OrbitalFrame { x_hat, y_hat, z_hat })
    }

    /// Snap the relative state back to its exact initial values.
    pub fn snap_to_initial(&mut self) {
        self.r = self.initial.position_b - self.initial.position_a;
        self.v = self.initial.velocity_b - self.initial.velocity_a;
        self.theta = self.initial_theta;
    }

    /// `G·M` of the field the relative coordinate moves in.
    #[must_use]
    pub fn gravitational_parameter(&self) -> f64 {
        self.newton_g * self.gravitating_mass
    }

    /// Acceleration of `r` at an arbitrary relative position, with the separation floor applied.
    #[must_use]
    pub fn acceleration_at(&self, r: Vec3) -> Vec3 {
        let raw = r.magnitude();
        if raw < f64::EPSILON {
            // Coincident bodies have no direction to pull along.
            return Vec3::zero();
        }
        let r_mag = raw.max(self.min_separation);
        r * (-self.gravitational_parameter() / (r_mag * r_mag * raw))
    }

    /// Orbit radius at true anomaly `theta` from the fixed shape.
    #[must_use]
    pub fn radius_at(&self, theta: f64) -> f64 {
        let e = self.eccentricity;
        self.semi_major_axis * (1.0 - e * e) / (1.0 + e * theta.cos())
    }

    /// Relative position and velocity on the analytic orbit at `theta`.
    ///
    /// Returns `None` for unbound or radial orbits.
    #[must_use]
    pub fn analytic_point(&self, theta: f64) -> Option<(Vec3, Vec3)> {
        let frame = self.frame?;
        if !self.is_bound() {
            return None;
        }
        let (sin_t, cos_t) = theta.sin_cos();
        let radius = self.radius_at(theta);
        let position = (frame.x_hat * cos_t + frame.y_hat * sin_t) * radius;
        let h = self.angular_momentum_magnitude / self.reduced_mass;
        let speed = self.gravitational_parameter() / h;
        let velocity = (frame.x_hat * (-sin_t) + frame.y_hat * (self.eccentricity + cos_t)) * speed;
        Some((position, velocity))
    }

    /// `n` relative positions evenly spaced in true anomaly, for drawing the orbit.
    #[must_use]
    pub fn orbit_path(&self, n: usize) -> Vec<Vec3> {
        if n == 0 {
            return Vec::new();
        }
        (0..n)
            .filter_map(|i| {
                let theta = TAU * i as f64 / n as f64;
                self.analytic_point(theta).map(|(p, _)| p)
            })
            .collect()
    }

    /// Energy of an arbitrary relative state using this pair's masses.
    #[must_use]
    pub fn energy_of(&self, r: Vec3, v: Vec3) -> f64 {
        let r_mag = r.magnitude().max(self.min_separation);
        0.5 * self.reduced_mass * v.magnitude_squared()
            - self.newton_g * self.reduced_mass * self.gravitating_mass / r_mag
    }

    /// Energy of the current relative state.
    #[must_use]
    pub fn current_energy(&self) -> f64 {
        self.energy_of(self.r, self.v)
    }

    /// Angular momentum of the current relative state.
    #[must_use]
    pub fn current_angular_momentum(&self) -> Vec3 {
        self.r.cross(&self.v) * self.reduced_mass
    }

    /// Relative energy error against the value fixed at reset.
    #[must_use]
    pub fn energy_drift(&self) -> f64 {
        let current = self.current_energy();
        if self.energy.abs() > f64::EPSILON {
            (current - self.energy).abs() / self.energy.abs()
        } else {
            (current - self.energy).abs()
        }
    }

    /// Centre-of-mass position `elapsed` time units after reset.
    #[must_use]
    pub fn centre_of_mass_at(&self, elapsed: f64) -> Vec3 {
        self.centre_of_mass + self.centre_of_mass_velocity * elapsed
    }

    /// Current world-space positions of bodies A and B.
    #[must_use]
    pub fn body_positions(&self) -> (Vec3, Vec3) {
        match self.reduction {
            Reduction::CentreOfMass => {
                let cm = self.centre_of_mass_at(self.elapsed);
                let a = cm - self.r * (self.mass_b / self.total_mass);
                let b = cm + self.r * (self.mass_a / self.total_mass);
                (a, b)
            }
            Reduction::FixedPrimary => {
                let a = self.initial.position_a;
                (a, a + self.r)
            }
        }
    }

    /// Current world-space velocities of bodies A and B.
    #[must_use]
    pub fn body_velocities(&self) -> (Vec3, Vec3) {
        match self.reduction {
            Reduction::CentreOfMass => {
                let vcm = self.centre_of_mass_velocity;
                let a = vcm - self.v * (self.mass_b / self.total_mass);
                let b = vcm + self.v * (self.mass_a / self.total_mass);
                (a, b)
            }
            Reduction::FixedPrimary => (Vec3::zero(), self.v),
        }
    }

    /// Whether the orbit is bound (`E < 0`).
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.energy < 0.0
    }

    /// Whether the polar kernel can represent this orbit.
    #[must_use]
    pub fn supports_polar(&self) -> bool {
        self.is_bound() && self.frame.is_some()
    }

    /// Reduction model.
    #[must_use]
    pub const fn reduction(&self) -> Reduction {
        self.reduction
    }
    /// Newton's constant this state was built with.
    #[must_use]
    pub const fn newton_g(&self) -> f64 {
        self.newton_g
    }
    /// Mass of body A.
    #[must_use]
    pub const fn mass_a(&self) -> f64 {
        self.mass_a
    }
    /// Mass of body B.
    #[must_use]
    pub const fn mass_b(&self) -> f64 {
        self.mass_b
    }
    /// `m_A + m_B`.
    #[must_use]
    pub const fn total_mass(&self) -> f64 {
        self.total_mass
    }
    /// Reduced mass μ of the model.
    #[must_use]
    pub const fn reduced_mass(&self) -> f64 {
        self.reduced_mass
    }
    /// Separation floor.
    #[must_use]
    pub const fn min_separation(&self) -> f64 {
        self.min_separation
    }
    /// Energy fixed at reset.
    #[must_use]
    pub const fn energy(&self) -> f64 {
        self.energy
    }
    /// Angular momentum vector fixed at reset.
    #[must_use]
    pub const fn angular_momentum(&self) -> Vec3 {
        self.angular_momentum
    }
    /// Semi-major axis (negative for hyperbolic orbits).
    #[must_use]
    pub const fn semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }
    /// Eccentricity.
    #[must_use]
    pub const fn eccentricity(&self) -> f64 {
        self.eccentricity
    }
    /// Orbital period (`+∞` when unbound).
    #[must_use]
    pub const fn period(&self) -> f64 {
        self.period
    }
    /// True anomaly at reset.
    #[must_use]
    pub const fn initial_theta(&self) -> f64 {
        self.initial_theta
    }
    /// Current true anomaly (meaningful for the polar kernel).
    #[must_use]
    pub const fn theta(&self) -> f64 {
        self.theta
    }
    /// Orbital plane frame, if the orbit has one.
    #[must_use]
    pub const fn frame(&self) -> Option<OrbitalFrame> {
        self.frame
    }
    /// Captured initial conditions.
    #[must_use]
    pub const fn initial(&self) -> &InitialConditions {
        &self.initial
    }
    /// Current relative position `r = B − A`.
    #[must_use]
    pub const fn relative_position(&self) -> Vec3 {
        self.r
    }
    /// Current relative velocity.
    #[must_use]
    pub const fn relative_velocity(&self) -> Vec3 {
        self.v
    }
    /// Time integrated since reset.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    /// Equal masses at (∓1, 0, 0) moving (0, ±v, 0) in opposite senses.
    fn symmetric_pair(speed: f64) -> TwoBodyState {
        TwoBodyState::reset(
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, speed, 0.0),
            1.0,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, -speed, 0.0),
            1.0,
            1.0,
            Reduction::CentreOfMass,
        )
        .expect("valid state")
    }

    fn circular_test_particle(distance: f64, gm: f64) -> TwoBodyState {
        let speed = (gm / distance).sqrt();
        TwoBodyState::reset(
            Vec3::zero(),
            Vec3::zero(),
            gm,
            Vec3::new(distance, 0.0, 0.0),
            Vec3::new(0.0, 0.0, speed),
            1e-6,
            1.0,
            Reduction::FixedPrimary,
        )
        .expect("valid state")
    }

    #[test]
    fn test_reduced_and_total_mass() {
        let state = symmetric_pair(0.5);
        assert!((state.total_mass() - 2.0).abs() < EPSILON);
        assert!((state.reduced_mass() - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_energy_formula() {
        let state = symmetric_pair(0.5);
        // μ = 0.5, |v| = 1, |r| = 2, M = 2: E = 0.25 − 0.5
        assert!((state.energy() + 0.25).abs() < EPSILON);
        assert!(state.is_bound());
    }

    #[test]
    fn test_circular_orbit_shape() {
        let state = circular_test_particle(60.0, 1.0);
        assert!(state.eccentricity() < 1e-6, "e = {}", state.eccentricity());
        assert!((state.semi_major_axis() - 60.0).abs() < 1e-6);
        let expected = TAU * (60.0f64.powi(3)).sqrt();
        assert!((state.period() - expected).abs() / expected < 1e-9);
    }

    #[test]
    fn test_initial_theta_is_finite_at_apsides() {
        // Start at apoapsis of an ellipse: speed below circular.
        let gm = 1.0;
        let speed = 0.8 * (gm / 1.0f64).sqrt();
        let state = TwoBodyState::reset(
            Vec3::zero(),
            Vec3::zero(),
            gm,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, speed),
            1e-9,
            1.0,
            Reduction::FixedPrimary,
        )
        .expect("valid state");

        assert!(state.initial_theta().is_finite());
        assert!((state.initial_theta().abs() - std::f64::consts::PI).abs() < 1e-6);
        assert!((state.radius_at(state.initial_theta()) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_periapsis_start_has_zero_anomaly_in_any_direction() {
        for angle in [0.0, 0.4, 1.3, 2.0] {
            let rot = |v: Vec3| v.rotate_about_y(angle);
            let state = TwoBodyState::reset(
                Vec3::zero(),
                Vec3::zero(),
                1.0,
                rot(Vec3::new(5.0, 0.0, 0.0)),
                rot(Vec3::new(0.0, 0.0, 0.55)),
                1e-3,
                1.0,
                Reduction::FixedPrimary,
            )
            .expect("valid state");
            assert!(state.eccentricity() > 0.4);
            assert!(state.initial_theta().abs() < 1e-12, "angle {angle}: theta0 = {}", state.initial_theta());
        }
    }

    #[test]
    fn test_analytic_point_reproduces_initial_state() {
        let state = TwoBodyState::reset(
            Vec3::zero(),
            Vec3::zero(),
            1.0,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.3, 0.0, 1.1),
            1e-9,
            1.0,
            Reduction::FixedPrimary,
        )
        .expect("valid state");

        let (p, v) = state.analytic_point(state.initial_theta()).expect("bound");
        assert!((p - state.relative_position()).magnitude() < 1e-9);
        assert!((v - state.relative_velocity()).magnitude() < 1e-9);
    }

    #[test]
    fn test_unbound_orbit_has_infinite_period() {
        let escape = (2.0f64).sqrt();
        let state = TwoBodyState::reset(
            Vec3::zero(),
            Vec3::zero(),
            1.0,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, escape * 1.5),
            1e-9,
            1.0,
            Reduction::FixedPrimary,
        )
        .expect("valid state");

        assert!(!state.is_bound());
        assert!(state.period().is_infinite());
        assert!(state.eccentricity() > 1.0);
        assert!(!state.supports_polar());
    }

    #[test]
    fn test_radial_orbit_has_no_frame() {
        let state = TwoBodyState::reset(
            Vec3::zero(),
            Vec3::zero(),
            1.0,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::zero(),
            1.0,
            1.0,
            Reduction::CentreOfMass,
        )
        .expect("valid state");

        assert!(state.is_bound());
        assert!(state.frame().is_none());
        assert!(!state.supports_polar());
        assert!(state.eccentricity().is_finite());
    }

    #[test]
    fn test_rejects_bad_masses_and_g() {
        let reset = |ma: f64, mb: f64, g: f64| {
            TwoBodyState::reset(
                Vec3::zero(),
                Vec3::zero(),
                ma,
                Vec3::X,
                Vec3::Z,
                mb,
                g,
                Reduction::CentreOfMass,
            )
        };
        assert!(matches!(reset(0.0, 1.0, 1.0), Err(SimError::InvalidBody { .. })));
        assert!(matches!(reset(1.0, -1.0, 1.0), Err(SimError::InvalidBody { .. })));
        assert!(matches!(reset(1.0, 1.0, 0.0), Err(SimError::InvalidParameter { .. })));
    }

    #[test]
    fn test_coincident_bodies_do_not_produce_nan() {
        let state = TwoBodyState::reset(
            Vec3::zero(),
            Vec3::zero(),
            1.0,
            Vec3::zero(),
            Vec3::Z,
            1.0,
            1.0,
            Reduction::CentreOfMass,
        )
        .expect("valid state");

        assert!(state.energy().is_finite());
        assert!(state.acceleration_at(Vec3::zero()).is_finite());
        assert!(state.current_energy().is_finite());
    }

    #[test]
    fn test_centre_of_mass_split() {
        let state = TwoBodyState::reset(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            3.0,
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            1.0,
            1.0,
            Reduction::CentreOfMass,
        )
        .expect("valid state");

        let (a, b) = state.body_positions();
        assert!((a - Vec3::zero()).magnitude() < EPSILON);
        assert!((b - Vec3::new(4.0, 0.0, 0.0)).magnitude() < EPSILON);
        let cm = state.centre_of_mass_at(2.0);
        assert!((cm - Vec3::new(3.0, 0.5, 0.0)).magnitude() < EPSILON);
    }

    #[test]
    fn test_orbit_path_lies_on_ellipse() {
        let state = circular_test_particle(10.0, 1.0);
        let path = state.orbit_path(16);
        assert_eq!(path.len(), 16);
        for p in path {
            assert!((p.magnitude() - 10.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_frame_is_right_handed() {
        let state = circular_test_particle(5.0, 2.0);
        let frame = state.frame().expect("planar orbit");
        let z = frame.x_hat.cross(&frame.y_hat);
        assert!((z - frame.z_hat).magnitude() < EPSILON);
    }
}
