//! Pre-built orbital scenarios.
//!
//! Canonical classroom setups, each expressed as a complete [`SimConfig`]:
//! - Earth–Moon with the Earth pinned (one-body reduction)
//! - Equal-mass binary about a common centre of mass
//! - Lunar mass ratio in `G = 1` units, the Kepler's-third-law check
//! - Tidal-locking animation with stepped locking and bulge realignment
//! - Eccentric test orbit for the polar kernel
//!
//! # References
//!
//! [6] Bate, Mueller, White, "Fundamentals of Astrodynamics," 1971.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::config::{BodyConfig, SimConfig, UnitsConfig};
use crate::orbit::integrator::KernelChoice;
use crate::orbit::state::Reduction;
use crate::orbit::units::{LengthUnit, MassUnit, TimeUnit, UnitSystem};
use crate::spin::SpinMode;

/// Lunar to terrestrial mass ratio.
pub const LUNAR_MASS_RATIO: f64 = 0.0123;

/// Keplerian orbit description in the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeplerOrbit {
    /// Body A mass.
    pub central_mass: f64,
    /// Body B mass.
    pub orbiter_mass: f64,
    /// Semi-major axis of the relative orbit.
    pub semi_major_axis: f64,
    /// Eccentricity (0-1 for ellipses).
    pub eccentricity: f64,
    /// Initial true anomaly (radians).
    pub initial_anomaly: f64,
}

impl KeplerOrbit {
    /// Create circular orbit.
    #[must_use]
    pub const fn circular(central_mass: f64, orbiter_mass: f64, radius: f64) -> Self {
        Self {
            central_mass,
            orbiter_mass,
            semi_major_axis: radius,
            eccentricity: 0.0,
            initial_anomaly: 0.0,
        }
    }

    /// Calculate orbital period.
    #[must_use]
    pub fn period(&self, newton_g: f64, reduction: Reduction) -> f64 {
        let (_, field_mass) = reduction.masses(self.central_mass, self.orbiter_mass);
        TAU * (self.semi_major_axis.powi(3) / (newton_g * field_mass)).sqrt()
    }

    /// Relative position and velocity at the initial anomaly.
    ///
    /// Angles run from +X toward +Z, so the orbit normal is −Y.
    #[must_use]
    #[allow(clippy::many_single_char_names)] // Standard orbital mechanics notation
    pub fn relative_state(&self, newton_g: f64, reduction: Reduction) -> ([f64; 3], [f64; 3]) {
        let (_, field_mass) = reduction.masses(self.central_mass, self.orbiter_mass);
        let mu = newton_g * field_mass;
        let e = self.eccentricity;
        let nu = self.initial_anomaly;

        // p = semi-latus rectum, h = specific angular momentum
        let semi_latus = self.semi_major_axis * (1.0 - e * e);
        let radius = semi_latus / (1.0 + e * nu.cos());
        let h = (mu * semi_latus).sqrt();

        let position = [radius * nu.cos(), 0.0, radius * nu.sin()];
        let velocity = [-mu / h * nu.sin(), 0.0, mu / h * (e + nu.cos())];
        (position, velocity)
    }

    /// Place both bodies so the relative state matches this orbit.
    ///
    /// Centre-of-mass reduction keeps the barycentre at the origin and at
    /// rest; fixed-primary reduction pins body A at the origin.
    #[must_use]
    pub fn bodies(&self, newton_g: f64, reduction: Reduction, radii: (f64, f64)) -> (BodyConfig, BodyConfig) {
        let (r, v) = self.relative_state(newton_g, reduction);
        let (share_a, share_b) = match reduction {
            Reduction::CentreOfMass => {
                let total = self.central_mass + self.orbiter_mass;
                (self.orbiter_mass / total, self.central_mass / total)
            }
            Reduction::FixedPrimary => (0.0, 1.0),
        };
        let scale = |x: [f64; 3], k: f64| [x[0] * k, x[1] * k, x[2] * k];

        let primary = BodyConfig::at(scale(r, -share_a), self.central_mass, radii.0).moving(scale(v, -share_a));
        let secondary = BodyConfig::at(scale(r, share_b), self.orbiter_mass, radii.1).moving(scale(v, share_b));
        (primary, secondary)
    }
}

/// Named scenario presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Earth–Moon, Earth pinned, continuous locking.
    EarthMoon,
    /// Two unit masses circling their barycentre.
    EqualMassBinary,
    /// `G = 1`, mass ratio 0.0123, separation 60, circular.
    LunarRatio,
    /// Stepped locking with bulge realignment every 45° of orbit.
    TidalLockingAnimation,
    /// `G = 1`, e = 0.5, polar kernel.
    Eccentric,
}

impl Scenario {
    /// Every preset.
    pub const ALL: [Self; 5] = [
        Self::EarthMoon,
        Self::EqualMassBinary,
        Self::LunarRatio,
        Self::TidalLockingAnimation,
        Self::Eccentric,
    ];

    /// Kebab-case name, as accepted by [`Scenario::from_name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EarthMoon => "earth-moon",
            Self::EqualMassBinary => "equal-mass-binary",
            Self::LunarRatio => "lunar-ratio",
            Self::TidalLockingAnimation => "tidal-locking-animation",
            Self::Eccentric => "eccentric",
        }
    }

    /// Look a preset up by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Full configuration for this preset.
    #[must_use]
    pub fn config(self) -> SimConfig {
        let mut config = match self {
            Self::EarthMoon => SimConfig::default(),
            Self::EqualMassBinary => equal_mass_binary(),
            Self::LunarRatio => lunar_ratio(),
            Self::TidalLockingAnimation => tidal_locking_animation(),
            Self::Eccentric => eccentric(),
        };
        config.name = self.name().to_string();
        config
    }
}

fn equal_mass_binary() -> SimConfig {
    let orbit = KeplerOrbit::circular(1.0, 1.0, 2.0);
    let (primary, secondary) = orbit.bodies(1.0, Reduction::CentreOfMass, (0.1, 0.1));
    SimConfig::builder()
        .units(UnitsConfig::natural(1.0))
        .reduction(Reduction::CentreOfMass)
        .primary(primary)
        .secondary(secondary)
        .kernel(KernelChoice::Cartesian)
        .spin_mode(SpinMode::Free)
        .build()
}

fn lunar_ratio() -> SimConfig {
    let orbit = KeplerOrbit::circular(1.0, LUNAR_MASS_RATIO, 60.0);
    let (primary, secondary) = orbit.bodies(1.0, Reduction::CentreOfMass, (1.0, 0.27));
    let mut config = SimConfig::builder()
        .units(UnitsConfig::natural(1.0))
        .reduction(Reduction::CentreOfMass)
        .primary(primary)
        .secondary(secondary.spinning(orbit.period(1.0, Reduction::CentreOfMass) / 10.0))
        .kernel(KernelChoice::Cartesian)
        .spin_mode(SpinMode::Free)
        .build();
    config.integrator.num_substeps = 200;
    config
}

fn tidal_locking_animation() -> SimConfig {
    const RADIUS_SCALE: f64 = 10.0;

    let units_config = UnitsConfig {
        time: TimeUnit::Day,
        length: LengthUnit::EarthMoonDistance,
        mass: MassUnit::EarthMass,
        newton_g: None,
    };
    let units = UnitSystem::new(units_config.time, units_config.length, units_config.mass);

    let orbit = KeplerOrbit::circular(units.earth_mass(), units.lunar_mass(), units.lunar_distance());
    let g = units.newton_g();
    let (primary, secondary) = orbit.bodies(
        g,
        Reduction::FixedPrimary,
        (units.earth_radius() * RADIUS_SCALE, units.lunar_radius() * RADIUS_SCALE),
    );
    let period = orbit.period(g, Reduction::FixedPrimary);

    let mut config = SimConfig::builder()
        .units(units_config)
        .reduction(Reduction::FixedPrimary)
        .primary(primary.spinning(units.earth_rotation_period()))
        .secondary(secondary.spinning(period / 4.0))
        .spin_mode(SpinMode::Discrete)
        .time_scale(5.0)
        .build();
    config.spin.max_step_angle = 45.0;
    config
}

fn eccentric() -> SimConfig {
    let orbit = KeplerOrbit {
        central_mass: 1.0,
        orbiter_mass: 1e-3,
        semi_major_axis: 10.0,
        eccentricity: 0.5,
        initial_anomaly: 1.0,
    };
    let (primary, secondary) = orbit.bodies(1.0, Reduction::FixedPrimary, (1.0, 0.2));
    SimConfig::builder()
        .units(UnitsConfig::natural(1.0))
        .reduction(Reduction::FixedPrimary)
        .primary(primary)
        .secondary(secondary.spinning(5.0))
        .kernel(KernelChoice::Polar)
        .build()
}
