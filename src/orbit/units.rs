//! Unit systems and the gravitational constant expressed in them.
//!
//! A simulation picks one time, length and mass unit at construction and
//! keeps it for its whole life. Newton's constant is derived once from
//! that choice and cached in the [`UnitSystem`]; nothing downstream ever
//! recomputes it, and there is deliberately no setter to change units
//! mid-run.
//!
//! Conversions to and from SI go through `uom` quantities so the base
//! factors (seconds per day, and so on) come from one audited table.

use serde::{Deserialize, Serialize};
use uom::si::f64::{Length, Mass, Time};
use uom::si::length::meter;
use uom::si::mass::kilogram;
use uom::si::time::{day, hour, second};

/// Gravitational constant (m³ kg⁻¹ s⁻²).
pub const G_SI: f64 = 6.674_30e-11;

/// Earth mass in kilograms.
pub const EARTH_MASS_KG: f64 = 5.972_2e24;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6.371e6;

/// Lunar mass in kilograms.
pub const LUNAR_MASS_KG: f64 = 7.342e22;

/// Mean lunar radius in meters.
pub const LUNAR_RADIUS_M: f64 = 1.737_4e6;

/// Mean Earth–Moon distance in meters.
pub const LUNAR_DISTANCE_M: f64 = 3.844e8;

/// Sidereal rotation period of the Earth in seconds.
pub const EARTH_ROTATION_PERIOD_S: f64 = 86_164.090_5;

/// Time unit choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeUnit {
    /// SI second.
    Second,
    /// Hour.
    Hour,
    /// Day of 86 400 s.
    #[default]
    Day,
}

impl TimeUnit {
    /// Duration of one unit.
    #[must_use]
    pub fn quantity(self) -> Time {
        match self {
            Self::Second => Time::new::<second>(1.0),
            Self::Hour => Time::new::<hour>(1.0),
            Self::Day => Time::new::<day>(1.0),
        }
    }
}

/// Length unit choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LengthUnit {
    /// SI meter.
    Meter,
    /// Mean Earth radius.
    #[default]
    EarthRadius,
    /// Mean Earth–Moon distance.
    EarthMoonDistance,
}

impl LengthUnit {
    /// Length of one unit.
    #[must_use]
    pub fn quantity(self) -> Length {
        match self {
            Self::Meter => Length::new::<meter>(1.0),
            Self::EarthRadius => Length::new::<meter>(EARTH_RADIUS_M),
            Self::EarthMoonDistance => Length::new::<meter>(LUNAR_DISTANCE_M),
        }
    }
}

/// Mass unit choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MassUnit {
    /// SI kilogram.
    Kilogram,
    /// Earth mass.
    #[default]
    EarthMass,
}

impl MassUnit {
    /// Mass of one unit.
    #[must_use]
    pub fn quantity(self) -> Mass {
        match self {
            Self::Kilogram => Mass::new::<kilogram>(1.0),
            Self::EarthMass => Mass::new::<kilogram>(EARTH_MASS_KG),
        }
    }
}

/// A fixed choice of units with Newton's constant cached in them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitSystem {
    time: TimeUnit,
    length: LengthUnit,
    mass: MassUnit,
    newton_g: f64,
}

impl Default for UnitSystem {
    fn default() -> Self {
        Self::new(TimeUnit::Day, LengthUnit::EarthRadius, MassUnit::EarthMass)
    }
}

impl UnitSystem {
    /// Build a unit system and derive `G` in it.
    #[must_use]
    pub fn new(time: TimeUnit, length: LengthUnit, mass: MassUnit) -> Self {
        let t = time.quantity().get::<second>();
        let l = length.quantity().get::<meter>();
        let m = mass.quantity().get::<kilogram>();
        // G [L³ M⁻¹ T⁻²] rescaled into the chosen units.
        let newton_g = G_SI * m * t * t / (l * l * l);
        Self {
            time,
            length,
            mass,
            newton_g,
        }
    }

    /// Dimensionless system with an explicit `G` (commonly 1).
    ///
    /// Units are labelled SI; the astronomical helpers then return SI
    /// values and are rarely meaningful.
    #[must_use]
    pub const fn natural(newton_g: f64) -> Self {
        Self {
            time: TimeUnit::Second,
            length: LengthUnit::Meter,
            mass: MassUnit::Kilogram,
            newton_g,
        }
    }

    /// Keep the unit labels but replace the derived `G`.
    ///
    /// Used for scaled demonstrations where `G = 1` reads better than the
    /// physical value.
    #[must_use]
    pub const fn with_newton_g(mut self, newton_g: f64) -> Self {
        self.newton_g = newton_g;
        self
    }

    /// Newton's gravitational constant in this system.
    #[must_use]
    pub const fn newton_g(&self) -> f64 {
        self.newton_g
    }

    /// Time unit.
    #[must_use]
    pub const fn time_unit(&self) -> TimeUnit {
        self.time
    }

    /// Length unit.
    #[must_use]
    pub const fn length_unit(&self) -> LengthUnit {
        self.length
    }

    /// Mass unit.
    #[must_use]
    pub const fn mass_unit(&self) -> MassUnit {
        self.mass
    }

    /// Express a `uom` time in this system's time unit.
    #[must_use]
    pub fn time(&self, t: Time) -> f64 {
        (t / self.time.quantity()).value
    }

    /// Express a `uom` length in this system's length unit.
    #[must_use]
    pub fn length(&self, l: Length) -> f64 {
        (l / self.length.quantity()).value
    }

    /// Express a `uom` mass in this system's mass unit.
    #[must_use]
    pub fn mass(&self, m: Mass) -> f64 {
        (m / self.mass.quantity()).value
    }

    /// Earth mass in this system.
    #[must_use]
    pub fn earth_mass(&self) -> f64 {
        self.mass(Mass::new::<kilogram>(EARTH_MASS_KG))
    }

    /// Lunar mass in this system.
    #[must_use]
    pub fn lunar_mass(&self) -> f64 {
        self.mass(Mass::new::<kilogram>(LUNAR_MASS_KG))
    }

    /// Earth radius in this system.
    #[must_use]
    pub fn earth_radius(&self) -> f64 {
        self.length(Length::new::<meter>(EARTH_RADIUS_M))
    }

    /// Lunar radius in this system.
    #[must_use]
    pub fn lunar_radius(&self) -> f64 {
        self.length(Length::new::<meter>(LUNAR_RADIUS_M))
    }

    /// Earth–Moon distance in this system.
    #[must_use]
    pub fn lunar_distance(&self) -> f64 {
        self.length(Length::new::<meter>(LUNAR_DISTANCE_M))
    }

    /// Sidereal Earth rotation period in this system.
    #[must_use]
    pub fn earth_rotation_period(&self) -> f64 {
        self.time(Time::new::<second>(EARTH_ROTATION_PERIOD_S))
    }

    /// Kepler period of a circular orbit of radius `distance` around `central_mass`.
    #[must_use]
    pub fn circular_period(&self, distance: f64, central_mass: f64) -> f64 {
        2.0 * std::f64::consts::PI * (distance.powi(3) / (self.newton_g * central_mass)).sqrt()
    }
}
