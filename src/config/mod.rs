//! Configuration system with YAML schema and validation.
//!
//! Implements Poka-Yoke (mistake-proofing) through:
//! - Type-safe configuration structs with `deny_unknown_fields`
//! - Schema validation via `validator`
//! - Runtime semantic validation (bodies, periods, timings)

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use validator::Validate;

use crate::error::{SimError, SimResult};
use crate::orbit::body::Body;
use crate::orbit::integrator::{KernelChoice, UpdateOrder, DEFAULT_SUBSTEPS};
use crate::orbit::jidoka::OrbitJidokaConfig;
use crate::orbit::state::{Reduction, DEFAULT_MIN_SEPARATION};
use crate::orbit::units::{LengthUnit, MassUnit, TimeUnit, UnitSystem};
use crate::orbit::vector::Vec3;
use crate::spin::discrete::{DEFAULT_MAX_STEP_ANGLE, DEFAULT_SYNC_GAIN, DEFAULT_SYNC_TOLERANCE};
use crate::spin::relaxation::{DEFAULT_EXPONENT, DEFAULT_RATE_CONSTANT};
use crate::spin::{ContinuousRelaxation, OscillatorParams, PeriodFactorSync, SpinMode};
use crate::tidal::DEFAULT_VECTOR_SCALE;
use crate::transition::{CancelPolicy, ReshapeTimings};

/// Top-level simulation configuration.
///
/// Loaded from YAML files with full schema validation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Human-readable run name.
    #[serde(default)]
    pub name: String,

    /// Unit choice; fixed for the life of a simulation.
    #[serde(default)]
    pub units: UnitsConfig,

    /// The two bodies and how their motion is reduced.
    #[validate(nested)]
    pub bodies: BodiesConfig,

    /// Orbit integration settings.
    #[validate(nested)]
    #[serde(default)]
    pub integrator: IntegratorConfig,

    /// Spin coupling of the secondary.
    #[validate(nested)]
    #[serde(default)]
    pub spin: SpinConfig,

    /// Tidal field sampling.
    #[validate(nested)]
    #[serde(default)]
    pub tidal: TidalConfig,

    /// Multiplier from host wall time to simulation time.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,

    /// Jidoka (stop-on-error) configuration.
    #[serde(default)]
    pub jidoka: OrbitJidokaConfig,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

const fn default_time_scale() -> f64 {
    1.0
}

const fn default_true() -> bool {
    true
}

impl SimConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        info!(path = %path.display(), name = %config.name, "configuration loaded");
        Ok(config)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Serialize back to YAML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Run schema and semantic validation.
    ///
    /// Configs assembled in code (builder, scenarios) skip the YAML path, so
    /// the simulation calls this itself on construction.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate_all(&self) -> SimResult<()> {
        // Poka-Yoke: validate all constraints
        self.validate()?;
        // Additional semantic validation
        self.validate_semantic()
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::default()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> SimResult<()> {
        let units = self.units.unit_system()?;
        if !units.newton_g().is_finite() || units.newton_g() <= 0.0 {
            return Err(SimError::config(format!(
                "Gravitational constant must be positive, got {}",
                units.newton_g()
            )));
        }

        let primary = self.bodies.primary.to_body()?;
        let secondary = self.bodies.secondary.to_body()?;
        if (secondary.position - primary.position).magnitude() <= self.integrator.min_separation {
            return Err(SimError::config(
                "Primary and secondary must start at distinct positions",
            ));
        }
        if !primary.velocity.is_finite() || !secondary.velocity.is_finite() {
            return Err(SimError::config("Body velocities must be finite"));
        }

        if !self.integrator.min_separation.is_finite() || self.integrator.min_separation <= 0.0 {
            return Err(SimError::config("min_separation must be positive"));
        }

        // Builds the relaxation law, which checks its own constants.
        self.spin.relaxation()?;
        self.spin.timings().validate()?;
        PeriodFactorSync::with_gain(1.0, self.spin.sync_gain, self.spin.sync_tolerance)?;
        if self.spin.max_step_angle <= 0.0 || !self.spin.max_step_angle.is_finite() {
            return Err(SimError::config("max_step_angle must be positive"));
        }
        if self.bodies.secondary.rotation_period < self.spin.min_period {
            return Err(SimError::config(format!(
                "Secondary rotation period {} is below the floor {}",
                self.bodies.secondary.rotation_period, self.spin.min_period
            )));
        }

        if !self.time_scale.is_finite() {
            return Err(SimError::config("time_scale must be finite"));
        }

        Ok(())
    }
}

impl Default for SimConfig {
    /// Earth–Moon, one-body reduction, Moon spinning faster than it orbits.
    fn default() -> Self {
        let units = UnitSystem::default();
        let distance = units.lunar_distance();
        let earth_mass = units.earth_mass();
        let speed = (units.newton_g() * earth_mass / distance).sqrt();

        Self {
            schema_version: default_schema_version(),
            name: "earth-moon".to_string(),
            units: UnitsConfig::default(),
            bodies: BodiesConfig {
                reduction: Reduction::FixedPrimary,
                primary: BodyConfig {
                    position: [0.0; 3],
                    velocity: [0.0; 3],
                    mass: earth_mass,
                    radius: units.earth_radius(),
                    rotation_period: units.earth_rotation_period(),
                    rotation_angle: 0.0,
                    rotating: true,
                },
                secondary: BodyConfig {
                    position: [distance, 0.0, 0.0],
                    velocity: [0.0, 0.0, speed],
                    mass: units.lunar_mass(),
                    radius: units.lunar_radius(),
                    rotation_period: 10.0,
                    rotation_angle: 0.0,
                    rotating: true,
                },
            },
            integrator: IntegratorConfig::default(),
            spin: SpinConfig::default(),
            tidal: TidalConfig::default(),
            time_scale: default_time_scale(),
            jidoka: OrbitJidokaConfig::default(),
        }
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct SimConfigBuilder {
    name: Option<String>,
    units: Option<UnitsConfig>,
    reduction: Option<Reduction>,
    primary: Option<BodyConfig>,
    secondary: Option<BodyConfig>,
    num_substeps: Option<u32>,
    kernel: Option<KernelChoice>,
    spin_mode: Option<SpinMode>,
    time_scale: Option<f64>,
    jidoka: Option<OrbitJidokaConfig>,
}

impl SimConfigBuilder {
    /// Set the run name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the unit choice.
    #[must_use]
    pub const fn units(mut self, units: UnitsConfig) -> Self {
        self.units = Some(units);
        self
    }

    /// Set the reduction of the two-body problem.
    #[must_use]
    pub const fn reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = Some(reduction);
        self
    }

    /// Set body A.
    #[must_use]
    pub const fn primary(mut self, body: BodyConfig) -> Self {
        self.primary = Some(body);
        self
    }

    /// Set body B.
    #[must_use]
    pub const fn secondary(mut self, body: BodyConfig) -> Self {
        self.secondary = Some(body);
        self
    }

    /// Set the substep count.
    #[must_use]
    pub const fn num_substeps(mut self, n: u32) -> Self {
        self.num_substeps = Some(n);
        self
    }

    /// Set the step kernel.
    #[must_use]
    pub const fn kernel(mut self, kernel: KernelChoice) -> Self {
        self.kernel = Some(kernel);
        self
    }

    /// Set the spin coupling mode.
    #[must_use]
    pub const fn spin_mode(mut self, mode: SpinMode) -> Self {
        self.spin_mode = Some(mode);
        self
    }

    /// Set the time multiplier.
    #[must_use]
    pub const fn time_scale(mut self, scale: f64) -> Self {
        self.time_scale = Some(scale);
        self
    }

    /// Set Jidoka configuration.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // OrbitJidokaConfig doesn't impl Copy
    pub fn jidoka(mut self, config: OrbitJidokaConfig) -> Self {
        self.jidoka = Some(config);
        self
    }

    /// Build the configuration on top of the Earth–Moon default.
    #[must_use]
    pub fn build(self) -> SimConfig {
        let mut config = SimConfig::default();

        if let Some(name) = self.name {
            config.name = name;
        }
        if let Some(units) = self.units {
            config.units = units;
        }
        if let Some(reduction) = self.reduction {
            config.bodies.reduction = reduction;
        }
        if let Some(primary) = self.primary {
            config.bodies.primary = primary;
        }
        if let Some(secondary) = self.secondary {
            config.bodies.secondary = secondary;
        }
        if let Some(n) = self.num_substeps {
            config.integrator.num_substeps = n;
        }
        if let Some(kernel) = self.kernel {
            config.integrator.kernel = kernel;
        }
        if let Some(mode) = self.spin_mode {
            config.spin.mode = mode;
        }
        if let Some(scale) = self.time_scale {
            config.time_scale = scale;
        }
        if let Some(jidoka) = self.jidoka {
            config.jidoka = jidoka;
        }

        config
    }
}

/// Unit choice.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnitsConfig {
    /// Time unit.
    pub time: TimeUnit,
    /// Length unit.
    pub length: LengthUnit,
    /// Mass unit.
    pub mass: MassUnit,
    /// Explicit `G`, replacing the value derived from the units.
    pub newton_g: Option<f64>,
}

impl UnitsConfig {
    /// Dimensionless units with an explicit `G`.
    #[must_use]
    pub const fn natural(newton_g: f64) -> Self {
        Self {
            time: TimeUnit::Second,
            length: LengthUnit::Meter,
            mass: MassUnit::Kilogram,
            newton_g: Some(newton_g),
        }
    }

    /// Resolve to a [`UnitSystem`] with `G` cached.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if an explicit `G` is not positive.
    pub fn unit_system(&self) -> SimResult<UnitSystem> {
        let units = UnitSystem::new(self.time, self.length, self.mass);
        match self.newton_g {
            Some(g) if !(g.is_finite() && g > 0.0) => Err(SimError::invalid_parameter("newton_g", g)),
            Some(g) => Ok(units.with_newton_g(g)),
            None => Ok(units),
        }
    }
}

/// Both bodies.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BodiesConfig {
    /// Centre-of-mass or fixed-primary reduction.
    #[serde(default)]
    pub reduction: Reduction,
    /// Body A.
    #[validate(nested)]
    pub primary: BodyConfig,
    /// Body B, the one whose spin couples to the orbit.
    #[validate(nested)]
    pub secondary: BodyConfig,
}

/// One body's initial conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    /// Initial world-space position.
    pub position: [f64; 3],
    /// Initial world-space velocity.
    #[serde(default)]
    pub velocity: [f64; 3],
    /// Mass in mass units.
    #[validate(range(min = 0.0))]
    pub mass: f64,
    /// Visual radius in length units.
    #[validate(range(min = 0.0))]
    pub radius: f64,
    /// Time for one full spin.
    #[serde(default = "default_rotation_period")]
    pub rotation_period: f64,
    /// Initial spin angle in degrees.
    #[serde(default)]
    pub rotation_angle: f64,
    /// Whether the spin angle advances at all.
    #[serde(default = "default_true")]
    pub rotating: bool,
}

const fn default_rotation_period() -> f64 {
    1.0
}

impl BodyConfig {
    /// A body at rest with unit spin period.
    #[must_use]
    pub const fn at(position: [f64; 3], mass: f64, radius: f64) -> Self {
        Self {
            position,
            velocity: [0.0; 3],
            mass,
            radius,
            rotation_period: 1.0,
            rotation_angle: 0.0,
            rotating: true,
        }
    }

    /// Same body with an initial velocity.
    #[must_use]
    pub const fn moving(mut self, velocity: [f64; 3]) -> Self {
        self.velocity = velocity;
        self
    }

    /// Same body with a spin period.
    #[must_use]
    pub const fn spinning(mut self, rotation_period: f64) -> Self {
        self.rotation_period = rotation_period;
        self
    }

    /// Build the validated [`Body`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidBody` for a non-positive mass, radius or spin period.
    pub fn to_body(&self) -> SimResult<Body> {
        let mut body = Body::new(
            Vec3::from(self.position),
            Vec3::from(self.velocity),
            self.mass,
            self.radius,
        )?
        .with_rotation_period(self.rotation_period)?;
        body.set_rotation_angle(self.rotation_angle);
        Ok(body)
    }
}

/// Orbit integration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct IntegratorConfig {
    /// Substeps per tick.
    #[validate(range(min = 1))]
    pub num_substeps: u32,
    /// Step kernel.
    pub kernel: KernelChoice,
    /// Euler update order for the Cartesian kernel.
    pub update_order: UpdateOrder,
    /// Snap back to the initial state once per period.
    pub reset_after_one_period: bool,
    /// Separation floor inside `1/|r|²`.
    pub min_separation: f64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            num_substeps: DEFAULT_SUBSTEPS,
            kernel: KernelChoice::Auto,
            update_order: UpdateOrder::VelocityFirst,
            reset_after_one_period: true,
            min_separation: DEFAULT_MIN_SEPARATION,
        }
    }
}

/// Spin coupling of the secondary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct SpinConfig {
    /// Coupling mode.
    pub mode: SpinMode,
    /// Relaxation rate constant `k`.
    pub rate_constant: f64,
    /// Relaxation exponent `p`.
    pub exponent: f64,
    /// Floor on the spin period.
    pub min_period: f64,
    /// Orbital sweep between realignments, degrees.
    #[validate(range(min = 0.0, max = 360.0))]
    pub max_step_angle: f64,
    /// Wait before a realignment starts, seconds.
    pub reshape_delay: f64,
    /// Realignment interpolation window, seconds.
    pub reshape_duration: f64,
    /// Wait at the realigned angle, seconds.
    pub reshape_hold: f64,
    /// What a cancelled realignment leaves behind.
    pub cancel_policy: CancelPolicy,
    /// Discrete period-factor gain per cycle.
    #[validate(range(min = 0.0, max = 1.0))]
    pub sync_gain: f64,
    /// Discrete period-factor snap tolerance.
    pub sync_tolerance: f64,
    /// Damped bulge oscillator.
    pub oscillator: OscillatorParams,
}

impl Default for SpinConfig {
    fn default() -> Self {
        let timings = ReshapeTimings::default();
        Self {
            mode: SpinMode::Continuous,
            rate_constant: DEFAULT_RATE_CONSTANT,
            exponent: DEFAULT_EXPONENT,
            min_period: ContinuousRelaxation::default().min_period(),
            max_step_angle: DEFAULT_MAX_STEP_ANGLE,
            reshape_delay: timings.delay,
            reshape_duration: timings.duration,
            reshape_hold: timings.hold,
            cancel_policy: CancelPolicy::CommitTarget,
            sync_gain: DEFAULT_SYNC_GAIN,
            sync_tolerance: DEFAULT_SYNC_TOLERANCE,
            oscillator: OscillatorParams::default(),
        }
    }
}

impl SpinConfig {
    /// Realignment timings.
    #[must_use]
    pub const fn timings(&self) -> ReshapeTimings {
        ReshapeTimings {
            delay: self.reshape_delay,
            duration: self.reshape_duration,
            hold: self.reshape_hold,
        }
    }

    /// Continuous relaxation law.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for non-positive constants.
    pub fn relaxation(&self) -> SimResult<ContinuousRelaxation> {
        ContinuousRelaxation::new(self.rate_constant, self.exponent, self.min_period)
    }
}

/// Tidal field sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct TidalConfig {
    /// Visual scale on the force differential.
    #[validate(range(min = 0.0))]
    pub vector_scale: f64,
    /// Points around the outline, endpoints inclusive.
    #[validate(range(min = 2))]
    pub ring_samples: usize,
    /// Outline elongation along the bulge (1 = round).
    #[validate(range(min = 1.0))]
    pub bulge_ratio: f64,
}

impl Default for TidalConfig {
    fn default() -> Self {
        Self {
            vector_scale: DEFAULT_VECTOR_SCALE,
            ring_samples: 32,
            bulge_ratio: 1.2,
        }
    }
}
