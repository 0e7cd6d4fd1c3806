//! Jidoka (自働化) guard for the reduced two-body state.
//!
//! Watches the relative state (and, through [`OrbitJidokaGuard::check_values`],
//! the spin and bulge angles) after each tick and degrades gracefully:
//! drift first produces warnings, repeated drift pauses the run for
//! intervention, and only non-finite values halt it. The Euler kernel
//! is expected to drift between resyncs, so the default tolerances are
//! loose; the polar kernel stays far inside them.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::orbit::state::TwoBodyState;

/// Guard verdict for one check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JidokaResponse {
    /// All checks passed.
    Continue,

    /// Something is drifting, keep going but surface it.
    Warning {
        message: String,
        metric: String,
        current: f64,
        threshold: f64,
    },

    /// Drift persisted, pause for intervention.
    Pause {
        violation: OrbitJidokaViolation,
        recoverable: bool,
        suggestion: String,
    },

    /// State is unusable.
    Halt { violation: OrbitJidokaViolation },
}

impl JidokaResponse {
    /// Check if this response allows continuation.
    #[must_use]
    pub const fn can_continue(&self) -> bool {
        matches!(self, Self::Continue | Self::Warning { .. })
    }

    /// Check if this is a warning.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::Warning { .. })
    }

    /// Check if simulation should pause.
    #[must_use]
    pub const fn should_pause(&self) -> bool {
        matches!(self, Self::Pause { .. })
    }

    /// Check if simulation should halt.
    #[must_use]
    pub const fn should_halt(&self) -> bool {
        matches!(self, Self::Halt { .. })
    }
}

/// What the guard found wrong.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrbitJidokaViolation {
    /// NaN or Inf in the relative state, a spin or the bulge.
    NonFinite { field: String },

    /// Energy moved away from its reset value.
    EnergyDrift {
        initial: f64,
        current: f64,
        relative_error: f64,
        tolerance: f64,
    },

    /// |L| moved away from its reset value.
    AngularMomentumDrift {
        initial: f64,
        current: f64,
        relative_error: f64,
        tolerance: f64,
    },

    /// Bodies closer than the configured threshold.
    CloseEncounter { separation: f64, threshold: f64 },
}

impl OrbitJidokaViolation {
    /// Crate error carrying the same information.
    #[must_use]
    pub fn to_error(&self) -> SimError {
        match self {
            Self::NonFinite { field } => SimError::NonFiniteValue {
                location: field.clone(),
            },
            Self::EnergyDrift {
                relative_error,
                tolerance,
                ..
            }
            | Self::AngularMomentumDrift {
                relative_error,
                tolerance,
                ..
            } => SimError::EnergyDrift {
                drift: *relative_error,
                tolerance: *tolerance,
            },
            Self::CloseEncounter { separation, .. } => {
                SimError::invalid_parameter("separation", *separation)
            }
        }
    }
}

impl std::fmt::Display for OrbitJidokaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite { field } => write!(f, "Non-finite {field}"),
            Self::EnergyDrift {
                relative_error,
                tolerance,
                ..
            } => {
                write!(f, "Energy drift {relative_error:.2e} exceeds tolerance {tolerance:.2e}")
            }
            Self::AngularMomentumDrift {
                relative_error,
                tolerance,
                ..
            } => write!(
                f,
                "Angular momentum drift {relative_error:.2e} exceeds tolerance {tolerance:.2e}"
            ),
            Self::CloseEncounter {
                separation,
                threshold,
            } => write!(f, "Close encounter at {separation:.2e} (threshold: {threshold:.2e})"),
        }
    }
}

/// Guard thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)] // Config struct with feature flags
pub struct OrbitJidokaConfig {
    /// Check for non-finite values.
    pub check_finite: bool,
    /// Check energy conservation.
    pub check_energy: bool,
    /// Energy drift tolerance (relative).
    pub energy_tolerance: f64,
    /// Energy warning threshold (fraction of tolerance).
    pub energy_warning_fraction: f64,
    /// Check angular momentum conservation.
    pub check_angular_momentum: bool,
    /// Angular momentum tolerance (relative).
    pub angular_momentum_tolerance: f64,
    /// Check for close encounters.
    pub check_close_encounters: bool,
    /// Separation below which bodies count as colliding, in length units.
    pub close_encounter_threshold: f64,
    /// Maximum warnings before pausing.
    pub max_warnings_before_pause: usize,
}

impl Default for OrbitJidokaConfig {
    fn default() -> Self {
        Self {
            check_finite: true,
            check_energy: true,
            energy_tolerance: 0.05,
            energy_warning_fraction: 0.8,
            check_angular_momentum: true,
            angular_momentum_tolerance: 0.05,
            check_close_encounters: true,
            close_encounter_threshold: 1e-6,
            max_warnings_before_pause: 10,
        }
    }
}

/// Last check results, for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)] // Status struct with multiple checks
pub struct JidokaStatus {
    /// Energy relative error.
    pub energy_error: f64,
    /// Energy check passed.
    pub energy_ok: bool,
    /// Angular momentum relative error.
    pub angular_momentum_error: f64,
    /// Angular momentum check passed.
    pub angular_momentum_ok: bool,
    /// All values finite.
    pub finite_ok: bool,
    /// Current separation.
    pub separation: f64,
    /// Close encounter warning.
    pub close_encounter_warning: bool,
    /// Total warning count.
    pub warning_count: usize,
}

/// Orbit guard with graceful degradation.
#[derive(Debug, Clone)]
pub struct OrbitJidokaGuard {
    config: OrbitJidokaConfig,
    initial_energy: Option<f64>,
    initial_angular_momentum: Option<f64>,
    warning_count: usize,
    status: JidokaStatus,
}

impl OrbitJidokaGuard {
    /// Create a new guard.
    #[must_use]
    pub fn new(config: OrbitJidokaConfig) -> Self {
        Self {
            config,
            initial_energy: None,
            initial_angular_momentum: None,
            warning_count: 0,
            status: JidokaStatus::default(),
        }
    }

    /// Take the reference values from a freshly reset state.
    pub fn initialize(&mut self, state: &TwoBodyState) {
        self.initial_energy = Some(state.energy());
        self.initial_angular_momentum = Some(state.angular_momentum().magnitude());
        self.warning_count = 0;
    }

    /// Reset warning count (e.g., after user intervention).
    pub fn reset_warnings(&mut self) {
        self.warning_count = 0;
    }

    /// Status of the most recent check.
    #[must_use]
    pub const fn status(&self) -> &JidokaStatus {
        &self.status
    }

    /// Check state and return response.
    pub fn check(&mut self, state: &TwoBodyState) -> JidokaResponse {
        self.status = JidokaStatus {
            warning_count: self.warning_count,
            ..JidokaStatus::default()
        };

        if self.config.check_finite {
            if let Some(response) = self.check_finite(state) {
                return response;
            }
        }
        if self.config.check_energy {
            if let Some(response) = self.check_energy(state) {
                return response;
            }
        }
        if self.config.check_angular_momentum {
            if let Some(response) = self.check_angular_momentum(state) {
                return response;
            }
        }
        if self.config.check_close_encounters {
            if let Some(response) = self.check_close_encounter(state) {
                return response;
            }
        }
        JidokaResponse::Continue
    }

    /// Halt on the first non-finite value among named quantities the
    /// relative state does not carry (spin periods, angles, bulge offset).
    pub fn check_values(&mut self, values: &[(&str, f64)]) -> JidokaResponse {
        if !self.config.check_finite {
            return JidokaResponse::Continue;
        }
        match values.iter().find(|(_, value)| !value.is_finite()) {
            Some((field, _)) => {
                self.status.finite_ok = false;
                JidokaResponse::Halt {
                    violation: OrbitJidokaViolation::NonFinite {
                        field: (*field).to_string(),
                    },
                }
            }
            None => JidokaResponse::Continue,
        }
    }

    fn check_finite(&mut self, state: &TwoBodyState) -> Option<JidokaResponse> {
        let field = if !state.relative_position().is_finite() {
            "relative position"
        } else if !state.relative_velocity().is_finite() {
            "relative velocity"
        } else {
            self.status.finite_ok = true;
            return None;
        };
        self.status.finite_ok = false;
        Some(JidokaResponse::Halt {
            violation: OrbitJidokaViolation::NonFinite {
                field: field.to_string(),
            },
        })
    }

    fn escalate(&mut self, violation: OrbitJidokaViolation, suggestion: &str) -> Option<JidokaResponse> {
        self.warning_count += 1;
        self.status.warning_count = self.warning_count;
        if self.warning_count >= self.config.max_warnings_before_pause {
            return Some(JidokaResponse::Pause {
                violation,
                recoverable: true,
                suggestion: suggestion.to_string(),
            });
        }
        None
    }

    fn check_energy(&mut self, state: &TwoBodyState) -> Option<JidokaResponse> {
        let initial = self.initial_energy?;
        let current = state.current_energy();
        let relative_error = relative(current, initial);
        let tolerance = self.config.energy_tolerance;

        self.status.energy_error = relative_error;
        self.status.energy_ok = relative_error <= tolerance;

        if relative_error > tolerance {
            let violation = OrbitJidokaViolation::EnergyDrift {
                initial,
                current,
                relative_error,
                tolerance,
            };
            if let Some(pause) =
                self.escalate(violation, "Raise num_substeps or switch to the polar kernel")
            {
                return Some(pause);
            }
            return Some(JidokaResponse::Warning {
                message: format!("Energy drift: {relative_error:.2e}"),
                metric: "energy".to_string(),
                current: relative_error,
                threshold: tolerance,
            });
        }

        if relative_error > tolerance * self.config.energy_warning_fraction {
            return Some(JidokaResponse::Warning {
                message: format!("Energy approaching tolerance: {relative_error:.2e}"),
                metric: "energy".to_string(),
                current: relative_error,
                threshold: tolerance,
            });
        }
        None
    }

    fn check_angular_momentum(&mut self, state: &TwoBodyState) -> Option<JidokaResponse> {
        let initial = self.initial_angular_momentum?;
        let current = state.current_angular_momentum().magnitude();
        let relative_error = relative(current, initial);
        let tolerance = self.config.angular_momentum_tolerance;

        self.status.angular_momentum_error = relative_error;
        self.status.angular_momentum_ok = relative_error <= tolerance;

        if relative_error > tolerance {
            let violation = OrbitJidokaViolation::AngularMomentumDrift {
                initial,
                current,
                relative_error,
                tolerance,
            };
            return self.escalate(violation, "Angular momentum drifts only through integration error");
        }
        None
    }

    fn check_close_encounter(&mut self, state: &TwoBodyState) -> Option<JidokaResponse> {
        let separation = state.relative_position().magnitude();
        let threshold = self.config.close_encounter_threshold;
        self.status.separation = separation;
        self.status.close_encounter_warning = separation < threshold;

        if separation < threshold {
            let violation = OrbitJidokaViolation::CloseEncounter {
                separation,
                threshold,
            };
            if let Some(pause) = self.escalate(violation, "Bodies overlap; reset with a larger separation") {
                return Some(pause);
            }
            return Some(JidokaResponse::Warning {
                message: format!("Close encounter at {separation:.2e}"),
                metric: "separation".to_string(),
                current: separation,
                threshold,
            });
        }
        None
    }
}

fn relative(current: f64, initial: f64) -> f64 {
    if initial.abs() > f64::EPSILON {
        (current - initial).abs() / initial.abs()
    } else {
        (current - initial).abs()
    }
}
