//! Error types for tidelock.
//!
//! Configuration mistakes are rejected at the boundary (construction or
//! reset). Numerical degeneracies inside the integrator are recovered
//! locally and never surface here; the only numerical variants are the
//! ones a guard reports after the fact.

use thiserror::Error;

/// Result type alias for tidelock operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all tidelock operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Jidoka Violations =====
    /// Numerical instability detected (NaN or Inf).
    #[error("Jidoka: non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    /// Energy conservation violated beyond tolerance.
    #[error("Jidoka: energy drift {drift:.6e} exceeds tolerance {tolerance:.6e}")]
    EnergyDrift {
        /// Relative energy drift from the analytic value.
        drift: f64,
        /// Configured tolerance threshold.
        tolerance: f64,
    },

    // ===== Construction Errors =====
    /// A body was given a non-physical mass or radius.
    #[error("Invalid body: {field} must be positive and finite, got {value}")]
    InvalidBody {
        /// Offending field (`mass`, `radius`, ...).
        field: String,
        /// Rejected value.
        value: f64,
    },

    /// A numeric simulation parameter is out of its domain.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Rejected value.
        value: f64,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== I/O Errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid-body error.
    #[must_use]
    pub fn invalid_body(field: impl Into<String>, value: f64) -> Self {
        Self::InvalidBody {
            field: field.into(),
            value,
        }
    }

    /// Create an invalid-parameter error.
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, value: f64) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value,
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error is a Jidoka violation (requires immediate stop).
    #[must_use]
    pub const fn is_jidoka_violation(&self) -> bool {
        matches!(self, Self::NonFiniteValue { .. } | Self::EnergyDrift { .. })
    }
}

/// Reject anything that is not a strictly positive finite number.
///
/// # Errors
///
/// Returns `InvalidParameter` naming `name` when the check fails.
pub fn require_positive(name: &str, value: f64) -> SimResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::invalid_parameter(name, value))
    }
}
