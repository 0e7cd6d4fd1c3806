//! # tidelock
//!
//! Two-body orbits and tidal locking for interactive celestial mechanics.
//!
//! - Reduced two-body orbit with a substepped Cartesian kernel and an
//!   analytic polar kernel, resynchronised once per period
//! - Spin coupling: continuous power-law relaxation or discrete
//!   bulge realignment toward the orbital period
//! - Differential tidal force sampling around the secondary
//! - Jidoka guards: graceful degradation on drift, halt on non-finite state
//!
//! ## Example
//!
//! ```rust
//! use tidelock::prelude::*;
//!
//! let mut sim = Simulation::from_scenario(Scenario::TidalLockingAnimation)
//!     .expect("valid preset");
//! let report = sim.tick(1.0 / 60.0).expect("tick");
//! assert!(report.scaled_dt > 0.0);
//! assert!(!sim.tidal_samples().is_empty());
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Written to match the textbook formulas
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
    clippy::float_cmp,         // Exact comparisons guard sign flips and zero
)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod observer;
pub mod orbit;
pub mod spin;
pub mod tidal;
pub mod transition;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{SimConfig, SimConfigBuilder};
    pub use crate::engine::{RunSummary, SimClock, Simulation, TickReport};
    pub use crate::error::{SimError, SimResult};
    pub use crate::observer::{BodyId, EventLog, ObserverId, SimEvent, SimObserver};
    pub use crate::orbit::prelude::*;
    pub use crate::spin::{PeriodChange, SpinCoupling, SpinMode};
    pub use crate::tidal::{TidalFieldSampler, TidalSample};
    pub use crate::transition::{CancelPolicy, ReshapeTimings, Transition, TransitionPhase};
}

/// Re-export for public API
pub use error::{SimError, SimResult};
