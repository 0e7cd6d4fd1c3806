//! Timed angle transitions advanced by the simulation tick.
//!
//! A transition waits for `delay`, interpolates from the start angle to the
//! target over `duration` along the shorter arc, then holds the target for
//! `hold` before reporting completion. Cancelling never leaves a
//! half-interpolated angle: the [`CancelPolicy`] picks either end.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{require_positive, SimError, SimResult};

/// What a cancelled transition leaves behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CancelPolicy {
    /// Jump to the target angle.
    #[default]
    CommitTarget,
    /// Return to the start angle.
    RevertToStart,
}

/// Delay, interpolation and hold durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReshapeTimings {
    /// Wait before moving.
    pub delay: f64,
    /// Interpolation window.
    pub duration: f64,
    /// Wait at the target before completing.
    pub hold: f64,
}

impl Default for ReshapeTimings {
    fn default() -> Self {
        Self {
            delay: 0.5,
            duration: 1.4,
            hold: 1.5,
        }
    }
}

impl ReshapeTimings {
    /// Check the durations.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a non-positive `duration` or a negative
    /// `delay`/`hold`.
    pub fn validate(&self) -> SimResult<()> {
        require_positive("reshape_duration", self.duration)?;
        for (name, value) in [("reshape_delay", self.delay), ("reshape_hold", self.hold)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::invalid_parameter(name, value));
            }
        }
        Ok(())
    }

    /// End-to-end length.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.delay + self.duration + self.hold
    }
}

/// Which stretch of a running transition we are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// Before interpolation starts.
    Delay,
    /// Moving toward the target.
    Interpolating,
    /// Sitting on the target.
    Holding,
}

/// Result of advancing a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionTick {
    /// Angle to apply this tick, if a transition is running.
    pub angle: Option<f64>,
    /// The transition completed this tick.
    pub finished: bool,
}

/// Idle or running angle transition.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Transition {
    /// Nothing running.
    #[default]
    Idle,
    /// Running from `start` to `target`.
    Transitioning {
        /// Angle at the start, degrees.
        start: f64,
        /// Angle at the end, degrees, on the shorter arc from `start`.
        target: f64,
        /// Time spent so far.
        elapsed: f64,
        /// Phase lengths.
        timings: ReshapeTimings,
    },
}

impl Transition {
    /// Begin moving from `start` to `target` (degrees).
    ///
    /// Any running transition is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid timings or non-finite angles.
    pub fn start(&mut self, start: f64, target: f64, timings: ReshapeTimings) -> SimResult<()> {
        timings.validate()?;
        if !start.is_finite() || !target.is_finite() {
            return Err(SimError::NonFiniteValue {
                location: "transition angle".to_string(),
            });
        }
        let target = start + shortest_arc(start, target);
        debug!(start, target, "transition started");
        *self = Self::Transitioning {
            start,
            target,
            elapsed: 0.0,
            timings,
        };
        Ok(())
    }

    /// Advance by `dt` seconds.
    pub fn advance(&mut self, dt: f64) -> TransitionTick {
        let Self::Transitioning {
            start,
            target,
            elapsed,
            timings,
        } = self
        else {
            return TransitionTick {
                angle: None,
                finished: false,
            };
        };

        *elapsed += dt.max(0.0);
        if *elapsed >= timings.total() {
            let angle = *target;
            debug!(angle, "transition finished");
            *self = Self::Idle;
            return TransitionTick {
                angle: Some(angle),
                finished: true,
            };
        }
        let t = ((*elapsed - timings.delay) / timings.duration).clamp(0.0, 1.0);
        TransitionTick {
            angle: Some(slerp_angle(*start, *target, t)),
            finished: false,
        }
    }

    /// Stop the transition, returning the angle the policy commits to.
    ///
    /// `None` when nothing was running.
    pub fn cancel(&mut self, policy: CancelPolicy) -> Option<f64> {
        let Self::Transitioning { start, target, .. } = *self else {
            return None;
        };
        *self = Self::Idle;
        let angle = match policy {
            CancelPolicy::CommitTarget => target,
            CancelPolicy::RevertToStart => start,
        };
        debug!(angle, ?policy, "transition cancelled");
        Some(angle)
    }

    /// Whether a transition is running.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Transitioning { .. })
    }

    /// Current phase, if running.
    #[must_use]
    pub fn phase(&self) -> Option<TransitionPhase> {
        match self {
            Self::Idle => None,
            Self::Transitioning {
                elapsed, timings, ..
            } => Some(if *elapsed < timings.delay {
                TransitionPhase::Delay
            } else if *elapsed < timings.delay + timings.duration {
                TransitionPhase::Interpolating
            } else {
                TransitionPhase::Holding
            }),
        }
    }
}

/// Signed difference `to − from` wrapped into `(−180, 180]` degrees.
#[must_use]
pub fn shortest_arc(from: f64, to: f64) -> f64 {
    let d = (to - from).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Interpolate between two angles along the shorter arc.
///
/// For a rotation about a fixed axis this is the same curve a quaternion
/// slerp traces.
#[must_use]
pub fn slerp_angle(from: f64, to: f64, t: f64) -> f64 {
    from + shortest_arc(from, to) * t.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn running(start: f64, target: f64) -> Transition {
        let mut transition = Transition::default();
        transition
            .start(start, target, ReshapeTimings::default())
            .expect("valid timings");
        transition
    }

    #[test]
    fn test_shortest_arc_wraps() {
        assert!((shortest_arc(350.0, 10.0) - 20.0).abs() < EPSILON);
        assert!((shortest_arc(10.0, 350.0) + 20.0).abs() < EPSILON);
        assert!((shortest_arc(0.0, 180.0) - 180.0).abs() < EPSILON);
    }

    #[test]
    fn test_slerp_angle_endpoints() {
        assert!((slerp_angle(350.0, 10.0, 0.5) - 360.0).abs() < EPSILON);
        assert!((slerp_angle(20.0, 80.0, 2.0) - 80.0).abs() < EPSILON);
    }

    #[test]
    fn test_phases_in_order() {
        let mut transition = running(0.0, 90.0);
        assert_eq!(transition.phase(), Some(TransitionPhase::Delay));

        let tick = transition.advance(0.25);
        assert!((tick.angle.expect("running")).abs() < EPSILON);

        transition.advance(0.25 + 0.7);
        assert_eq!(transition.phase(), Some(TransitionPhase::Interpolating));

        transition.advance(1.0);
        assert_eq!(transition.phase(), Some(TransitionPhase::Holding));

        let tick = transition.advance(10.0);
        assert!(tick.finished);
        assert!((tick.angle.expect("final") - 90.0).abs() < EPSILON);
        assert!(!transition.is_active());
    }

    #[test]
    fn test_midpoint_interpolation() {
        let mut transition = running(10.0, 50.0);
        let tick = transition.advance(0.5 + 0.7);
        assert!((tick.angle.expect("running") - 30.0).abs() < EPSILON);
    }

    #[test]
    fn test_interpolation_crosses_zero_the_short_way() {
        let mut transition = running(350.0, 10.0);
        let tick = transition.advance(0.5 + 0.7);
        assert!((tick.angle.expect("running") - 360.0).abs() < EPSILON);
    }

    #[test]
    fn test_cancel_commit_target() {
        let mut transition = running(0.0, 40.0);
        transition.advance(1.0);
        let angle = transition.cancel(CancelPolicy::CommitTarget);
        assert!((angle.expect("was running") - 40.0).abs() < EPSILON);
        assert_eq!(transition, Transition::Idle);
    }

    #[test]
    fn test_cancel_revert_to_start() {
        let mut transition = running(5.0, 40.0);
        transition.advance(1.0);
        let angle = transition.cancel(CancelPolicy::RevertToStart);
        assert!((angle.expect("was running") - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_cancel_idle_is_none() {
        let mut transition = Transition::Idle;
        assert!(transition.cancel(CancelPolicy::CommitTarget).is_none());
        let tick = transition.advance(1.0);
        assert!(tick.angle.is_none() && !tick.finished);
    }

    #[test]
    fn test_rejects_zero_duration() {
        let mut transition = Transition::Idle;
        let timings = ReshapeTimings {
            duration: 0.0,
            ..ReshapeTimings::default()
        };
        assert!(transition.start(0.0, 10.0, timings).is_err());
        assert!(!transition.is_active());
    }

    #[test]
    fn test_target_takes_shorter_arc() {
        let mut transition = running(350.0, 10.0);
        let tick = transition.advance(100.0);
        assert!((tick.angle.expect("final") - 370.0).abs() < EPSILON);
    }
}
