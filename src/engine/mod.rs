//! Core simulation engine.
//!
//! [`Simulation`] is the per-tick driver the host calls. One tick:
//!
//! 1. advances a running bulge realignment on unscaled wall time,
//! 2. steps the orbit in substeps and resyncs once per period,
//! 3. moves the bodies to the new relative state,
//! 4. spins both bodies and couples the secondary's spin to the orbit,
//! 5. lets a displaced bulge swing back,
//! 6. runs the Jidoka guard.
//!
//! Everything the host reacts to is delivered through [`SimObserver`]s.

pub mod clock;

use serde::Serialize;
use tracing::{debug, error, info, warn};

pub use clock::SimClock;

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::observer::{BodyId, ObserverId, Observers, SimEvent, SimObserver};
use crate::orbit::body::{wrap_degrees, Body};
use crate::orbit::integrator::OrbitIntegrator;
use crate::orbit::jidoka::{JidokaResponse, OrbitJidokaGuard, OrbitJidokaViolation};
use crate::orbit::scenarios::Scenario;
use crate::orbit::state::{Reduction, TwoBodyState};
use crate::orbit::units::UnitSystem;
use crate::orbit::vector::Vec3;
use crate::spin::{BulgeOscillator, DiscreteLocking, PeriodChange, SpinCoupling, SpinMode};
use crate::tidal::{TidalFieldSampler, TidalSample};
use crate::transition::{shortest_arc, CancelPolicy, Transition};

/// What one call to [`Simulation::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Wall `dt` times the time multiplier.
    pub scaled_dt: f64,
    /// The orbit did not move (paused or realigning).
    pub skipped: bool,
    /// The orbit snapped back to its initial state.
    pub resynced: bool,
    /// A discrete-mode realignment began.
    pub realignment_started: bool,
    /// A realignment completed.
    pub realignment_finished: bool,
    /// The secondary's spin period changed.
    pub period_change: Option<PeriodChange>,
    /// The guard raised a warning.
    pub warning: bool,
    /// The guard paused the run.
    pub guard_paused: bool,
}

/// Headline numbers of a run, for printing or JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Configuration name.
    pub name: String,
    /// Host ticks taken.
    pub ticks: u64,
    /// Simulation time advanced.
    pub sim_time: f64,
    /// Kernel that ran.
    pub kernel: String,
    /// Orbital period (`null` in JSON when unbound).
    pub orbital_period: Option<f64>,
    /// Eccentricity.
    pub eccentricity: f64,
    /// Semi-major axis (`null` when unbound).
    pub semi_major_axis: Option<f64>,
    /// Energy fixed at reset.
    pub energy: f64,
    /// Relative energy error now.
    pub energy_drift: f64,
    /// Periodic snaps so far.
    pub resyncs: u64,
    /// Primary spin period.
    pub primary_rotation_period: f64,
    /// Secondary spin period.
    pub secondary_rotation_period: f64,
    /// Secondary spin angle in degrees.
    pub secondary_rotation_angle: f64,
    /// Coupling mode.
    pub spin_mode: SpinMode,
    /// Whether the secondary is tidally locked.
    pub locked: bool,
    /// Completed discrete realignments.
    pub discrete_cycles: u64,
    /// Orbit currently suspended.
    pub paused: bool,
    /// Guard halt reason, if any.
    pub halted: Option<String>,
}

/// Two-body orbit with spin coupling and tidal sampling.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    units: UnitSystem,
    primary: Body,
    secondary: Body,
    state: TwoBodyState,
    integrator: OrbitIntegrator,
    spin: SpinCoupling,
    transition: Transition,
    oscillator: BulgeOscillator,
    sampler: TidalFieldSampler,
    guard: OrbitJidokaGuard,
    observers: Observers,
    clock: SimClock,
    /// +1 when spin angles grow in the same sense as the orbit, −1 otherwise.
    spin_sense: f64,
    user_paused: bool,
    halted: Option<OrbitJidokaViolation>,
}

impl Simulation {
    /// Build from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate_all()?;
        let units = config.units.unit_system()?;
        let (state, integrator) = crate::orbit::build_orbit(&config)?;
        let primary = config.bodies.primary.to_body()?;
        let secondary = config.bodies.secondary.to_body()?;

        let mut spin = SpinCoupling::new(
            config.spin.mode,
            config.spin.relaxation()?,
            DiscreteLocking::new(config.spin.max_step_angle)?,
        )
        .with_sync(config.spin.sync_gain, config.spin.sync_tolerance)?;
        spin.prime(&secondary, state.period())?;

        let sampler = TidalFieldSampler::new(
            units.newton_g(),
            primary.mass(),
            secondary.mass(),
            config.tidal.vector_scale,
        )?
        .with_min_separation(config.integrator.min_separation)?;

        let mut guard = OrbitJidokaGuard::new(config.jidoka.clone());
        guard.initialize(&state);

        let spin_sense = spin_sense_of(&state);
        info!(
            name = %config.name,
            period = state.period(),
            eccentricity = state.eccentricity(),
            mode = ?config.spin.mode,
            "simulation ready"
        );

        Ok(Self {
            oscillator: BulgeOscillator::new(config.spin.oscillator)?,
            clock: SimClock::new(config.time_scale)?,
            units,
            primary,
            secondary,
            state,
            integrator,
            spin,
            transition: Transition::Idle,
            sampler,
            guard,
            observers: Observers::default(),
            spin_sense,
            user_paused: false,
            halted: None,
            config,
        })
    }

    /// Build a named preset.
    ///
    /// # Errors
    ///
    /// Returns an error if the preset fails validation.
    pub fn from_scenario(scenario: Scenario) -> SimResult<Self> {
        Self::new(scenario.config())
    }

    /// Advance by `dt` of host wall time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a negative or non-finite `dt`, and the
    /// guard's error once it has halted the run; a halted simulation keeps
    /// refusing ticks until [`Self::reset`].
    pub fn tick(&mut self, dt: f64) -> SimResult<TickReport> {
        if let Some(violation) = &self.halted {
            return Err(violation.to_error());
        }
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(SimError::invalid_parameter("dt", dt));
        }

        let mut report = TickReport::default();
        if self.user_paused {
            report.skipped = true;
            self.clock.tick(dt, false);
            return Ok(report);
        }

        // Realignments run on wall time so they look the same at any time scale.
        let transition = self.transition.advance(dt);
        if let Some(angle) = transition.angle {
            self.secondary.set_rotation_angle(angle);
        }
        if transition.finished {
            report.period_change = self.finish_realignment()?;
            report.realignment_finished = true;
        }

        let outcome = self.integrator.step(&mut self.state, dt, self.clock.time_scale())?;
        let scaled = self.clock.tick(dt, !outcome.skipped);
        report.scaled_dt = scaled;
        report.skipped = outcome.skipped;
        report.resynced = outcome.resynced;
        if outcome.resynced {
            self.observers.notify(&SimEvent::Resynced {
                count: self.integrator.resync_count(),
            });
        }
        self.sync_bodies();

        // The guard sees the orbit before anything downstream reads it.
        let orbit_response = if outcome.skipped {
            JidokaResponse::Continue
        } else {
            self.guard.check(&self.state)
        };
        if let JidokaResponse::Halt { violation } = orbit_response {
            return Err(self.halt(violation));
        }

        if !outcome.skipped {
            self.advance_rotation(scaled);
            if let Some(change) = self.couple_spin(scaled)? {
                report.period_change = Some(change);
            }
            if self.spin.mode() == SpinMode::Discrete && self.config.bodies.secondary.rotating {
                let period = self.state.period();
                if period.is_finite() && self.spin.record_sweep(scaled * 360.0 / period) {
                    self.begin_realignment()?;
                    report.realignment_started = true;
                }
            }
        }

        self.oscillator.step(scaled, self.config.integrator.num_substeps);

        let response = match self.guard.check_values(&[
            ("primary rotation angle", self.primary.rotation_angle()),
            ("secondary rotation angle", self.secondary.rotation_angle()),
            ("secondary rotation period", self.secondary.rotation_period()),
            ("bulge displacement", self.oscillator.displacement()),
        ]) {
            JidokaResponse::Continue => orbit_response,
            halt => halt,
        };
        match response {
            JidokaResponse::Continue => {}
            JidokaResponse::Warning { message, .. } => {
                debug!(%message, "jidoka warning");
                report.warning = true;
            }
            JidokaResponse::Pause { violation, suggestion, .. } => {
                warn!(%violation, %suggestion, "jidoka paused the simulation");
                self.guard.reset_warnings();
                self.pause();
                report.guard_paused = true;
            }
            JidokaResponse::Halt { violation } => return Err(self.halt(violation)),
        }

        Ok(report)
    }

    /// Run `ticks` ticks of `dt` and summarise.
    ///
    /// # Errors
    ///
    /// Propagates the first tick error.
    pub fn run(&mut self, ticks: u64, dt: f64) -> SimResult<RunSummary> {
        for _ in 0..ticks {
            self.tick(dt)?;
        }
        Ok(self.summary())
    }

    /// Suspend everything until [`Self::resume`].
    pub fn pause(&mut self) {
        if self.user_paused {
            return;
        }
        self.user_paused = true;
        self.integrator.pause();
        self.observers.notify(&SimEvent::Paused);
    }

    /// Undo [`Self::pause`]. The orbit stays still while a realignment runs.
    pub fn resume(&mut self) {
        if !self.user_paused {
            return;
        }
        self.user_paused = false;
        if !self.transition.is_active() {
            self.integrator.resume();
        }
        self.observers.notify(&SimEvent::Resumed);
    }

    /// Return to the configured initial state.
    ///
    /// A running realignment is cancelled first under the configured
    /// policy, so observers see where it would have ended. Observers and
    /// the current time multiplier survive the reset.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration no longer builds.
    pub fn reset(&mut self) -> SimResult<()> {
        self.cancel_transition()?;
        let mut fresh = Self::new(self.config.clone())?;
        fresh.clock.set_time_scale(self.clock.time_scale())?;
        fresh.observers = std::mem::take(&mut self.observers);
        *self = fresh;
        debug!("simulation reset");
        self.observers.notify(&SimEvent::Reset);
        Ok(())
    }

    /// Stop a running realignment under the configured [`CancelPolicy`].
    ///
    /// Committing counts as a finished cycle; reverting abandons it. The
    /// orbit resumes unless the user has paused it. Returns the angle left
    /// on the body, `None` when nothing was running.
    ///
    /// # Errors
    ///
    /// Returns an error if the committed period is rejected.
    pub fn cancel_transition(&mut self) -> SimResult<Option<f64>> {
        let policy = self.config.spin.cancel_policy;
        let Some(angle) = self.transition.cancel(policy) else {
            return Ok(None);
        };
        self.secondary.set_rotation_angle(angle);
        match policy {
            CancelPolicy::CommitTarget => {
                self.close_cycle()?;
            }
            CancelPolicy::RevertToStart => self.spin.abort_cycle(),
        }
        if !self.user_paused {
            self.integrator.resume();
        }
        self.observers.notify(&SimEvent::TransitionCancelled { angle, policy });
        Ok(Some(angle))
    }

    /// Change the time multiplier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a negative or non-finite scale.
    pub fn set_time_scale(&mut self, time_scale: f64) -> SimResult<()> {
        self.clock.set_time_scale(time_scale)
    }

    /// Set the secondary's spin period by hand.
    ///
    /// Coupling restarts from the new value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` below the configured floor.
    pub fn set_secondary_rotation_period(&mut self, period: f64) -> SimResult<()> {
        let floor = self.spin.relaxation().min_period();
        if !(period.is_finite() && period >= floor) {
            return Err(SimError::invalid_parameter("rotation_period", period));
        }
        let old = self.secondary.rotation_period();
        self.secondary.set_rotation_period(period)?;
        self.spin.prime(&self.secondary, self.state.period())?;
        self.observers.notify(&SimEvent::RotationPeriodChanged {
            body: BodyId::Secondary,
            old,
            new: period,
        });
        Ok(())
    }

    /// Hold the bulge `degrees` off its rest line.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a non-finite angle.
    pub fn grab_bulge(&mut self, degrees: f64) -> SimResult<()> {
        if !degrees.is_finite() {
            return Err(SimError::invalid_parameter("bulge_angle", degrees));
        }
        self.oscillator.grab(degrees);
        Ok(())
    }

    /// Let the bulge swing back.
    pub fn release_bulge(&mut self) {
        self.oscillator.release();
    }

    /// Register an observer.
    pub fn subscribe(&mut self, observer: Box<dyn SimObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Remove an observer, handing it back.
    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn SimObserver>> {
        self.observers.unsubscribe(id)
    }

    /// Body A.
    #[must_use]
    pub const fn primary(&self) -> &Body {
        &self.primary
    }

    /// Body B.
    #[must_use]
    pub const fn secondary(&self) -> &Body {
        &self.secondary
    }

    /// Reduced orbit state.
    #[must_use]
    pub const fn state(&self) -> &TwoBodyState {
        &self.state
    }

    /// Orbit integrator.
    #[must_use]
    pub const fn integrator(&self) -> &OrbitIntegrator {
        &self.integrator
    }

    /// Spin coupling.
    #[must_use]
    pub const fn spin(&self) -> &SpinCoupling {
        &self.spin
    }

    /// Realignment state machine.
    #[must_use]
    pub const fn transition(&self) -> &Transition {
        &self.transition
    }

    /// Units fixed at construction.
    #[must_use]
    pub const fn units(&self) -> &UnitSystem {
        &self.units
    }

    /// Configuration this simulation was built from.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Wall and simulation time.
    #[must_use]
    pub const fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Orbital period (∞ when unbound).
    #[must_use]
    pub fn orbital_period(&self) -> f64 {
        self.state.period()
    }

    /// Fraction of the period since the last resync.
    #[must_use]
    pub fn orbital_phase(&self) -> f64 {
        self.integrator.orbital_phase(&self.state)
    }

    /// Direction of the secondary's tidal bulge, degrees.
    #[must_use]
    pub fn bulge_angle(&self) -> f64 {
        wrap_degrees(self.secondary.rotation_angle() + self.oscillator.displacement())
    }

    /// Tidal force samples around the secondary's outline.
    #[must_use]
    pub fn tidal_samples(&self) -> Vec<TidalSample> {
        let radius = self.secondary.radius();
        self.sampler.sample_ring(
            self.primary.position,
            self.secondary.position,
            radius * self.config.tidal.bulge_ratio,
            radius,
            self.bulge_angle(),
            self.config.tidal.ring_samples,
        )
    }

    /// Tidal force at one world-space point on or near the secondary.
    #[must_use]
    pub fn tidal_sample_at(&self, point: Vec3) -> TidalSample {
        let centre_force = self.sampler.force_at(self.primary.position, self.secondary.position);
        self.sampler.sample(self.primary.position, point, centre_force)
    }

    /// World-space path of the secondary along the analytic orbit.
    ///
    /// Empty for unbound or radial orbits.
    #[must_use]
    pub fn orbit_path(&self, n: usize) -> Vec<Vec3> {
        let (anchor, share) = match self.state.reduction() {
            Reduction::FixedPrimary => (self.state.initial().position_a, 1.0),
            Reduction::CentreOfMass => (
                self.state.centre_of_mass_at(self.state.elapsed()),
                self.state.mass_a() / self.state.total_mass(),
            ),
        };
        self.state
            .orbit_path(n)
            .into_iter()
            .map(|p| anchor + p * share)
            .collect()
    }

    /// Whether the secondary's spin has locked to the orbit.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.spin.is_locked()
    }

    /// Whether the user (or the guard) has paused the run.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.user_paused
    }

    /// Violation that halted the run, if any.
    #[must_use]
    pub const fn halted(&self) -> Option<&OrbitJidokaViolation> {
        self.halted.as_ref()
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Headline numbers.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let period = self.state.period();
        let bounded = |x: f64| x.is_finite().then_some(x);
        RunSummary {
            name: self.config.name.clone(),
            ticks: self.clock.ticks(),
            sim_time: self.clock.sim_time(),
            kernel: self.integrator.active_kernel(&self.state).name().to_string(),
            orbital_period: bounded(period),
            eccentricity: self.state.eccentricity(),
            semi_major_axis: if self.state.is_bound() {
                bounded(self.state.semi_major_axis())
            } else {
                None
            },
            energy: self.state.energy(),
            energy_drift: self.state.energy_drift(),
            resyncs: self.integrator.resync_count(),
            primary_rotation_period: self.primary.rotation_period(),
            secondary_rotation_period: self.secondary.rotation_period(),
            secondary_rotation_angle: self.secondary.rotation_angle(),
            spin_mode: self.spin.mode(),
            locked: self.spin.is_locked(),
            discrete_cycles: self.spin.discrete().cycles(),
            paused: self.user_paused || self.integrator.is_paused(),
            halted: self.halted.as_ref().map(ToString::to_string),
        }
    }

    fn halt(&mut self, violation: OrbitJidokaViolation) -> SimError {
        error!(%violation, "jidoka halted the simulation");
        self.observers.notify(&SimEvent::Halted {
            reason: violation.to_string(),
        });
        let err = violation.to_error();
        self.halted = Some(violation);
        err
    }

    fn sync_bodies(&mut self) {
        let (pa, pb) = self.state.body_positions();
        let (va, vb) = self.state.body_velocities();
        self.primary.position = pa;
        self.primary.velocity = va;
        self.secondary.position = pb;
        self.secondary.velocity = vb;
    }

    fn advance_rotation(&mut self, scaled: f64) {
        if self.config.bodies.primary.rotating {
            let delta = self.primary.spin_increment(scaled);
            self.primary.increment_rotation(self.spin_sense * delta);
        }
        if self.config.bodies.secondary.rotating {
            let delta = self.secondary.spin_increment(scaled);
            self.secondary.increment_rotation(self.spin_sense * delta);
        }
    }

    fn couple_spin(&mut self, scaled: f64) -> SimResult<Option<PeriodChange>> {
        if !self.config.bodies.secondary.rotating {
            return Ok(None);
        }
        let change = self.spin.relax(&mut self.secondary, self.state.period(), scaled)?;
        if let Some(change) = change {
            self.announce(change);
        }
        Ok(change)
    }

    fn begin_realignment(&mut self) -> SimResult<()> {
        let start = self.secondary.rotation_angle();
        let toward = (self.primary.position - self.secondary.position).xz_angle().to_degrees();
        // The bulge is an axis; realign whichever end is nearer the primary.
        let target = if shortest_arc(start, toward).abs() > 90.0 {
            toward + 180.0
        } else {
            toward
        };
        self.integrator.pause();
        self.transition.start(start, target, self.config.spin.timings())?;
        debug!(start, target, cycle = self.spin.discrete().cycles(), "discrete cap reached");
        self.observers.notify(&SimEvent::TransitionStarted { start, target });
        Ok(())
    }

    fn finish_realignment(&mut self) -> SimResult<Option<PeriodChange>> {
        let angle = self.secondary.rotation_angle();
        let change = self.close_cycle()?;
        if !self.user_paused {
            self.integrator.resume();
        }
        self.observers.notify(&SimEvent::TransitionFinished { angle });
        Ok(change)
    }

    fn close_cycle(&mut self) -> SimResult<Option<PeriodChange>> {
        let change = self.spin.complete_cycle(&mut self.secondary, self.state.period())?;
        if let Some(change) = change {
            self.announce(change);
        }
        Ok(change)
    }

    fn announce(&mut self, change: PeriodChange) {
        self.observers.notify(&SimEvent::RotationPeriodChanged {
            body: BodyId::Secondary,
            old: change.old,
            new: change.new,
        });
        if change.locked {
            info!(period = change.new, "secondary tidally locked");
            self.observers.notify(&SimEvent::SpinLocked { period: change.new });
        }
    }
}

/// +1 for an orbit turning +X toward +Z (angular momentum along −Y).
fn spin_sense_of(state: &TwoBodyState) -> f64 {
    let l_y = state.angular_momentum().y;
    if l_y > 0.0 {
        -1.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BodyConfig, UnitsConfig};
    use crate::observer::EventLog;
    use crate::orbit::integrator::KernelChoice;
    use std::sync::mpsc;

    fn moon_config(mode: SpinMode) -> SimConfig {
        // G = 1, Earth pinned, Moon on a circular orbit of period 2π·60^1.5.
        let d = 60.0;
        let v = (1.0_f64 / d).sqrt();
        let mut config = SimConfig::builder()
            .units(UnitsConfig::natural(1.0))
            .reduction(Reduction::FixedPrimary)
            .primary(BodyConfig::at([0.0; 3], 1.0, 1.0).spinning(1.0))
            .secondary(BodyConfig::at([d, 0.0, 0.0], 0.0123, 0.27).moving([0.0, 0.0, v]).spinning(500.0))
            .spin_mode(mode)
            .build();
        config.spin.max_step_angle = 45.0;
        config
    }

    fn period_of(config: &SimConfig) -> f64 {
        std::f64::consts::TAU * config.bodies.secondary.position[0].powf(1.5)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = moon_config(SpinMode::Free);
        config.bodies.secondary.mass = 0.0;
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn test_tick_moves_secondary_and_spins() {
        let mut sim = Simulation::new(moon_config(SpinMode::Free)).expect("sim");
        let before = sim.secondary().position;
        let report = sim.tick(1.0).expect("tick");
        assert!(!report.skipped);
        assert!((sim.secondary().position - before).magnitude() > 0.0);
        // Orbit turns +X toward +Z, spin follows.
        assert!(sim.secondary().position.z > 0.0);
        assert!((sim.secondary().rotation_angle() - 360.0 / 500.0).abs() < 1e-12);
        assert!((sim.primary().rotation_angle() - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_tick_rejects_bad_dt() {
        let mut sim = Simulation::new(moon_config(SpinMode::Free)).expect("sim");
        assert!(sim.tick(-1.0).is_err());
        assert!(sim.tick(f64::NAN).is_err());
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut sim = Simulation::new(moon_config(SpinMode::Free)).expect("sim");
        sim.pause();
        let before = sim.secondary().clone();
        let report = sim.tick(5.0).expect("tick");
        assert!(report.skipped);
        assert_eq!(sim.secondary(), &before);
        sim.resume();
        assert!(!sim.tick(1.0).expect("tick").skipped);
    }

    #[test]
    fn test_time_scale_multiplies_motion() {
        let mut slow = Simulation::new(moon_config(SpinMode::Free)).expect("sim");
        let mut fast = Simulation::new(moon_config(SpinMode::Free)).expect("sim");
        fast.set_time_scale(2.0).expect("scale");
        slow.tick(2.0).expect("tick");
        fast.tick(1.0).expect("tick");
        assert!((slow.secondary().position - fast.secondary().position).magnitude() < 1e-9);
        assert!(fast.set_time_scale(-1.0).is_err());
    }

    #[test]
    fn test_continuous_mode_locks_and_notifies() {
        let config = moon_config(SpinMode::Continuous);
        let period = period_of(&config);
        let mut sim = Simulation::new(config).expect("sim");
        let (tx, rx) = mpsc::channel();
        sim.subscribe(Box::new(tx));

        for _ in 0..200_000 {
            sim.tick(1.0).expect("tick");
            if sim.is_locked() {
                break;
            }
        }
        assert!(sim.is_locked());
        assert!((sim.secondary().rotation_period() - period).abs() < 1e-6);
        let events: Vec<SimEvent> = rx.try_iter().collect();
        assert!(events.iter().any(|e| matches!(e, SimEvent::SpinLocked { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, SimEvent::RotationPeriodChanged { body: BodyId::Secondary, .. })));
    }

    #[test]
    fn test_discrete_mode_pauses_for_realignment() {
        let config = moon_config(SpinMode::Discrete);
        let period = period_of(&config);
        let mut sim = Simulation::new(config).expect("sim");
        let (tx, rx) = mpsc::channel();
        sim.subscribe(Box::new(tx));
        // One tick sweeps 60° of orbit at this time scale.
        sim.set_time_scale(period / 6.0).expect("scale");

        let report = sim.tick(1.0).expect("tick");
        assert!(report.realignment_started);
        assert!(sim.transition().is_active());
        let toward = (sim.primary().position - sim.secondary().position).xz_angle().to_degrees();

        let position = sim.secondary().position;
        let report = sim.tick(0.1).expect("tick");
        assert!(report.skipped);
        assert_eq!(sim.secondary().position, position);

        let mut finished = false;
        for _ in 0..100 {
            if sim.tick(0.1).expect("tick").realignment_finished {
                finished = true;
                break;
            }
        }
        assert!(finished);
        assert!(!sim.transition().is_active());
        assert_eq!(sim.spin().discrete().cycles(), 1);
        let factor = sim.spin().period_factor().expect("bound orbit").factor();
        assert!((sim.secondary().rotation_period() - factor * period).abs() < 1e-9);

        // The bulge ended on the line to the primary, on the nearer end.
        let events: Vec<SimEvent> = rx.try_iter().collect();
        let target = events
            .iter()
            .find_map(|e| match e {
                SimEvent::TransitionStarted { start, target } => {
                    assert!(shortest_arc(*start, *target).abs() <= 90.0 + 1e-9);
                    Some(*target)
                }
                _ => None,
            })
            .expect("started");
        let arc = shortest_arc(target, toward).abs();
        assert!(arc < 1e-6 || (arc - 180.0).abs() < 1e-6, "arc {arc}");
        let landed = events
            .iter()
            .find_map(|e| match e {
                SimEvent::TransitionFinished { angle } => Some(*angle),
                _ => None,
            })
            .expect("finished");
        assert!(shortest_arc(landed, target).abs() < 1e-6);
    }

    #[test]
    fn test_reset_cancels_transition_with_commit() {
        let config = moon_config(SpinMode::Discrete);
        let period = period_of(&config);
        let mut sim = Simulation::new(config).expect("sim");
        let log = std::rc::Rc::new(std::cell::RefCell::new(EventLog::default()));
        let sink = std::rc::Rc::clone(&log);
        sim.subscribe(Box::new(move |e: &SimEvent| sink.borrow_mut().record(e.clone())));
        sim.set_time_scale(period / 6.0).expect("scale");
        sim.tick(1.0).expect("tick");
        assert!(sim.transition().is_active());

        sim.reset().expect("reset");
        assert!(!sim.transition().is_active());
        assert_eq!(sim.observer_count(), 1);
        assert!((sim.clock().time_scale() - period / 6.0).abs() < 1e-9);
        assert!((sim.secondary().rotation_period() - 500.0).abs() < f64::EPSILON);

        let events = log.borrow();
        let kinds: Vec<&SimEvent> = events.events().iter().collect();
        assert!(kinds.iter().any(|e| matches!(
            e,
            SimEvent::TransitionCancelled {
                policy: CancelPolicy::CommitTarget,
                ..
            }
        )));
        assert!(matches!(kinds.last(), Some(SimEvent::Reset)));
    }

    #[test]
    fn test_cancel_revert_restores_start_angle() {
        let mut config = moon_config(SpinMode::Discrete);
        config.spin.cancel_policy = CancelPolicy::RevertToStart;
        let period = period_of(&config);
        let mut sim = Simulation::new(config).expect("sim");
        sim.set_time_scale(period / 6.0).expect("scale");
        sim.tick(1.0).expect("tick");
        let start = sim.secondary().rotation_angle();
        sim.tick(1.0).expect("tick");

        let angle = sim.cancel_transition().expect("cancel").expect("was running");
        assert!((wrap_degrees(angle) - start).abs() < 1e-9);
        assert!((sim.secondary().rotation_angle() - start).abs() < 1e-9);
        assert_eq!(sim.spin().discrete().cycles(), 0);
        assert!(!sim.integrator().is_paused());
    }

    #[test]
    fn test_tidal_samples_follow_secondary() {
        let sim = Simulation::new(moon_config(SpinMode::Free)).expect("sim");
        let samples = sim.tidal_samples();
        assert_eq!(samples.len(), sim.config().tidal.ring_samples);
        for sample in &samples {
            let offset = sample.point - sim.secondary().position;
            assert!(offset.magnitude() <= 0.27 * 1.2 + 1e-9);
        }
        let near = sim.tidal_sample_at(sim.secondary().position - Vec3::X * 0.27);
        assert!(near.force.x < 0.0);
    }

    #[test]
    fn test_orbit_path_is_circle_about_primary() {
        let sim = Simulation::new(moon_config(SpinMode::Free)).expect("sim");
        let path = sim.orbit_path(16);
        assert_eq!(path.len(), 16);
        for p in path {
            assert!((p.magnitude() - 60.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_grab_and_release_bulge() {
        let mut sim = Simulation::new(moon_config(SpinMode::Free)).expect("sim");
        sim.grab_bulge(20.0).expect("grab");
        assert!((sim.bulge_angle() - 20.0).abs() < 1e-9);
        assert!(sim.grab_bulge(f64::NAN).is_err());
        sim.release_bulge();
        for _ in 0..2_000 {
            sim.tick(0.01).expect("tick");
        }
        let rest = sim.secondary().rotation_angle();
        assert!(shortest_arc(rest, sim.bulge_angle()).abs() < 1e-2);
    }

    #[test]
    fn test_set_secondary_period_checks_floor() {
        let mut sim = Simulation::new(moon_config(SpinMode::Continuous)).expect("sim");
        assert!(sim.set_secondary_rotation_period(0.0).is_err());
        sim.set_secondary_rotation_period(42.0).expect("period");
        assert!((sim.secondary().rotation_period() - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unsubscribe_stops_events() {
        let mut sim = Simulation::new(moon_config(SpinMode::Free)).expect("sim");
        let (tx, rx) = mpsc::channel();
        let id = sim.subscribe(Box::new(tx));
        assert!(sim.unsubscribe(id).is_some());
        sim.pause();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reset_keeps_observers_and_time_scale() {
        let mut sim = Simulation::new(moon_config(SpinMode::Continuous)).expect("sim");
        let (tx, rx) = mpsc::channel();
        sim.subscribe(Box::new(tx));
        sim.set_time_scale(3.0).expect("scale");
        sim.tick(1.0).expect("tick");
        sim.reset().expect("reset");
        assert_eq!(sim.observer_count(), 1);
        assert!((sim.clock().time_scale() - 3.0).abs() < f64::EPSILON);
        assert_eq!(sim.clock().ticks(), 0);
        assert!(matches!(rx.try_iter().last(), Some(SimEvent::Reset)));
    }

    #[test]
    fn test_close_encounter_pauses_instead_of_halting() {
        let mut config = moon_config(SpinMode::Free);
        config.integrator.kernel = KernelChoice::Cartesian;
        config.jidoka.close_encounter_threshold = 1e3;
        config.jidoka.max_warnings_before_pause = 1;
        let mut sim = Simulation::new(config).expect("sim");
        let report = sim.tick(1.0).expect("tick");
        assert!(report.guard_paused);
        assert!(sim.is_paused());
        assert!(sim.halted().is_none());
    }

    #[test]
    fn test_non_finite_orbit_halts_until_reset() {
        let mut config = moon_config(SpinMode::Free);
        config.integrator.kernel = KernelChoice::Cartesian;
        let mut sim = Simulation::new(config).expect("sim");
        let (tx, rx) = mpsc::channel();
        sim.subscribe(Box::new(tx));
        // Far past what the Euler substeps can resolve.
        sim.set_time_scale(1e200).expect("scale");

        let err = sim.tick(1.0 / 60.0).expect_err("blown-up orbit");
        assert!(matches!(err, SimError::NonFiniteValue { .. }), "{err}");
        assert!(sim.halted().is_some());
        assert!(rx.try_iter().any(|e| matches!(e, SimEvent::Halted { .. })));
        assert!(sim.summary().halted.is_some());

        // Sticky: lowering the scale does not revive the run.
        sim.set_time_scale(1.0).expect("scale");
        assert!(sim.tick(1.0 / 60.0).is_err());

        sim.reset().expect("reset");
        assert!(sim.halted().is_none());
        assert_eq!(sim.observer_count(), 1);
        sim.tick(1.0 / 60.0).expect("tick after reset");
        assert!(sim.state().relative_position().is_finite());
    }

    #[test]
    fn test_bulge_survives_large_time_scale() {
        let mut sim = Simulation::new(SimConfig::default()).expect("sim");
        sim.set_time_scale(600.0).expect("scale");
        sim.grab_bulge(20.0).expect("grab");
        sim.release_bulge();
        for _ in 0..60 {
            sim.tick(1.0 / 60.0).expect("tick");
            assert!(sim.bulge_angle().is_finite());
        }
        let offset = shortest_arc(sim.secondary().rotation_angle(), sim.bulge_angle());
        assert!(offset.abs() < 1e-6, "offset {offset}");
        let samples = sim.tidal_samples();
        assert!(!samples.is_empty());
        assert!(samples.iter().all(|s| s.point.is_finite() && s.force.is_finite()));
    }

    #[test]
    fn test_summary_reports_state() {
        let mut sim = Simulation::from_scenario(Scenario::LunarRatio).expect("sim");
        let summary = sim.run(10, 1.0).expect("run");
        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.kernel, "cartesian");
        assert!(summary.orbital_period.is_some());
        assert!(!summary.locked);
        let json = serde_json::to_string(&summary).expect("json");
        assert!(json.contains("\"spin_mode\":\"free\""));
    }
}
