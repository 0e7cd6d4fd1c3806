//! Tidal locking E2E tests.
//!
//! Drives the full [`Simulation`] the way a host would: fixed ticks,
//! observers, pause/reset, bulge drags.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc;

use tidelock::prelude::*;
use tidelock::transition::shortest_arc;

fn record(sim: &mut Simulation) -> Rc<RefCell<EventLog>> {
    let log = Rc::new(RefCell::new(EventLog::default()));
    let sink = Rc::clone(&log);
    sim.subscribe(Box::new(move |e: &SimEvent| sink.borrow_mut().record(e.clone())));
    log
}

/// TL-1: Continuous relaxation reaches the orbital period without ringing
///
/// Hypothesis to falsify: the spin overshoots and oscillates around lock.
#[test]
fn tl1_continuous_relaxation_locks_monotonically() {
    let mut sim = Simulation::from_scenario(Scenario::EarthMoon).expect("preset");
    let (tx, rx) = mpsc::channel();
    sim.subscribe(Box::new(tx));
    let orbital = sim.orbital_period();
    let start_gap = (sim.secondary().rotation_period() - orbital).abs();
    assert!(start_gap > 1.0);

    let mut ticks = 0;
    while !sim.is_locked() {
        sim.tick(1.0).expect("tick");
        ticks += 1;
        assert!(ticks < 100_000, "TL-1 FAILED: never locked");
    }
    assert!((sim.secondary().rotation_period() - orbital).abs() < 1e-9);

    let periods: Vec<f64> = rx
        .try_iter()
        .filter_map(|e| match e {
            SimEvent::RotationPeriodChanged {
                body: BodyId::Secondary,
                new,
                ..
            } => Some(new),
            _ => None,
        })
        .collect();
    assert!(!periods.is_empty());
    let mut gap = start_gap;
    let mut sign_flips = 0;
    let mut sign = 0.0_f64;
    for p in periods {
        let next = (p - orbital).abs();
        assert!(next <= gap + 1e-12, "TL-1 FAILED: gap grew from {gap} to {next}");
        gap = next;
        let s = (p - orbital).signum();
        if next > 0.0 && sign != 0.0 && s != sign {
            sign_flips += 1;
        }
        if next > 0.0 {
            sign = s;
        }
    }
    assert!(sign_flips <= 1);
}

/// TL-2: Discrete locking converges on the orbital period
#[test]
fn tl2_discrete_locking_converges() {
    let mut sim = Simulation::from_scenario(Scenario::TidalLockingAnimation).expect("preset");
    let log = record(&mut sim);
    let orbital = sim.orbital_period();
    let dt = 1.0 / 60.0;

    let mut ticks = 0;
    while !sim.is_locked() {
        sim.tick(dt).expect("tick");
        ticks += 1;
        assert!(ticks < 50_000, "TL-2 FAILED: never locked");
    }
    assert!((sim.secondary().rotation_period() - orbital).abs() / orbital < 1e-9);
    assert!(sim.spin().discrete().cycles() >= 2);

    let events = log.borrow();
    let started = events
        .events()
        .iter()
        .filter(|e| matches!(e, SimEvent::TransitionStarted { .. }))
        .count();
    let finished = events
        .events()
        .iter()
        .filter(|e| matches!(e, SimEvent::TransitionFinished { .. }))
        .count();
    assert_eq!(started, finished);
    assert!(events.events().iter().any(|e| matches!(e, SimEvent::SpinLocked { .. })));
}

/// TL-3: The orbit stands still while the bulge realigns
#[test]
fn tl3_orbit_paused_during_realignment() {
    let mut sim = Simulation::from_scenario(Scenario::TidalLockingAnimation).expect("preset");
    let dt = 1.0 / 60.0;
    loop {
        if sim.tick(dt).expect("tick").realignment_started {
            break;
        }
    }
    let position = sim.secondary().position;
    let mut held = 0;
    while sim.transition().is_active() {
        let report = sim.tick(dt).expect("tick");
        if report.realignment_finished {
            break;
        }
        assert!(report.skipped);
        assert_eq!(sim.secondary().position, position);
        held += 1;
    }
    // 0.5 s delay + 1.4 s slerp + 1.5 s hold at 60 Hz.
    assert!((200..=205).contains(&held), "held for {held} ticks");
}

/// TL-4: Reset mid-realignment leaves a committed, well-defined angle
#[test]
fn tl4_reset_during_realignment() {
    let mut sim = Simulation::from_scenario(Scenario::TidalLockingAnimation).expect("preset");
    let log = record(&mut sim);
    let initial_period = sim.secondary().rotation_period();
    let dt = 1.0 / 60.0;
    while !sim.tick(dt).expect("tick").realignment_started {}
    for _ in 0..60 {
        sim.tick(dt).expect("tick");
    }
    assert!(sim.transition().is_active());

    sim.reset().expect("reset");
    assert!(!sim.transition().is_active());
    assert!(!sim.integrator().is_paused());
    assert!((sim.secondary().rotation_period() - initial_period).abs() < f64::EPSILON);

    let events = log.borrow();
    let (started, cancelled) = events.events().iter().fold((None, None), |acc, e| match e {
        SimEvent::TransitionStarted { target, .. } => (Some(*target), acc.1),
        SimEvent::TransitionCancelled { angle, policy } => {
            assert_eq!(*policy, CancelPolicy::CommitTarget);
            (acc.0, Some(*angle))
        }
        _ => acc,
    });
    let target = started.expect("started");
    let angle = cancelled.expect("cancelled");
    assert!(shortest_arc(angle, target).abs() < 1e-9);
    assert!(matches!(events.events().last(), Some(SimEvent::Reset)));
}

/// TL-5: Tidal samples show the two-bulge pattern
///
/// Hypothesis to falsify: the near and far sides are not both stretched
/// away from the secondary's centre.
#[test]
fn tl5_two_bulge_pattern() {
    let sim = Simulation::from_scenario(Scenario::TidalLockingAnimation).expect("preset");
    let centre = sim.secondary().position;
    let toward_primary = (sim.primary().position - centre).normalize();
    let radius = sim.secondary().radius();

    let near = sim.tidal_sample_at(centre + toward_primary * radius);
    let far = sim.tidal_sample_at(centre - toward_primary * radius);
    let near_radial = near.force.dot(&toward_primary);
    let far_radial = far.force.dot(&toward_primary);
    assert!(near_radial > 0.0, "near side pulled toward the primary");
    assert!(far_radial < 0.0, "far side left behind");
    assert!(near_radial.abs() > far_radial.abs());

    let ring = sim.tidal_samples();
    assert_eq!(ring.len(), sim.config().tidal.ring_samples);
    let first = ring.first().expect("ring");
    let last = ring.last().expect("ring");
    assert!((first.point - last.point).magnitude() < 1e-9);
}

/// TL-6: Pause and resume notify and freeze the system
#[test]
fn tl6_pause_resume_round_trip() {
    let mut sim = Simulation::from_scenario(Scenario::EarthMoon).expect("preset");
    let log = record(&mut sim);
    sim.tick(0.5).expect("tick");
    sim.pause();
    let frozen = (sim.secondary().clone(), sim.primary().clone());
    for _ in 0..10 {
        assert!(sim.tick(0.5).expect("tick").skipped);
    }
    assert_eq!((sim.secondary().clone(), sim.primary().clone()), frozen);
    sim.resume();
    assert!(!sim.tick(0.5).expect("tick").skipped);

    let events = log.borrow();
    let kinds: Vec<_> = events
        .events()
        .iter()
        .filter(|e| matches!(e, SimEvent::Paused | SimEvent::Resumed))
        .collect();
    assert_eq!(kinds.len(), 2);
}

/// TL-7: A dragged bulge springs back to its rest line
#[test]
fn tl7_bulge_drag_settles() {
    let mut sim = Simulation::from_scenario(Scenario::EarthMoon).expect("preset");
    sim.set_time_scale(0.0).expect("scale");
    sim.grab_bulge(30.0).expect("grab");
    for _ in 0..10 {
        sim.tick(0.1).expect("tick");
    }
    // Held bulges do not move.
    assert!((shortest_arc(sim.secondary().rotation_angle(), sim.bulge_angle()) - 30.0).abs() < 1e-9);

    sim.set_time_scale(1.0).expect("scale");
    sim.release_bulge();
    for _ in 0..3_000 {
        sim.tick(0.01).expect("tick");
    }
    assert!(shortest_arc(sim.secondary().rotation_angle(), sim.bulge_angle()).abs() < 1e-3);
}

/// TL-8: Every preset builds and runs clean for a few seconds
#[test]
fn tl8_presets_run() {
    for scenario in Scenario::ALL {
        let mut sim = Simulation::from_scenario(scenario).expect("preset");
        let summary = sim.run(180, 1.0 / 60.0).expect("run");
        assert_eq!(summary.ticks, 180, "{}", scenario.name());
        assert!(summary.halted.is_none(), "{}", scenario.name());
        assert!(summary.energy_drift < 0.05, "{} drift {}", scenario.name(), summary.energy_drift);
    }
}
