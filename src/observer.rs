//! Notifications from the simulation to its host.
//!
//! Hosts register a [`SimObserver`] on the [`crate::engine::Simulation`]
//! and get an [`ObserverId`] back; dropping the subscription is an explicit
//! call with that id. Closures and `mpsc::Sender`s are observers too.

use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

use crate::error::{SimError, SimResult};
use crate::transition::CancelPolicy;

/// Which body an event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BodyId {
    /// Body A, the primary.
    Primary,
    /// Body B, the secondary.
    Secondary,
}

/// Something the host may want to react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SimEvent {
    /// A body's spin period changed.
    RotationPeriodChanged { body: BodyId, old: f64, new: f64 },
    /// The secondary's spin reached the orbital period.
    SpinLocked { period: f64 },
    /// The orbit snapped back to its initial conditions.
    Resynced { count: u64 },
    /// Orbital motion paused.
    Paused,
    /// Orbital motion resumed.
    Resumed,
    /// Everything returned to the configured initial state.
    Reset,
    /// A bulge realignment began.
    TransitionStarted { start: f64, target: f64 },
    /// A bulge realignment completed.
    TransitionFinished { angle: f64 },
    /// A bulge realignment was cut short.
    TransitionCancelled { angle: f64, policy: CancelPolicy },
    /// The guard stopped the run.
    Halted { reason: String },
}

/// Receives [`SimEvent`]s.
pub trait SimObserver {
    /// Called synchronously from inside the tick that produced `event`.
    fn on_event(&mut self, event: &SimEvent);
}

impl<F> SimObserver for F
where
    F: FnMut(&SimEvent),
{
    fn on_event(&mut self, event: &SimEvent) {
        self(event);
    }
}

impl SimObserver for Sender<SimEvent> {
    fn on_event(&mut self, event: &SimEvent) {
        // A hung-up receiver just stops listening.
        let _ = self.send(event.clone());
    }
}

/// Handle returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registered observers in subscription order.
#[derive(Default)]
pub struct Observers {
    next_id: u64,
    entries: Vec<(ObserverId, Box<dyn SimObserver>)>,
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl Observers {
    /// Register an observer.
    pub fn subscribe(&mut self, observer: Box<dyn SimObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    /// Remove an observer, handing it back. `None` for unknown ids.
    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn SimObserver>> {
        let index = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.remove(index).1)
    }

    /// Deliver `event` to every observer.
    pub fn notify(&mut self, event: &SimEvent) {
        for (_, observer) in &mut self.entries {
            observer.on_event(event);
        }
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Observer that keeps every event, for headless runs and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    /// Recorded events.
    #[must_use]
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Record one event.
    pub fn record(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Drop everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Export as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn export_json(&self) -> SimResult<String> {
        serde_json::to_string_pretty(&self.events)
            .map_err(|e| SimError::serialization(format!("Event log JSON export: {e}")))
    }
}

impl SimObserver for EventLog {
    fn on_event(&mut self, event: &SimEvent) {
        self.record(event.clone());
    }
}
