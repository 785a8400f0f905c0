//! Cancellation coordinator
//!
//! Tracks each pump's lifecycle and propagates termination: when one
//! pump stops, the counterpart's signal is raised iff it is still
//! running; an external interrupt raises both signals unconditionally.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::pump::{PumpDirection, PumpOutcome};

/// Lifecycle state of one pump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    Idle,
    Running,
    Stopped(PumpOutcome),
}

/// Aggregate session outcome, the worst across both pumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Every started pump stopped on end of stream
    Clean,
    /// At least one pump stopped on a transport failure
    Faulted,
    /// An external interrupt ended the session
    Interrupted,
}

#[derive(Debug, Clone, Copy)]
struct States {
    inbound: PumpState,
    outbound: PumpState,
}

impl States {
    fn get(&self, direction: PumpDirection) -> PumpState {
        match direction {
            PumpDirection::Inbound => self.inbound,
            PumpDirection::Outbound => self.outbound,
        }
    }

    fn set(&mut self, direction: PumpDirection, state: PumpState) {
        match direction {
            PumpDirection::Inbound => self.inbound = state,
            PumpDirection::Outbound => self.outbound = state,
        }
    }
}

/// Coordinates termination between the two pumps
///
/// One cancellation token per pump; both state transitions and the
/// counterpart check happen under a single lock, so a stop can never
/// race the counterpart's own stop into a missed or spurious signal.
pub struct Coordinator {
    states: Mutex<States>,
    inbound_cancel: CancellationToken,
    outbound_cancel: CancellationToken,
    interrupted: AtomicBool,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(States {
                inbound: PumpState::Idle,
                outbound: PumpState::Idle,
            }),
            inbound_cancel: CancellationToken::new(),
            outbound_cancel: CancellationToken::new(),
            interrupted: AtomicBool::new(false),
        }
    }

    /// The termination signal a pump selects on
    pub fn token(&self, direction: PumpDirection) -> CancellationToken {
        match direction {
            PumpDirection::Inbound => self.inbound_cancel.clone(),
            PumpDirection::Outbound => self.outbound_cancel.clone(),
        }
    }

    /// Mark a pump as running
    pub fn start(&self, direction: PumpDirection) {
        let mut states = self.states.lock().unwrap();
        states.set(direction, PumpState::Running);
    }

    /// Record a pump's stop and cancel the counterpart iff it still runs
    pub fn finish(&self, direction: PumpDirection, outcome: PumpOutcome) {
        let mut states = self.states.lock().unwrap();
        states.set(direction, PumpState::Stopped(outcome));

        let counterpart = direction.counterpart();
        if states.get(counterpart) == PumpState::Running {
            debug!(
                "{} pump stopped ({:?}), cancelling {} pump",
                direction, outcome, counterpart
            );
            self.token(counterpart).cancel();
        }
    }

    /// External interrupt: raise both termination signals unconditionally
    ///
    /// Idempotent and safe from any task.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        self.inbound_cancel.cancel();
        self.outbound_cancel.cancel();
    }

    pub fn state(&self, direction: PumpDirection) -> PumpState {
        self.states.lock().unwrap().get(direction)
    }

    /// Worst outcome across both pumps
    pub fn status(&self) -> SessionStatus {
        let states = self.states.lock().unwrap();
        let errored = [states.inbound, states.outbound]
            .iter()
            .any(|s| matches!(s, PumpState::Stopped(PumpOutcome::Error)));

        if errored {
            SessionStatus::Faulted
        } else if self.interrupted.load(Ordering::SeqCst) {
            SessionStatus::Interrupted
        } else {
            SessionStatus::Clean
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_cancels_running_counterpart() {
        let coordinator = Coordinator::new();
        coordinator.start(PumpDirection::Inbound);
        coordinator.start(PumpDirection::Outbound);

        coordinator.finish(PumpDirection::Outbound, PumpOutcome::Eof);

        assert!(coordinator.token(PumpDirection::Inbound).is_cancelled());
        assert_eq!(
            coordinator.state(PumpDirection::Outbound),
            PumpState::Stopped(PumpOutcome::Eof)
        );
    }

    #[test]
    fn test_finish_ignores_idle_counterpart() {
        let coordinator = Coordinator::new();
        coordinator.start(PumpDirection::Inbound);

        // The outbound pump was never started (degenerate route plan)
        coordinator.finish(PumpDirection::Inbound, PumpOutcome::Eof);

        assert!(!coordinator.token(PumpDirection::Outbound).is_cancelled());
        assert_eq!(coordinator.status(), SessionStatus::Clean);
    }

    #[test]
    fn test_finish_ignores_stopped_counterpart() {
        let coordinator = Coordinator::new();
        coordinator.start(PumpDirection::Inbound);
        coordinator.start(PumpDirection::Outbound);

        coordinator.finish(PumpDirection::Inbound, PumpOutcome::Eof);
        assert!(coordinator.token(PumpDirection::Outbound).is_cancelled());

        // The second stop must not raise anything further
        coordinator.finish(PumpDirection::Outbound, PumpOutcome::Cancelled);
        assert_eq!(coordinator.status(), SessionStatus::Clean);
    }

    #[test]
    fn test_interrupt_cancels_both_and_marks_status() {
        let coordinator = Coordinator::new();
        coordinator.start(PumpDirection::Inbound);
        coordinator.start(PumpDirection::Outbound);

        coordinator.interrupt();
        coordinator.interrupt();

        assert!(coordinator.token(PumpDirection::Inbound).is_cancelled());
        assert!(coordinator.token(PumpDirection::Outbound).is_cancelled());

        coordinator.finish(PumpDirection::Inbound, PumpOutcome::Cancelled);
        coordinator.finish(PumpDirection::Outbound, PumpOutcome::Cancelled);
        assert_eq!(coordinator.status(), SessionStatus::Interrupted);
    }

    #[test]
    fn test_transport_failure_dominates_status() {
        let coordinator = Coordinator::new();
        coordinator.start(PumpDirection::Inbound);
        coordinator.start(PumpDirection::Outbound);

        coordinator.finish(PumpDirection::Inbound, PumpOutcome::Error);
        coordinator.finish(PumpDirection::Outbound, PumpOutcome::Cancelled);

        assert_eq!(coordinator.status(), SessionStatus::Faulted);
    }
}
