//! Door state machine shared by the interior and entry doors.
//!
//! The rule table lives here once; both doors are instances. Accepted
//! transitions are queued in an outbox and drained by the engine into
//! [`LoopEvent::DoorStateChanged`](crate::events::LoopEvent) at the end of
//! the tick, so callers never need a handle to the event list.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::enums::{DoorId, DoorState, TransitionMode};
use crate::events::LoopEvent;

/// Result of a player interaction with a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractOutcome {
    Accepted,
    Rejected(&'static str),
}

impl InteractOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, InteractOutcome::Accepted)
    }
}

/// One accepted door transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorTransition {
    pub door: DoorId,
    pub old: DoorState,
    pub new: DoorState,
    pub reason: String,
    pub mode: TransitionMode,
}

impl From<DoorTransition> for LoopEvent {
    fn from(t: DoorTransition) -> Self {
        LoopEvent::DoorStateChanged {
            door: t.door,
            old: t.old,
            new: t.new,
            reason: t.reason,
            mode: t.mode,
        }
    }
}

/// A single door.
#[derive(Debug, Clone)]
pub struct DoorMachine {
    id: DoorId,
    state: DoorState,
    initial: DoorState,
    outbox: Vec<DoorTransition>,
}

impl DoorMachine {
    /// New door resting in `initial`. Resets return here.
    pub fn new(id: DoorId, initial: DoorState) -> Self {
        Self {
            id,
            state: initial,
            initial,
            outbox: Vec::new(),
        }
    }

    pub fn id(&self) -> DoorId {
        self.id
    }

    pub fn state(&self) -> DoorState {
        self.state
    }

    pub fn is_passable(&self) -> bool {
        self.state.is_passable()
    }

    // --- Player ---

    /// Door leaf click: Open <-> Closed. Locked and Broken refuse.
    pub fn interact_door(&mut self) -> InteractOutcome {
        match self.state {
            DoorState::Broken => {
                debug!(door = ?self.id, "door click ignored: broken");
                InteractOutcome::Rejected("door is broken")
            }
            DoorState::Locked => {
                debug!(door = ?self.id, "door click ignored: locked");
                InteractOutcome::Rejected("door is locked")
            }
            DoorState::Open => {
                self.set_state(DoorState::Closed, "player closed door", TransitionMode::Animated);
                InteractOutcome::Accepted
            }
            DoorState::Closed => {
                self.set_state(DoorState::Open, "player opened door", TransitionMode::Animated);
                InteractOutcome::Accepted
            }
        }
    }

    /// Handle click: Closed <-> Locked. Open and Broken refuse.
    pub fn interact_handle(&mut self) -> InteractOutcome {
        match self.state {
            DoorState::Broken => InteractOutcome::Rejected("door is broken"),
            DoorState::Open => InteractOutcome::Rejected("close the door before locking it"),
            DoorState::Closed => {
                self.set_state(DoorState::Locked, "player locked door", TransitionMode::Animated);
                InteractOutcome::Accepted
            }
            DoorState::Locked => {
                self.set_state(DoorState::Closed, "player unlocked door", TransitionMode::Animated);
                InteractOutcome::Accepted
            }
        }
    }

    // --- Intruder ---

    /// Returns true when the doorway ends up passable.
    pub fn try_open(&mut self, reason: &str) -> bool {
        match self.state {
            DoorState::Open | DoorState::Broken => true,
            DoorState::Closed => {
                self.set_state(DoorState::Open, reason, TransitionMode::Animated);
                true
            }
            DoorState::Locked => false,
        }
    }

    /// Locked -> Closed. Any other state refuses.
    pub fn try_unlock(&mut self, reason: &str) -> bool {
        if self.state != DoorState::Locked {
            return false;
        }
        self.set_state(DoorState::Closed, reason, TransitionMode::Animated);
        true
    }

    pub fn force_break(&mut self, reason: &str) {
        if self.state == DoorState::Broken {
            return;
        }
        self.set_state(DoorState::Broken, reason, TransitionMode::Animated);
    }

    // --- Scripted ---

    /// Bypasses every guard. Used for checkpoint capture/restore.
    pub fn force_set_for_rollback(&mut self, state: DoorState, reason: &str) {
        self.set_state(state, reason, TransitionMode::Instant);
    }

    /// Back to the configured resting state, without presentation.
    pub fn reset(&mut self) {
        self.set_state(self.initial, "loop reset", TransitionMode::Instant);
    }

    /// Take every transition accepted since the last drain.
    pub fn drain_transitions(&mut self) -> Vec<DoorTransition> {
        std::mem::take(&mut self.outbox)
    }

    fn set_state(&mut self, new: DoorState, reason: &str, mode: TransitionMode) {
        let old = self.state;
        if old == new {
            debug!(door = ?self.id, state = ?new, "door state change ignored: already there");
            return;
        }

        self.state = new;
        info!(door = ?self.id, ?old, ?new, ?mode, reason, "door state changed");
        self.outbox.push(DoorTransition {
            door: self.id,
            old,
            new,
            reason: reason.to_string(),
            mode,
        });
    }
}
