//! Catch director: holds the capture presentation, then hands the outcome
//! back to the engine (loop reset or checkpoint rollback).

use tracing::{debug, info};

use nightloop_core::enums::CatchKind;
use nightloop_core::events::LoopEvent;

#[derive(Debug, Clone, Copy, PartialEq)]
enum CatchState {
    Idle,
    Holding { kind: CatchKind, remaining: f64 },
    /// Outcome handed off; waits for the engine to confirm the new loop
    /// or the rollback before accepting another catch.
    Resolved,
}

#[derive(Debug, Clone)]
pub struct CatchDirector {
    hold_secs: f64,
    state: CatchState,
}

impl CatchDirector {
    pub fn new(hold_secs: f64) -> Self {
        Self {
            hold_secs,
            state: CatchState::Idle,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state != CatchState::Idle
    }

    /// Start a catch. Ignored while another catch is in progress.
    pub fn request(&mut self, kind: CatchKind, events: &mut Vec<LoopEvent>) -> bool {
        if self.is_busy() {
            debug!(?kind, "catch ignored: already busy");
            return false;
        }
        info!(?kind, "player caught");
        self.state = CatchState::Holding {
            kind,
            remaining: self.hold_secs,
        };
        events.push(LoopEvent::PlayerCaught { kind });
        true
    }

    /// Advance the hold. Returns the kind once, when the hold ends.
    pub fn tick(&mut self, dt: f64) -> Option<CatchKind> {
        let CatchState::Holding { kind, remaining } = self.state else {
            return None;
        };
        let remaining = remaining - dt;
        if remaining > 0.0 {
            self.state = CatchState::Holding { kind, remaining };
            return None;
        }
        self.state = CatchState::Resolved;
        Some(kind)
    }

    /// Accept catches again.
    pub fn clear(&mut self) {
        self.state = CatchState::Idle;
    }
}
