//! Time-loop kernel: loop clock, break-in timeline and the reset entry point.
//!
//! The kernel owns the [`LoopSession`] and the reset registry. It never
//! touches the ECS world directly; restoring registered objects and placing
//! the player go through a [`LoopHost`] supplied by the engine.
//!
//! Resets are deferred: [`LoopKernel::request_reset`] only latches the
//! request, and the new loop starts on the next [`LoopKernel::service_reset`]
//! (one tick later). The latch is held for a cooldown window after the new
//! loop starts, so bursts of requests collapse into one loop.

use std::fmt::Debug;

use rand::Rng;
use tracing::{debug, info, warn};

use nightloop_core::config::{BreakInConfig, ResetConfig};
use nightloop_core::enums::{BreakInMethod, BreakInPhase};
use nightloop_core::events::LoopEvent;
use nightloop_core::reset::ResetRegistry;
use nightloop_core::state::LoopView;
use nightloop_core::types::Pose;
use nightloop_core::CoreError;

/// World-side operations the kernel needs during a reset.
pub trait LoopHost {
    type Handle: Copy + Eq + Debug;

    /// Restore one registered object. False if the handle no longer resolves.
    fn restore(&mut self, handle: Self::Handle) -> bool;

    /// Put the player at the loop-start pose.
    fn place_player(&mut self, pose: Pose) -> Result<(), CoreError>;

    /// Emit whatever the restored objects queued during the broadcast.
    fn collect_events(&mut self, _events: &mut Vec<LoopEvent>) {}
}

/// Per-session loop state.
#[derive(Debug, Clone, Default)]
pub struct LoopSession {
    /// Seconds into the current loop.
    pub elapsed_secs: f64,
    pub loop_index: u32,
    pub break_in_deadline: f64,
    pub emergency_deadline: Option<f64>,
    pub phase: BreakInPhase,
    pub battery_removed: bool,
    pub reset_blocked: bool,
    pub scenario_blocked: bool,
    pub game_running: bool,
}

#[derive(Debug, Clone, Default)]
struct ResetLatch {
    held: bool,
    pending: Option<String>,
    cooldown_remaining: f64,
}

pub struct LoopKernel<H> {
    session: LoopSession,
    registry: ResetRegistry<H>,
    break_in: BreakInConfig,
    reset: ResetConfig,
    start_pose: Option<Pose>,
    latch: ResetLatch,
}

impl<H: Copy + Eq + Debug> LoopKernel<H> {
    /// New kernel with the game running and no loop started yet.
    pub fn new(break_in: BreakInConfig, reset: ResetConfig, start_pose: Option<Pose>) -> Self {
        Self {
            session: LoopSession {
                game_running: true,
                ..Default::default()
            },
            registry: ResetRegistry::new(),
            break_in,
            reset,
            start_pose,
            latch: ResetLatch::default(),
        }
    }

    pub fn session(&self) -> &LoopSession {
        &self.session
    }

    pub fn registry_mut(&mut self) -> &mut ResetRegistry<H> {
        &mut self.registry
    }

    pub fn reset_in_flight(&self) -> bool {
        self.latch.held
    }

    /// Ask for a new loop. Dropped (returns false) while resets are blocked
    /// or another reset is in flight.
    pub fn request_reset(&mut self, reason: &str) -> bool {
        if self.session.reset_blocked {
            info!(reason, "reset request dropped: resets blocked");
            return false;
        }
        if self.latch.held {
            debug!(reason, "reset request dropped: reset already in flight");
            return false;
        }

        info!(reason, "loop reset requested");
        self.latch.held = true;
        self.latch.pending = Some(reason.to_string());
        true
    }

    /// Start the loop requested on an earlier tick, if any.
    /// Returns true if a new loop started.
    pub fn service_reset<R, Host>(
        &mut self,
        host: &mut Host,
        rng: &mut R,
        events: &mut Vec<LoopEvent>,
    ) -> bool
    where
        R: Rng,
        Host: LoopHost<Handle = H>,
    {
        let Some(reason) = self.latch.pending.take() else {
            return false;
        };

        if self.session.reset_blocked {
            info!(reason = %reason, "pending reset cancelled: resets blocked");
            self.latch = ResetLatch::default();
            return false;
        }

        self.start_new_loop(host, rng, events);
        self.latch.cooldown_remaining = self.reset.cooldown_secs;
        true
    }

    /// Begin a loop immediately. Used for the first loop of a session and by
    /// [`service_reset`](Self::service_reset).
    pub fn start_new_loop<R, Host>(&mut self, host: &mut Host, rng: &mut R, events: &mut Vec<LoopEvent>)
    where
        R: Rng,
        Host: LoopHost<Handle = H>,
    {
        let s = &mut self.session;
        s.loop_index += 1;
        s.elapsed_secs = 0.0;
        s.battery_removed = false;
        s.phase = BreakInPhase::FirstAttempt;
        s.emergency_deadline = None;
        s.break_in_deadline = rng.gen_range(self.break_in.min_secs..self.break_in.max_secs);

        let report = self.registry.broadcast_reset(|handle| host.restore(handle));
        host.collect_events(events);

        match self.start_pose {
            Some(pose) => {
                let mut lifted = pose;
                lifted.position = pose.position.raised(self.reset.spawn_height_offset);
                if let Err(err) = host.place_player(lifted) {
                    warn!(%err, "player not repositioned");
                }
            }
            None => warn!("player not repositioned: no loop start pose"),
        }

        info!(
            loop_index = self.session.loop_index,
            break_in_deadline = self.session.break_in_deadline,
            restored = report.restored,
            "loop started"
        );
        events.push(LoopEvent::LoopStarted {
            loop_index: self.session.loop_index,
        });
    }

    /// Advance the loop clock by `dt` and evaluate the break-in timeline.
    pub fn tick<R: Rng>(&mut self, dt: f64, rng: &mut R, events: &mut Vec<LoopEvent>) {
        self.tick_cooldown(dt);

        if !self.session.game_running {
            return;
        }
        self.session.elapsed_secs += dt;

        if self.session.scenario_blocked {
            return;
        }
        self.evaluate_break_in(rng, events);
    }

    fn tick_cooldown(&mut self, dt: f64) {
        if !self.latch.held || self.latch.pending.is_some() {
            return;
        }
        self.latch.cooldown_remaining -= dt;
        if self.latch.cooldown_remaining <= 0.0 {
            debug!("reset latch released");
            self.latch = ResetLatch::default();
        }
    }

    fn evaluate_break_in<R: Rng>(&mut self, rng: &mut R, events: &mut Vec<LoopEvent>) {
        let s = &mut self.session;
        match s.phase {
            BreakInPhase::FirstAttempt if s.elapsed_secs >= s.break_in_deadline => {
                if !s.battery_removed {
                    s.phase = BreakInPhase::Done;
                    info!(elapsed = s.elapsed_secs, "break-in succeeded on first attempt");
                    events.push(LoopEvent::BreakInSucceeded {
                        method: BreakInMethod::Primary,
                    });
                } else {
                    let delay = rng
                        .gen_range(self.break_in.emergency_min_secs..self.break_in.emergency_max_secs);
                    let deadline = s.elapsed_secs + delay;
                    s.emergency_deadline = Some(deadline);
                    s.phase = BreakInPhase::WaitingEmergencyKey;
                    info!(elapsed = s.elapsed_secs, deadline, "break-in delayed: battery removed");
                    events.push(LoopEvent::BreakInDelayed { deadline });
                }
            }
            BreakInPhase::WaitingEmergencyKey => {
                if s.emergency_deadline.is_some_and(|d| s.elapsed_secs >= d) {
                    s.phase = BreakInPhase::Done;
                    info!(elapsed = s.elapsed_secs, "break-in succeeded with emergency key");
                    events.push(LoopEvent::BreakInSucceeded {
                        method: BreakInMethod::Secondary,
                    });
                }
            }
            _ => {}
        }
    }

    pub fn set_battery_removed(&mut self, removed: bool) {
        self.session.battery_removed = removed;
    }

    pub fn set_reset_blocked(&mut self, blocked: bool) {
        info!(blocked, "reset blocking changed");
        self.session.reset_blocked = blocked;
    }

    /// Stop (or re-allow) the loop scenario. Blocking forces the break-in
    /// phase to Done and clears any pending emergency deadline.
    pub fn set_scenario_blocked(&mut self, blocked: bool, reason: &str) {
        info!(blocked, reason, "scenario blocking changed");
        self.session.scenario_blocked = blocked;
        if blocked {
            self.session.phase = BreakInPhase::Done;
            self.session.emergency_deadline = None;
        }
    }

    /// Freeze the loop clock for a non-interactive intro.
    pub fn prepare_for_opening(&mut self, reason: &str) {
        info!(reason, "preparing for opening");
        self.session.game_running = false;
    }

    /// Intro over: restart the loop clock from zero.
    pub fn begin_game_from_opening(&mut self, reason: &str) {
        if self.session.game_running {
            debug!(reason, "game already running");
            return;
        }
        info!(reason, "game begins");
        self.session.game_running = true;
        self.session.elapsed_secs = 0.0;
    }

    pub fn view(&self) -> LoopView {
        let s = &self.session;
        LoopView {
            loop_index: s.loop_index,
            elapsed_secs: s.elapsed_secs,
            break_in_deadline: s.break_in_deadline,
            emergency_deadline: s.emergency_deadline,
            break_in_phase: s.phase,
            battery_removed: s.battery_removed,
            reset_blocked: s.reset_blocked,
            scenario_blocked: s.scenario_blocked,
            reset_in_flight: self.latch.held,
        }
    }
}
