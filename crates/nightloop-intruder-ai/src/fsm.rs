//! Loop intruder behavior state machine.
//!
//! Each step owns exactly one resumable [`StepTask`]. Changing step replaces
//! the task, which drops whatever the old step was doing: a cancelled move
//! never reaches its arrival branch, a cancelled wait never fires.
//!
//! Steps, in script order:
//! Entrance -> GoToDoor -> (SearchForKey -> ReturnToDoor) -> UnlockAndEnter
//! -> WaitInside -> GoToWatchPointA -> WatchA -> GoToWatchPointB -> WatchB
//! -> GoToWatchPointA ... A spotted player preempts any step into Chasing.

use tracing::{debug, info, warn};

use nightloop_core::components::VisibilitySample;
use nightloop_core::config::LayoutConfig;
use nightloop_core::door::DoorMachine;
use nightloop_core::enums::{DoorState, IntruderStep};
use nightloop_core::types::Position;
use nightloop_core::CoreError;

use crate::nav::Navigator;
use crate::profiles::BehaviorProfile;

/// Transitions allowed inside one tick before the brain yields.
const MAX_STEPS_PER_TICK: usize = 8;

/// Waypoints injected at spawn. Any of them may be absent.
#[derive(Debug, Clone, Default)]
pub struct Route {
    pub door_point: Option<Position>,
    pub key_point: Option<Position>,
    pub watch_point_a: Option<Position>,
    pub watch_point_b: Option<Position>,
}

impl Route {
    pub fn from_layout(layout: &LayoutConfig) -> Self {
        Self {
            door_point: layout.interior_door_point,
            key_point: layout.key_point,
            watch_point_a: layout.watch_point_a,
            watch_point_b: layout.watch_point_b,
        }
    }
}

/// Per-tick input to the brain.
pub struct IntruderContext<'a> {
    /// Session time (s).
    pub now: f64,
    pub dt: f64,
    pub nav: &'a mut dyn Navigator,
    /// The door the script revolves around. `None` if it was never injected.
    pub door: Option<&'a mut DoorMachine>,
    /// Latest sensor reading. `None` if the intruder has no sensor.
    pub sight: Option<VisibilitySample>,
    /// Player feet position, if there is a player.
    pub target: Option<Position>,
}

/// A step change, for the event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StepChange {
    pub old: IntruderStep,
    pub new: IntruderStep,
    pub reason: String,
}

/// Per-tick output from the brain.
#[derive(Debug, Default)]
pub struct IntruderOutput {
    pub changes: Vec<StepChange>,
    /// The player is inside the kill radius.
    pub catch_requested: bool,
    /// Line spoken on entrance, emitted once.
    pub line: Option<String>,
}

/// The live task of the current step.
#[derive(Debug, Clone, PartialEq)]
enum StepTask {
    /// Entry actions not run yet.
    Fresh,
    Moving { dest: Position },
    Waiting { remaining: f64 },
    /// UnlockAndEnter: pause after the unlock attempt.
    Unlocking { remaining: f64 },
    /// UnlockAndEnter: pause after the open attempt.
    Opening { remaining: f64, opened: bool },
    Pursuing,
    /// A collaborator was missing; nothing more happens this loop.
    Halted,
}

enum Flow {
    Stay,
    Switch(IntruderStep, &'static str),
}

/// Progress of a move sub-task.
enum Leg {
    EnRoute,
    Arrived,
    Spotted,
}

/// Scripted loop intruder.
#[derive(Debug, Clone)]
pub struct IntruderBrain {
    step: IntruderStep,
    task: StepTask,
    route: Route,
    profile: BehaviorProfile,
    chase_timer: f64,
    entrance_line: Option<String>,
    changes: Vec<StepChange>,
}

impl IntruderBrain {
    pub fn new(route: Route, profile: BehaviorProfile) -> Self {
        Self {
            step: IntruderStep::Entrance,
            task: StepTask::Fresh,
            route,
            profile,
            chase_timer: 0.0,
            entrance_line: None,
            changes: Vec::new(),
        }
    }

    pub fn step(&self) -> IntruderStep {
        self.step
    }

    /// True once a missing collaborator froze the current step.
    pub fn is_halted(&self) -> bool {
        self.task == StepTask::Halted
    }

    pub fn set_entrance_line(&mut self, line: impl Into<String>) {
        self.entrance_line = Some(line.into());
    }

    /// Sensor edge: the player just became visible.
    pub fn on_target_spotted(&mut self) {
        if self.step == IntruderStep::Chasing {
            return;
        }
        info!(step = ?self.step, "player spotted, switching to chase");
        self.change_state(IntruderStep::Chasing, "target spotted");
    }

    /// Cancel the running task and start `new`.
    pub fn change_state(&mut self, new: IntruderStep, reason: &str) {
        let old = self.step;
        self.step = new;
        self.task = StepTask::Fresh;
        info!(?old, ?new, reason, "intruder step changed");
        self.changes.push(StepChange {
            old,
            new,
            reason: reason.to_string(),
        });
    }

    /// Advance the live task by one tick.
    pub fn tick(&mut self, ctx: &mut IntruderContext<'_>) -> IntruderOutput {
        let mut out = IntruderOutput::default();

        for _ in 0..MAX_STEPS_PER_TICK {
            match self.poll(ctx, &mut out) {
                Flow::Stay => break,
                Flow::Switch(next, reason) => self.change_state(next, reason),
            }
        }

        out.changes = std::mem::take(&mut self.changes);
        out
    }

    fn poll(&mut self, ctx: &mut IntruderContext<'_>, out: &mut IntruderOutput) -> Flow {
        if self.task == StepTask::Halted {
            return Flow::Stay;
        }

        match self.step {
            IntruderStep::Entrance => {
                if self.task == StepTask::Fresh {
                    if let Some(line) = self.entrance_line.take() {
                        out.line = Some(line);
                    }
                }
                let delay = self.profile.entrance_delay;
                self.hold(ctx, delay, IntruderStep::GoToDoor, "entrance finished")
            }
            IntruderStep::GoToDoor => {
                let dest = self.route.door_point;
                match self.travel(ctx, dest, "door point") {
                    Leg::EnRoute => return Flow::Stay,
                    Leg::Spotted => return chase("target visible while moving"),
                    Leg::Arrived => {}
                }
                if is_visible(ctx) {
                    return chase("target visible at door");
                }
                match ctx.door.as_deref().map(|d| d.state()) {
                    None => self.halt(ctx, CoreError::missing("interior door")),
                    Some(DoorState::Locked) => {
                        Flow::Switch(IntruderStep::SearchForKey, "door locked")
                    }
                    Some(_) => Flow::Switch(IntruderStep::UnlockAndEnter, "door not locked"),
                }
            }
            IntruderStep::SearchForKey => self.poll_search(ctx),
            IntruderStep::ReturnToDoor => {
                let dest = self.route.door_point;
                match self.travel(ctx, dest, "door point") {
                    Leg::EnRoute => return Flow::Stay,
                    Leg::Spotted => return chase("target visible while moving"),
                    Leg::Arrived => {}
                }
                if is_visible(ctx) {
                    return chase("target visible at door");
                }
                Flow::Switch(IntruderStep::UnlockAndEnter, "back with the key")
            }
            IntruderStep::UnlockAndEnter => self.poll_enter(ctx),
            IntruderStep::WaitInside => {
                let d = self.profile.wait_inside;
                self.hold(ctx, d, IntruderStep::GoToWatchPointA, "done waiting inside")
            }
            IntruderStep::GoToWatchPointA => {
                let dest = self.route.watch_point_a;
                self.walk_to(ctx, dest, "watch point A", IntruderStep::WatchA)
            }
            IntruderStep::WatchA => {
                let d = self.profile.watch_a;
                self.hold(ctx, d, IntruderStep::GoToWatchPointB, "done watching A")
            }
            IntruderStep::GoToWatchPointB => {
                let dest = self.route.watch_point_b;
                self.walk_to(ctx, dest, "watch point B", IntruderStep::WatchB)
            }
            IntruderStep::WatchB => {
                let d = self.profile.watch_b;
                self.hold(ctx, d, IntruderStep::GoToWatchPointA, "done watching B")
            }
            IntruderStep::Chasing => self.poll_chase(ctx, out),
        }
    }

    /// Stand still for `secs`, then resume movement and move on unless the
    /// player is in sight.
    fn hold(
        &mut self,
        ctx: &mut IntruderContext<'_>,
        secs: f64,
        next: IntruderStep,
        reason: &'static str,
    ) -> Flow {
        if self.task == StepTask::Fresh {
            ctx.nav.set_stopped(true);
            self.task = StepTask::Waiting { remaining: secs };
            return Flow::Stay;
        }

        let StepTask::Waiting { remaining } = &mut self.task else {
            return Flow::Stay;
        };
        if !count_down(remaining, ctx.dt) {
            return Flow::Stay;
        }
        ctx.nav.set_stopped(false);
        if is_visible(ctx) {
            return chase("target visible after wait");
        }
        Flow::Switch(next, reason)
    }

    /// Move, then go to `next` on arrival.
    fn walk_to(
        &mut self,
        ctx: &mut IntruderContext<'_>,
        dest: Option<Position>,
        label: &str,
        next: IntruderStep,
    ) -> Flow {
        match self.travel(ctx, dest, label) {
            Leg::EnRoute => Flow::Stay,
            Leg::Spotted => chase("target visible while moving"),
            Leg::Arrived if is_visible(ctx) => chase("target visible on arrival"),
            Leg::Arrived => Flow::Switch(next, "arrived"),
        }
    }

    /// Drive a move sub-task. Sight is checked on every poll while moving.
    fn travel(&mut self, ctx: &mut IntruderContext<'_>, dest: Option<Position>, label: &str) -> Leg {
        if self.task == StepTask::Fresh {
            let Some(dest) = dest else {
                self.halt(ctx, CoreError::missing(label));
                return Leg::EnRoute;
            };
            ctx.nav.set_stopped(false);
            ctx.nav.set_speed(self.profile.walk_speed);
            ctx.nav.set_destination(dest);
            debug!(?dest, label, "move started");
            self.task = StepTask::Moving { dest };
        }

        if !matches!(self.task, StepTask::Moving { .. }) {
            return Leg::EnRoute;
        }
        if is_visible(ctx) {
            return Leg::Spotted;
        }

        match ctx.nav.remaining_distance() {
            Some(d) if d <= self.profile.arrive_tolerance => {
                debug!(label, "move arrived");
                Leg::Arrived
            }
            _ => Leg::EnRoute,
        }
    }

    fn poll_search(&mut self, ctx: &mut IntruderContext<'_>) -> Flow {
        if let StepTask::Waiting { remaining } = &mut self.task {
            if !count_down(remaining, ctx.dt) {
                return Flow::Stay;
            }
            info!("key found");
            if is_visible(ctx) {
                return chase("target visible after search");
            }
            return Flow::Switch(IntruderStep::ReturnToDoor, "key found");
        }

        let dest = self.route.key_point;
        match self.travel(ctx, dest, "key point") {
            Leg::EnRoute => return Flow::Stay,
            Leg::Spotted => return chase("target visible while moving"),
            Leg::Arrived => {}
        }
        if is_visible(ctx) {
            return chase("target visible at key point");
        }
        debug!(secs = self.profile.key_search, "searching for key");
        self.task = StepTask::Waiting {
            remaining: self.profile.key_search,
        };
        Flow::Stay
    }

    fn poll_enter(&mut self, ctx: &mut IntruderContext<'_>) -> Flow {
        match self.task.clone() {
            StepTask::Fresh => {
                let Some(door) = ctx.door.as_deref_mut() else {
                    return self.halt(ctx, CoreError::missing("interior door"));
                };
                if door.state() == DoorState::Locked {
                    let unlocked = door.try_unlock("intruder unlocked door");
                    debug!(unlocked, "unlock attempted");
                    self.task = StepTask::Unlocking {
                        remaining: self.profile.unlock_delay,
                    };
                    return Flow::Stay;
                }
                self.attempt_open(ctx)
            }
            StepTask::Unlocking { mut remaining } => {
                let done = count_down(&mut remaining, ctx.dt);
                self.task = StepTask::Unlocking { remaining };
                if !done {
                    return Flow::Stay;
                }
                if is_visible(ctx) {
                    return chase("target visible after unlock");
                }
                self.attempt_open(ctx)
            }
            StepTask::Opening {
                mut remaining,
                opened,
            } => {
                let done = count_down(&mut remaining, ctx.dt);
                self.task = StepTask::Opening { remaining, opened };
                if !done {
                    return Flow::Stay;
                }
                if is_visible(ctx) {
                    return chase("target visible after open");
                }
                if !opened {
                    return Flow::Switch(IntruderStep::GoToDoor, "open failed, recheck door");
                }
                Flow::Switch(IntruderStep::WaitInside, "entered room")
            }
            _ => Flow::Stay,
        }
    }

    fn attempt_open(&mut self, ctx: &mut IntruderContext<'_>) -> Flow {
        let Some(door) = ctx.door.as_deref_mut() else {
            return self.halt(ctx, CoreError::missing("interior door"));
        };
        let opened = door.try_open("intruder opened door");
        self.task = StepTask::Opening {
            remaining: self.profile.open_delay,
            opened,
        };
        Flow::Stay
    }

    fn poll_chase(&mut self, ctx: &mut IntruderContext<'_>, out: &mut IntruderOutput) -> Flow {
        if self.task == StepTask::Fresh {
            self.chase_timer = 0.0;
            ctx.nav.set_stopped(false);
            ctx.nav.set_speed(self.profile.chase_speed);
            if let Some(target) = ctx.target {
                ctx.nav.set_destination(target);
            }
            self.task = StepTask::Pursuing;
        }

        let sight = ctx.sight.unwrap_or_default();
        if !sight.is_visible {
            let lost = sight
                .last_seen_time
                .map_or(f64::INFINITY, |seen| ctx.now - seen);
            if lost >= self.profile.chase_return {
                info!(lost_secs = lost, "lost the player");
                return Flow::Switch(IntruderStep::GoToWatchPointA, "target lost");
            }
        }

        let Some(target) = ctx.target else {
            return Flow::Stay;
        };

        self.chase_timer += ctx.dt;
        if self.chase_timer >= self.profile.chase_refresh {
            self.chase_timer = 0.0;
            ctx.nav.set_destination(target);
        }

        if ctx.nav.position().horizontal_range_to(&target) <= self.profile.kill_radius {
            out.catch_requested = true;
        }
        Flow::Stay
    }

    fn halt(&mut self, ctx: &mut IntruderContext<'_>, err: CoreError) -> Flow {
        warn!(step = ?self.step, %err, "intruder step halted for this loop");
        ctx.nav.set_stopped(true);
        self.task = StepTask::Halted;
        Flow::Stay
    }
}

fn chase(reason: &'static str) -> Flow {
    Flow::Switch(IntruderStep::Chasing, reason)
}

fn is_visible(ctx: &IntruderContext<'_>) -> bool {
    ctx.sight.is_some_and(|s| s.is_visible)
}

/// Returns true once the countdown has run out.
fn count_down(remaining: &mut f64, dt: f64) -> bool {
    *remaining -= dt;
    *remaining <= 1e-9
}
