//! Intruder director: owns the loop intruder's lifetime.
//!
//! Reacts to kernel events. A break-in spawns the intruder and walks the
//! entry door through its unlock/open flow; a new loop despawns it. While
//! blocked (end-game), the director neither spawns nor despawns on its own.

use hecs::{Entity, World};
use tracing::{debug, info, warn};

use nightloop_core::components::Fixture;
use nightloop_core::config::LoopConfig;
use nightloop_core::enums::{BreakInMethod, DoorState, IntruderKind};
use nightloop_core::events::LoopEvent;
use nightloop_core::reset::ResetRegistry;
use nightloop_intruder_ai::fsm::IntruderBrain;

use crate::world_setup;

const PRIMARY_LINE: &str = "Get out of my house!!";
const SECONDARY_LINE: &str = "Good thing I had the spare key... Hey! Who are you?!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryStage {
    Unlock,
    Open,
}

/// Pending entry-door flow for the intruder that just spawned.
#[derive(Debug, Clone, Copy)]
struct EntryFlow {
    method: BreakInMethod,
    stage: EntryStage,
    remaining: f64,
}

#[derive(Debug)]
pub struct IntruderDirector {
    current: Option<Entity>,
    blocked: bool,
    flow: Option<EntryFlow>,
    entry_door: Entity,
    next_serial: u32,
}

impl IntruderDirector {
    pub fn new(entry_door: Entity) -> Self {
        Self {
            current: None,
            blocked: false,
            flow: None,
            entry_door,
            next_serial: 1,
        }
    }

    pub fn current(&self) -> Option<Entity> {
        self.current
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Session-unique serial for any intruder kind.
    pub fn allocate_serial(&mut self) -> u32 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }

    /// A new loop began: clear out the previous loop's intruder.
    pub fn on_loop_started(
        &mut self,
        world: &mut World,
        registry: &mut ResetRegistry<Entity>,
        events: &mut Vec<LoopEvent>,
    ) {
        if self.blocked {
            debug!("loop start ignored: director blocked");
            return;
        }
        self.flow = None;
        self.despawn_current(world, registry, events);
    }

    pub fn on_break_in_delayed(&self, deadline: f64) {
        info!(deadline, "first break-in attempt failed: keypad dead");
    }

    /// The break-in landed: spawn the intruder and start the door flow.
    pub fn on_break_in(
        &mut self,
        method: BreakInMethod,
        world: &mut World,
        config: &LoopConfig,
        events: &mut Vec<LoopEvent>,
    ) {
        if self.blocked {
            debug!(?method, "break-in ignored: director blocked");
            return;
        }
        if self.current.is_some() {
            warn!(?method, "break-in ignored: intruder already present");
            return;
        }

        let serial = self.allocate_serial();
        let entity = world_setup::spawn_loop_intruder(world, config, serial);
        if let Ok(mut brain) = world.get::<&mut IntruderBrain>(entity) {
            brain.set_entrance_line(match method {
                BreakInMethod::Primary => PRIMARY_LINE,
                BreakInMethod::Secondary => SECONDARY_LINE,
            });
        }
        self.current = Some(entity);
        events.push(LoopEvent::IntruderSpawned {
            intruder: serial,
            kind: IntruderKind::Loop,
        });
        info!(serial, ?method, "intruder broke in");

        self.start_entry_flow(method, world, config);
    }

    fn start_entry_flow(&mut self, method: BreakInMethod, world: &World, config: &LoopConfig) {
        let state = match world.get::<&Fixture>(self.entry_door) {
            Ok(fixture) => fixture.as_door().map(|d| d.state()),
            Err(_) => None,
        };
        match state {
            None => {
                warn!("entry door missing: door flow skipped");
                self.flow = None;
            }
            Some(DoorState::Open | DoorState::Broken) => {
                debug!("entry door already passable: door flow skipped");
                self.flow = None;
            }
            Some(_) => {
                let remaining = match method {
                    BreakInMethod::Primary => 0.0,
                    BreakInMethod::Secondary => config.intruder.emergency_unlock_delay_secs,
                };
                self.flow = Some(EntryFlow {
                    method,
                    stage: EntryStage::Unlock,
                    remaining,
                });
            }
        }
    }

    /// Advance the entry-door flow.
    pub fn tick(&mut self, dt: f64, world: &mut World, config: &LoopConfig) {
        let Some(mut flow) = self.flow.take() else {
            return;
        };
        flow.remaining -= dt;
        if flow.remaining > 0.0 {
            self.flow = Some(flow);
            return;
        }

        let mut fixture = match world.get::<&mut Fixture>(self.entry_door) {
            Ok(fixture) => fixture,
            Err(_) => {
                warn!("entry door missing: door flow dropped");
                return;
            }
        };
        let Some(door) = fixture.as_door_mut() else {
            warn!("entry fixture is not a door: door flow dropped");
            return;
        };

        let reason = match flow.method {
            BreakInMethod::Primary => "intruder used the keypad",
            BreakInMethod::Secondary => "intruder used the emergency key",
        };
        match flow.stage {
            EntryStage::Unlock => {
                if door.state() == DoorState::Locked {
                    door.try_unlock(reason);
                }
                self.flow = Some(EntryFlow {
                    stage: EntryStage::Open,
                    remaining: config.intruder.entry_open_delay_secs,
                    ..flow
                });
            }
            EntryStage::Open => {
                if !door.try_open(reason) {
                    warn!("entry door refused to open");
                }
            }
        }
    }

    /// Block or unblock spawning. Blocking cancels the door flow and removes
    /// the current intruder.
    pub fn set_blocked(
        &mut self,
        blocked: bool,
        world: &mut World,
        registry: &mut ResetRegistry<Entity>,
        events: &mut Vec<LoopEvent>,
    ) {
        info!(blocked, "intruder director blocking changed");
        self.blocked = blocked;
        if blocked {
            self.flow = None;
            self.despawn_current(world, registry, events);
        }
    }

    fn despawn_current(
        &mut self,
        world: &mut World,
        registry: &mut ResetRegistry<Entity>,
        events: &mut Vec<LoopEvent>,
    ) {
        let Some(entity) = self.current.take() else {
            return;
        };
        if let Some(tag) = world_setup::despawn(world, registry, entity) {
            info!(serial = tag.serial, "intruder despawned");
            events.push(LoopEvent::IntruderDespawned {
                intruder: tag.serial,
                kind: tag.kind,
            });
        }
    }
}
