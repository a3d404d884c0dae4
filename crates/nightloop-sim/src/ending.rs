//! End-game checkpoint and rollback.
//!
//! Once the ending begins the loop kernel no longer resets anything. This
//! controller runs a narrower cycle instead: the entry door is smashed, a
//! pursuer spawns, and a catch rolls the two doors and the player back to
//! the checkpoint captured when the ending began. The reset registry is not
//! involved.

use hecs::{Entity, World};
use tracing::{info, warn};

use nightloop_core::components::Fixture;
use nightloop_core::config::{EndingConfig, LoopConfig};
use nightloop_core::door::DoorMachine;
use nightloop_core::enums::{DoorId, DoorState, EndingStage, IntruderKind};
use nightloop_core::events::LoopEvent;
use nightloop_core::reset::ResetRegistry;
use nightloop_core::state::EndingView;
use nightloop_core::types::Pose;

use crate::director::IntruderDirector;
use crate::systems;
use crate::world_setup::{self, House};

/// Door states captured when the ending begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub interior: DoorState,
    pub entry: DoorState,
}

#[derive(Debug)]
pub struct EndingController {
    config: EndingConfig,
    checkpoint_pose: Pose,
    stage: EndingStage,
    timer: f64,
    checkpoint: Option<Checkpoint>,
    pursuer: Option<Entity>,
    rollback_count: u32,
}

impl EndingController {
    pub fn new(config: EndingConfig, checkpoint_pose: Pose) -> Self {
        Self {
            config,
            checkpoint_pose,
            stage: EndingStage::Inactive,
            timer: 0.0,
            checkpoint: None,
            pursuer: None,
            rollback_count: 0,
        }
    }

    pub fn stage(&self) -> EndingStage {
        self.stage
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EndingStage::Inactive | EndingStage::Complete)
    }

    pub fn checkpoint(&self) -> Option<Checkpoint> {
        self.checkpoint
    }

    pub fn pursuer(&self) -> Option<Entity> {
        self.pursuer
    }

    pub fn rollback_count(&self) -> u32 {
        self.rollback_count
    }

    /// Capture the checkpoint, lock the entry door and start the sequence.
    /// The caller has already blocked resets and the loop director.
    pub fn begin(&mut self, world: &mut World, house: &House, events: &mut Vec<LoopEvent>) {
        let checkpoint = Checkpoint {
            interior: door_state(world, house.door(DoorId::Interior)).unwrap_or_default(),
            entry: door_state(world, house.door(DoorId::Entry)).unwrap_or_default(),
        };
        info!(?checkpoint, "ending checkpoint captured");
        self.checkpoint = Some(checkpoint);

        with_door(world, house.door(DoorId::Entry), |door| {
            door.force_set_for_rollback(DoorState::Locked, "ending lockdown");
        });
        systems::doors::drain_transitions(world, events);

        events.push(LoopEvent::EndingStarted);
        self.restart_sequence();
    }

    fn restart_sequence(&mut self) {
        self.stage = EndingStage::AwaitingBreak;
        self.timer = self.config.break_delay_secs;
    }

    /// Advance the break/spawn timers.
    pub fn tick(
        &mut self,
        dt: f64,
        world: &mut World,
        house: &House,
        config: &LoopConfig,
        director: &mut IntruderDirector,
        events: &mut Vec<LoopEvent>,
    ) {
        match self.stage {
            EndingStage::AwaitingBreak => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    with_door(world, house.door(DoorId::Entry), |door| {
                        door.force_break("pursuer smashed the entry door");
                    });
                    self.stage = EndingStage::AwaitingSpawn;
                    self.timer = self.config.spawn_delay_secs;
                }
            }
            EndingStage::AwaitingSpawn => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    let serial = director.allocate_serial();
                    self.pursuer = Some(world_setup::spawn_pursuer(world, config, serial));
                    events.push(LoopEvent::IntruderSpawned {
                        intruder: serial,
                        kind: IntruderKind::Pursuer,
                    });
                    info!(serial, "pursuer released");
                    self.stage = EndingStage::Pursuit;
                }
            }
            EndingStage::Inactive | EndingStage::Pursuit | EndingStage::Complete => {}
        }
    }

    /// The pursuer caught the player: back to the checkpoint.
    pub fn rollback(
        &mut self,
        world: &mut World,
        house: &House,
        registry: &mut ResetRegistry<Entity>,
        events: &mut Vec<LoopEvent>,
    ) {
        if !self.is_active() {
            warn!(stage = ?self.stage, "rollback ignored: ending not active");
            return;
        }
        self.despawn_pursuer(world, registry, events);

        match self.checkpoint {
            Some(checkpoint) => {
                with_door(world, house.door(DoorId::Interior), |door| {
                    door.force_set_for_rollback(checkpoint.interior, "checkpoint rollback");
                });
                with_door(world, house.door(DoorId::Entry), |door| {
                    door.force_set_for_rollback(checkpoint.entry, "checkpoint rollback");
                });
            }
            None => warn!("rollback without checkpoint: doors left as they are"),
        }
        systems::doors::drain_transitions(world, events);

        match world.get::<&mut Pose>(house.player) {
            Ok(mut pose) => *pose = self.checkpoint_pose,
            Err(_) => warn!("player missing: not moved to checkpoint"),
        }

        self.rollback_count += 1;
        info!(rollback_count = self.rollback_count, "rolled back to checkpoint");
        events.push(LoopEvent::CheckpointRestored {
            rollback_count: self.rollback_count,
        });
        self.restart_sequence();
    }

    /// The player got out. Returns false if no ending was running.
    pub fn escape(
        &mut self,
        world: &mut World,
        registry: &mut ResetRegistry<Entity>,
        events: &mut Vec<LoopEvent>,
    ) -> bool {
        if !self.is_active() {
            return false;
        }
        self.despawn_pursuer(world, registry, events);
        self.stage = EndingStage::Complete;
        info!("player escaped");
        events.push(LoopEvent::EscapeSucceeded);
        true
    }

    fn despawn_pursuer(
        &mut self,
        world: &mut World,
        registry: &mut ResetRegistry<Entity>,
        events: &mut Vec<LoopEvent>,
    ) {
        let Some(entity) = self.pursuer.take() else {
            return;
        };
        if let Some(tag) = world_setup::despawn(world, registry, entity) {
            events.push(LoopEvent::IntruderDespawned {
                intruder: tag.serial,
                kind: tag.kind,
            });
        }
    }

    pub fn view(&self) -> EndingView {
        EndingView {
            stage: self.stage,
            rollback_count: self.rollback_count,
            checkpoint_captured: self.checkpoint.is_some(),
        }
    }
}

fn door_state(world: &World, entity: Entity) -> Option<DoorState> {
    let fixture = world.get::<&Fixture>(entity).ok()?;
    fixture.as_door().map(|door| door.state())
}

fn with_door(world: &mut World, entity: Entity, f: impl FnOnce(&mut DoorMachine)) {
    match world.get::<&mut Fixture>(entity) {
        Ok(mut fixture) => match fixture.as_door_mut() {
            Some(door) => f(door),
            None => warn!(?entity, "fixture is not a door"),
        },
        Err(_) => warn!(?entity, "door missing"),
    }
}
