//! Entity spawn factories for the house and its actors.
//!
//! Fixtures are registered with the reset registry as they are spawned;
//! [`despawn`] is the matching exit path and always deregisters first.

use hecs::{Entity, World};
use tracing::{debug, info};

use nightloop_core::components::*;
use nightloop_core::config::LoopConfig;
use nightloop_core::door::DoorMachine;
use nightloop_core::enums::*;
use nightloop_core::reset::ResetRegistry;
use nightloop_core::types::Pose;
use nightloop_intruder_ai::fsm::{IntruderBrain, Route};
use nightloop_intruder_ai::profiles::get_profile;
use nightloop_intruder_ai::pursuit::PursuerBrain;

/// Entity handles for everything the house is built from.
#[derive(Debug, Clone, Copy)]
pub struct House {
    pub player: Entity,
    pub interior_door: Entity,
    pub entry_door: Entity,
    pub battery_lock: Entity,
    pub hide_zone: Entity,
    pub medicine: Entity,
}

impl House {
    pub fn door(&self, id: DoorId) -> Entity {
        match id {
            DoorId::Interior => self.interior_door,
            DoorId::Entry => self.entry_door,
        }
    }
}

/// Spawn the player and every fixture.
pub fn setup_house(world: &mut World, config: &LoopConfig, registry: &mut ResetRegistry<Entity>) -> House {
    let player = spawn_player(world, config.layout.player_start.unwrap_or_default());

    let interior_door = spawn_fixture(
        world,
        registry,
        Fixture::Door(DoorMachine::new(DoorId::Interior, DoorState::Closed)),
    );
    let entry_door = spawn_fixture(
        world,
        registry,
        Fixture::Door(DoorMachine::new(DoorId::Entry, DoorState::Closed)),
    );
    let battery_lock = spawn_fixture(world, registry, Fixture::BatteryLock { removed: false });
    let hide_zone = spawn_fixture(world, registry, Fixture::HideZone { occupied: false });
    let medicine = spawn_fixture(
        world,
        registry,
        Fixture::Medicine {
            used: false,
            once_per_loop: config.perception.medicine_once_per_loop,
        },
    );

    info!(fixtures = registry.len(), "house set up");
    House {
        player,
        interior_door,
        entry_door,
        battery_lock,
        hide_zone,
        medicine,
    }
}

pub fn spawn_player(world: &mut World, pose: Pose) -> Entity {
    world.spawn((Player, pose))
}

/// Spawn a fixture and register it for loop resets.
pub fn spawn_fixture(world: &mut World, registry: &mut ResetRegistry<Entity>, fixture: Fixture) -> Entity {
    let entity = world.spawn((fixture,));
    registry.register(entity);
    entity
}

/// Spawn the scripted loop intruder at the configured spawn pose.
pub fn spawn_loop_intruder(world: &mut World, config: &LoopConfig, serial: u32) -> Entity {
    let profile = get_profile(IntruderKind::Loop, config);
    let brain = IntruderBrain::new(Route::from_layout(&config.layout), profile);

    let entity = world.spawn((
        Intruder {
            serial,
            kind: IntruderKind::Loop,
        },
        config.layout.intruder_spawn,
        NavAgent::new(profile.walk_speed),
        VisionSensor::new(config.vision),
        brain,
    ));
    debug!(serial, "loop intruder spawned");
    entity
}

/// Spawn the end-game pursuer at the configured spawn pose.
pub fn spawn_pursuer(world: &mut World, config: &LoopConfig, serial: u32) -> Entity {
    let profile = get_profile(IntruderKind::Pursuer, config);

    let entity = world.spawn((
        Intruder {
            serial,
            kind: IntruderKind::Pursuer,
        },
        config.layout.pursuer_spawn,
        NavAgent::new(profile.chase_speed),
        PursuerBrain::new(profile),
    ));
    debug!(serial, "pursuer spawned");
    entity
}

/// Deregister, then despawn. Returns the intruder tag if the entity had one.
pub fn despawn(world: &mut World, registry: &mut ResetRegistry<Entity>, entity: Entity) -> Option<Intruder> {
    registry.unregister(entity);
    let tag = world.get::<&Intruder>(entity).ok().map(|i| *i);
    if world.despawn(entity).is_err() {
        debug!(?entity, "despawn of missing entity ignored");
        return None;
    }
    tag
}
