//! Snapshot system: reads the world into a [`LoopSnapshot`].
//!
//! Read-only; never modifies the world.

use hecs::World;

use nightloop_core::components::*;
use nightloop_core::enums::*;
use nightloop_core::events::LoopEvent;
use nightloop_core::state::*;
use nightloop_core::types::{Pose, SimTime};
use nightloop_intruder_ai::fsm::IntruderBrain;

use crate::world_setup::House;

#[allow(clippy::too_many_arguments)]
pub fn build_snapshot(
    world: &World,
    time: &SimTime,
    phase: GamePhase,
    loop_state: LoopView,
    ending: EndingView,
    perception: PerceptionView,
    house: &House,
    events: Vec<LoopEvent>,
) -> LoopSnapshot {
    LoopSnapshot {
        time: *time,
        phase,
        loop_state,
        doors: build_doors(world, house),
        player: build_player(world, house),
        intruders: build_intruders(world),
        ending,
        perception,
        events,
    }
}

/// Whether the medicine can still be taken this loop.
pub fn medicine_available(world: &World, house: &House) -> bool {
    world
        .get::<&Fixture>(house.medicine)
        .map(|fixture| matches!(*fixture, Fixture::Medicine { used: false, .. }))
        .unwrap_or(false)
}

fn build_doors(world: &World, house: &House) -> Vec<DoorView> {
    [DoorId::Interior, DoorId::Entry]
        .into_iter()
        .filter_map(|door| {
            let fixture = world.get::<&Fixture>(house.door(door)).ok()?;
            fixture.as_door().map(|machine| DoorView {
                door,
                state: machine.state(),
            })
        })
        .collect()
}

fn build_player(world: &World, house: &House) -> Option<PlayerView> {
    let pose = *world.get::<&Pose>(house.player).ok()?;
    let hidden = world
        .get::<&Fixture>(house.hide_zone)
        .map(|fixture| matches!(*fixture, Fixture::HideZone { occupied: true }))
        .unwrap_or(false);
    Some(PlayerView { pose, hidden })
}

fn build_intruders(world: &World) -> Vec<IntruderView> {
    let mut query = world.query::<(&Intruder, &Pose, Option<&IntruderBrain>, Option<&VisionSensor>)>();
    let mut intruders: Vec<IntruderView> = query
        .iter()
        .map(|(_, (intruder, pose, brain, sensor))| IntruderView {
            serial: intruder.serial,
            kind: intruder.kind,
            pose: *pose,
            step: brain.map(|b| b.step()),
            visibility: sensor.map(|s| s.sample),
        })
        .collect();
    intruders.sort_by_key(|view| view.serial);
    intruders
}
