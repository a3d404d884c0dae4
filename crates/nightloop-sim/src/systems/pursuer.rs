//! End-game pursuer system.
//!
//! Pursuers always know where the player is. A pursuer that reaches the
//! shut interior door smashes it.

use hecs::World;
use tracing::info;

use nightloop_core::components::{Fixture, NavAgent};
use nightloop_core::config::PursuerConfig;
use nightloop_core::enums::{DoorId, DoorState};
use nightloop_core::types::{Pose, Position};
use nightloop_floorplan::FloorPlan;
use nightloop_intruder_ai::pursuit::PursuerBrain;

use crate::systems::movement::AgentNav;
use crate::world_setup::House;

/// Run every pursuer brain. Returns true if any pursuer reached the player.
pub fn run(world: &mut World, dt: f64, plan: &FloorPlan, house: &House, config: &PursuerConfig) -> bool {
    let target = world.get::<&Pose>(house.player).ok().map(|pose| pose.position);

    let mut caught = false;
    let mut positions: Vec<Position> = Vec::new();
    for (_entity, (pose, agent, brain)) in world.query_mut::<(&Pose, &mut NavAgent, &mut PursuerBrain)>() {
        let mut nav = AgentNav::new(pose, agent);
        caught |= brain.tick(dt, &mut nav, target);
        positions.push(pose.position);
    }

    if let Some(center) = plan.door_center(DoorId::Interior) {
        let near = positions
            .iter()
            .any(|p| p.horizontal_range_to(&center) <= config.door_break_radius);
        if near {
            break_interior_door(world, house);
        }
    }
    caught
}

fn break_interior_door(world: &mut World, house: &House) {
    let Ok(mut fixture) = world.get::<&mut Fixture>(house.door(DoorId::Interior)) else {
        return;
    };
    let Some(door) = fixture.as_door_mut() else {
        return;
    };
    if matches!(door.state(), DoorState::Closed | DoorState::Locked) {
        info!("pursuer broke through the interior door");
        door.force_break("pursuer broke through");
    }
}
