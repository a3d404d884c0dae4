//! Intruder AI system: drives each loop intruder's brain one tick.
//!
//! Spotted edges from the vision system are delivered first, then the brain
//! polls its live task against the interior door, the latest sight sample
//! and the player's position.

use hecs::{Entity, World};
use tracing::warn;

use nightloop_core::components::{Fixture, Intruder, NavAgent, VisionSensor};
use nightloop_core::events::LoopEvent;
use nightloop_core::types::Pose;
use nightloop_intruder_ai::fsm::{IntruderBrain, IntruderContext};

use crate::systems::movement::AgentNav;
use crate::world_setup::House;

/// Run every loop intruder brain. Returns true if any of them reached the
/// player.
pub fn run(
    world: &mut World,
    dt: f64,
    now: f64,
    house: &House,
    spotted: &[Entity],
    events: &mut Vec<LoopEvent>,
) -> bool {
    let intruders: Vec<(Entity, u32)> = world
        .query::<(&Intruder, &IntruderBrain)>()
        .iter()
        .map(|(entity, (intruder, _))| (entity, intruder.serial))
        .collect();
    let target = world.get::<&Pose>(house.player).ok().map(|pose| pose.position);

    let mut caught = false;
    for (entity, serial) in intruders {
        let (Ok(mut brain), Ok(mut agent), Ok(pose)) = (
            world.get::<&mut IntruderBrain>(entity),
            world.get::<&mut NavAgent>(entity),
            world.get::<&Pose>(entity).map(|pose| *pose),
        ) else {
            warn!(serial, "intruder missing components");
            continue;
        };

        if spotted.contains(&entity) {
            brain.on_target_spotted();
        }

        let sight = world.get::<&VisionSensor>(entity).ok().map(|sensor| sensor.sample);
        let mut fixture = world.get::<&mut Fixture>(house.interior_door).ok();
        let door = fixture.as_mut().and_then(|fixture| fixture.as_door_mut());

        let mut nav = AgentNav::new(&pose, &mut agent);
        let mut ctx = IntruderContext {
            now,
            dt,
            nav: &mut nav,
            door,
            sight,
            target,
        };
        let out = brain.tick(&mut ctx);

        for change in out.changes {
            events.push(LoopEvent::IntruderStateChanged {
                intruder: serial,
                old: change.old,
                new: change.new,
                reason: change.reason,
            });
        }
        if let Some(line) = out.line {
            events.push(LoopEvent::IntruderLine {
                intruder: serial,
                line,
            });
        }
        caught |= out.catch_requested;
    }
    caught
}
