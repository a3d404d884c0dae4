//! Vision sensor system.
//!
//! Each loop intruder checks for the player on a fixed interval (timer
//! accumulation, not every tick). A check passes when the player's aim point
//! is inside the view distance, inside half the view angle of the intruder's
//! facing, and not occluded by a wall or shut door. Only the
//! NotVisible -> Visible edge is reported.

use glam::DVec3;
use hecs::{Entity, World};
use tracing::{debug, warn};

use nightloop_core::components::{Fixture, Intruder, VisionSensor};
use nightloop_core::config::VisionConfig;
use nightloop_core::enums::{DoorId, DoorState};
use nightloop_core::events::LoopEvent;
use nightloop_core::types::{Pose, Position};
use nightloop_floorplan::{FloorPlan, Occluder, PlanOccluder};

use crate::world_setup::House;

/// Single sight check from `eye` along `forward` to `aim`.
pub fn check_visibility(
    eye: &Position,
    forward: DVec3,
    aim: &Position,
    config: &VisionConfig,
    occluder: &dyn Occluder,
) -> bool {
    let to_target = aim.to_dvec3() - eye.to_dvec3();
    let dist = to_target.length();
    if dist > config.distance {
        return false;
    }

    if dist > f64::EPSILON {
        let angle = forward.angle_between(to_target).to_degrees();
        if angle > config.angle_deg / 2.0 {
            return false;
        }
    }

    !occluder.is_occluded(eye, aim)
}

/// Run due sensor checks. Returns the intruders that just spotted the
/// player, in query order.
pub fn run(
    world: &mut World,
    dt: f64,
    now: f64,
    plan: &FloorPlan,
    house: &House,
    events: &mut Vec<LoopEvent>,
) -> Vec<Entity> {
    let doors: Vec<(DoorId, DoorState)> = [DoorId::Interior, DoorId::Entry]
        .into_iter()
        .filter_map(|id| {
            let fixture = world.get::<&Fixture>(house.door(id)).ok()?;
            fixture.as_door().map(|door| (id, door.state()))
        })
        .collect();
    let occluder = PlanOccluder::new(plan, doors);
    let target = world.get::<&Pose>(house.player).ok().map(|pose| pose.position);

    let mut spotted = Vec::new();
    for (entity, (intruder, pose, sensor)) in world.query_mut::<(&Intruder, &Pose, &mut VisionSensor)>() {
        sensor.timer += dt;
        if sensor.timer < sensor.config.check_interval_secs {
            continue;
        }
        sensor.timer = 0.0;

        let was_visible = sensor.sample.is_visible;
        let visible = match target {
            Some(target) => {
                let eye = pose.position.raised(sensor.config.eye_height);
                let aim = target.raised(sensor.config.aim_height);
                check_visibility(&eye, pose.forward(), &aim, &sensor.config, &occluder)
            }
            None => {
                warn!(serial = intruder.serial, "sight check without a player");
                false
            }
        };

        sensor.sample.is_visible = visible;
        if visible {
            sensor.sample.last_seen_position = target;
            sensor.sample.last_seen_time = Some(now);
        }

        if visible && !was_visible {
            debug!(serial = intruder.serial, "player spotted");
            events.push(LoopEvent::TargetSpotted {
                intruder: intruder.serial,
            });
            spotted.push(entity);
        }
    }
    spotted
}
