//! Door transition drain: turns each door's queued transitions into
//! `DoorStateChanged` events at the point in the tick they happened.

use hecs::World;

use nightloop_core::components::Fixture;
use nightloop_core::events::LoopEvent;

pub fn drain_transitions(world: &mut World, events: &mut Vec<LoopEvent>) {
    for (_entity, fixture) in world.query_mut::<&mut Fixture>() {
        if let Some(door) = fixture.as_door_mut() {
            events.extend(door.drain_transitions().into_iter().map(LoopEvent::from));
        }
    }
}
