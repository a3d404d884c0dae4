//! Straight-line movement for navigation agents.
//!
//! Stands in for a pathfinder: every agent walks directly at its
//! destination. Planning takes one tick, during which the remaining
//! distance reads as pending.

use glam::DVec3;
use hecs::World;

use nightloop_core::components::NavAgent;
use nightloop_core::types::{Pose, Position};
use nightloop_intruder_ai::nav::Navigator;

/// [`Navigator`] over one agent's components.
pub struct AgentNav<'a> {
    position: Position,
    agent: &'a mut NavAgent,
}

impl<'a> AgentNav<'a> {
    pub fn new(pose: &Pose, agent: &'a mut NavAgent) -> Self {
        Self {
            position: pose.position,
            agent,
        }
    }
}

impl Navigator for AgentNav<'_> {
    fn position(&self) -> Position {
        self.position
    }

    fn set_destination(&mut self, destination: Position) {
        self.agent.destination = Some(destination);
        self.agent.path_pending = true;
    }

    fn set_stopped(&mut self, stopped: bool) {
        self.agent.stopped = stopped;
    }

    fn set_speed(&mut self, speed: f64) {
        self.agent.speed = speed;
    }

    fn remaining_distance(&self) -> Option<f64> {
        if self.agent.path_pending {
            return None;
        }
        Some(
            self.agent
                .destination
                .map_or(0.0, |dest| self.position.horizontal_range_to(&dest)),
        )
    }
}

/// Move every unstopped agent toward its destination.
pub fn run(world: &mut World, dt: f64) {
    for (_entity, (pose, agent)) in world.query_mut::<(&mut Pose, &mut NavAgent)>() {
        agent.path_pending = false;

        if agent.stopped {
            continue;
        }
        let Some(dest) = agent.destination else {
            continue;
        };

        let here = pose.position.to_dvec3();
        let delta = DVec3::new(dest.x - here.x, dest.y - here.y, 0.0);
        let dist = delta.length();
        if dist <= f64::EPSILON {
            continue;
        }

        pose.face(&dest);
        let step = (agent.speed * dt).min(dist);
        pose.position = Position::from_dvec3(here + delta / dist * step);
    }
}
