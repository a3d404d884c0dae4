//! Navigation capability the brains drive.
//!
//! Pathfinding lives outside the brains; they only ask for a destination,
//! toggle stopping, and poll the remaining distance.

use nightloop_core::types::Position;

pub trait Navigator {
    /// Current feet position of the agent.
    fn position(&self) -> Position;

    fn set_destination(&mut self, destination: Position);

    fn set_stopped(&mut self, stopped: bool);

    fn set_speed(&mut self, speed: f64);

    /// Distance left on the current path. `None` while a path is pending.
    fn remaining_distance(&self) -> Option<f64>;
}
