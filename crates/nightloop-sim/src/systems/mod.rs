//! ECS systems that operate on the simulation world each tick.
//!
//! Systems are free functions over `&mut World` (or `&World` for read-only).
//! Long-lived state belongs to components or to the engine's controllers.

pub mod doors;
pub mod intruder_ai;
pub mod movement;
pub mod pursuer;
pub mod snapshot;
pub mod vision;
