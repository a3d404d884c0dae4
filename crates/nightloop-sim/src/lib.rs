//! Headless simulation for NIGHTLOOP.
//!
//! Owns the hecs ECS world, runs the time-loop kernel and the systems at a
//! fixed tick rate, and produces a `LoopSnapshot` per tick.

pub mod catch;
pub mod director;
pub mod ending;
pub mod engine;
pub mod kernel;
pub mod perception;
pub mod systems;
pub mod world_setup;

pub use engine::{LoopEngine, SimConfig};
pub use nightloop_core as core;
