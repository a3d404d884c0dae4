//! Floor plan for NIGHTLOOP.
//!
//! Grid floor plan of the house and the occlusion query the vision sensor
//! uses for its line-of-sight test.

pub use nightloop_core as core;

pub mod grid;
pub mod los;

// Re-export key types for convenience.
pub use grid::{Cell, FloorPlan};
pub use los::{has_line_of_sight, OpenSpace, Occluder, PlanOccluder};
