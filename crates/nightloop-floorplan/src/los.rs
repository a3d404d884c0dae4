//! Line-of-sight through the house.
//!
//! Uses stepped ray traversal over the floor plan. Walls are full height, so
//! only the horizontal path matters. Door cells block while their door leaf
//! is shut (Closed or Locked).

use nightloop_core::enums::{DoorId, DoorState};
use nightloop_core::types::Position;

use crate::grid::{Cell, FloorPlan};

/// Samples per cell edge along the ray.
const SAMPLES_PER_CELL: f64 = 4.0;

/// Occlusion query used by the vision sensor.
pub trait Occluder {
    /// True if something solid lies between `from` and `to`.
    fn is_occluded(&self, from: &Position, to: &Position) -> bool;
}

/// Nothing ever blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSpace;

impl Occluder for OpenSpace {
    fn is_occluded(&self, _from: &Position, _to: &Position) -> bool {
        false
    }
}

/// Floor plan plus the doors currently shut.
#[derive(Debug, Clone)]
pub struct PlanOccluder<'a> {
    plan: &'a FloorPlan,
    shut_doors: Vec<DoorId>,
}

impl<'a> PlanOccluder<'a> {
    pub fn new(plan: &'a FloorPlan, doors: impl IntoIterator<Item = (DoorId, DoorState)>) -> Self {
        let shut_doors = doors
            .into_iter()
            .filter(|(_, state)| state.blocks_sight())
            .map(|(id, _)| id)
            .collect();
        Self { plan, shut_doors }
    }
}

impl Occluder for PlanOccluder<'_> {
    fn is_occluded(&self, from: &Position, to: &Position) -> bool {
        !has_line_of_sight(self.plan, &self.shut_doors, from, to)
    }
}

/// Check line-of-sight between two house-space points.
///
/// Steps along the straight horizontal path and fails on the first wall
/// cell, or door cell whose door is in `shut_doors`. Cells outside the plan
/// are open air.
pub fn has_line_of_sight(
    plan: &FloorPlan,
    shut_doors: &[DoorId],
    from: &Position,
    to: &Position,
) -> bool {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let horiz_dist = (dx * dx + dy * dy).sqrt();

    let interval = plan.cell_size() / SAMPLES_PER_CELL;
    if horiz_dist < interval {
        return true; // Same spot
    }

    let num_samples = (horiz_dist / interval).ceil() as usize;
    let num_samples = num_samples.max(2);

    for i in 1..num_samples {
        let t = i as f64 / num_samples as f64;
        let sample = Position::new(from.x + dx * t, from.y + dy * t, 0.0);

        match plan.cell_at(&sample) {
            Some(Cell::Wall) => return false,
            Some(Cell::Door(id)) if shut_doors.contains(&id) => return false,
            _ => {}
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two rooms split by a wall with the interior door in the middle.
    fn make_two_room_plan() -> FloorPlan {
        FloorPlan::from_rows(
            &[
                "#########",
                "#...#...#",
                "#...I...#",
                "#...#...#",
                "#########",
            ],
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn test_los_same_room() {
        let plan = make_two_room_plan();
        let from = Position::new(1.5, 1.5, 1.6);
        let to = Position::new(3.5, 3.5, 1.0);

        assert!(
            has_line_of_sight(&plan, &[], &from, &to),
            "LOS should be clear inside one room"
        );
    }

    #[test]
    fn test_los_blocked_by_wall() {
        let plan = make_two_room_plan();
        // Row y=3 crosses the wall cell at x=4.
        let from = Position::new(1.5, 3.5, 1.6);
        let to = Position::new(7.5, 3.5, 1.0);

        assert!(
            !has_line_of_sight(&plan, &[], &from, &to),
            "LOS should be blocked by the dividing wall"
        );
    }

    #[test]
    fn test_los_through_open_door() {
        let plan = make_two_room_plan();
        let from = Position::new(1.5, 2.5, 1.6);
        let to = Position::new(7.5, 2.5, 1.0);

        assert!(
            has_line_of_sight(&plan, &[], &from, &to),
            "LOS should pass through an open doorway"
        );
    }

    #[test]
    fn test_los_blocked_by_shut_door() {
        let plan = make_two_room_plan();
        let from = Position::new(1.5, 2.5, 1.6);
        let to = Position::new(7.5, 2.5, 1.0);

        assert!(
            !has_line_of_sight(&plan, &[DoorId::Interior], &from, &to),
            "LOS should be blocked by a shut door"
        );
    }

    #[test]
    fn test_plan_occluder_filters_by_door_state() {
        let plan = make_two_room_plan();
        let from = Position::new(1.5, 2.5, 1.6);
        let to = Position::new(7.5, 2.5, 1.0);

        let locked = PlanOccluder::new(&plan, [(DoorId::Interior, DoorState::Locked)]);
        assert!(locked.is_occluded(&from, &to));

        let broken = PlanOccluder::new(&plan, [(DoorId::Interior, DoorState::Broken)]);
        assert!(!broken.is_occluded(&from, &to));
    }

    #[test]
    fn test_cell_lookup_orientation() {
        let plan = make_two_room_plan();
        // First row is northmost: the door sits on the middle row.
        assert_eq!(
            plan.cell_at(&Position::new(4.5, 2.5, 0.0)),
            Some(Cell::Door(DoorId::Interior))
        );
        assert_eq!(plan.cell_at(&Position::new(4.5, 3.5, 0.0)), Some(Cell::Wall));
        assert_eq!(plan.cell_at(&Position::new(-1.0, 2.0, 0.0)), None);
        assert_eq!(
            plan.door_center(DoorId::Interior),
            Some(Position::new(4.5, 2.5, 0.0))
        );
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        assert!(FloorPlan::from_rows(&["#?#"], 1.0).is_err());
    }

    #[test]
    fn test_open_space_never_occludes() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(100.0, 0.0, 0.0);
        assert!(!OpenSpace.is_occluded(&a, &b));
    }
}
