//! FloorPlan: grid of walls, floor and door cells with point queries.

use nightloop_core::enums::DoorId;
use nightloop_core::types::Position;
use nightloop_core::CoreError;

/// One plan cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Floor,
    Wall,
    Door(DoorId),
}

/// House floor plan. The south-west corner of the grid sits at the
/// house-space origin.
#[derive(Debug, Clone)]
pub struct FloorPlan {
    /// Number of columns (west to east).
    width: usize,
    /// Number of rows (north to south).
    height: usize,
    /// Edge length of one cell (m).
    cell_size: f64,
    /// Row-major, north-to-south, west-to-east.
    cells: Vec<Cell>,
}

impl FloorPlan {
    /// Parse a plan from text rows, first row northmost.
    ///
    /// `#` wall, `.` floor, `I` interior door, `E` entry door. Spaces count
    /// as floor so plans can be indented by hand.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], cell_size: f64) -> Result<Self, CoreError> {
        if rows.is_empty() {
            return Err(CoreError::invalid_config("floor plan has no rows"));
        }
        if cell_size <= 0.0 {
            return Err(CoreError::invalid_config("floor plan cell size must be positive"));
        }

        let width = rows[0].as_ref().chars().count();
        let mut cells = Vec::with_capacity(width * rows.len());

        for (r, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width {
                return Err(CoreError::invalid_config(format!(
                    "floor plan row {r} has width {}, expected {width}",
                    row.chars().count()
                )));
            }
            for (c, ch) in row.chars().enumerate() {
                let cell = match ch {
                    '#' => Cell::Wall,
                    '.' | ' ' => Cell::Floor,
                    'I' => Cell::Door(DoorId::Interior),
                    'E' => Cell::Door(DoorId::Entry),
                    other => {
                        return Err(CoreError::invalid_config(format!(
                            "floor plan cell ({r}, {c}) has unknown symbol {other:?}"
                        )))
                    }
                };
                cells.push(cell);
            }
        }

        Ok(Self {
            width,
            height: rows.len(),
            cell_size,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell containing `pos`, ignoring height. None outside the plan.
    pub fn cell_at(&self, pos: &Position) -> Option<Cell> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let col = (pos.x / self.cell_size) as usize;
        let row_from_south = (pos.y / self.cell_size) as usize;
        if col >= self.width || row_from_south >= self.height {
            return None;
        }
        let row = self.height - 1 - row_from_south;
        Some(self.cells[row * self.width + col])
    }

    /// Center of the first cell holding `door`, at floor level.
    pub fn door_center(&self, door: DoorId) -> Option<Position> {
        let idx = self.cells.iter().position(|c| *c == Cell::Door(door))?;
        let row = idx / self.width;
        let col = idx % self.width;
        let row_from_south = self.height - 1 - row;
        Some(Position::new(
            (col as f64 + 0.5) * self.cell_size,
            (row_from_south as f64 + 0.5) * self.cell_size,
            0.0,
        ))
    }
}
