//! Shape Geometry - Grid Coordinates and the Interlock Predicate
//!
//! Two placed pieces interlock when no solid cell of one lands on a solid
//! cell of the other. Empty notches may overlap anything.

use serde::{Deserialize, Serialize};

use crate::catalog::PieceType;

/// Edge length of one grid cell, in pixel units.
pub const CELL_SIZE: i32 = 12;

/// Outermost grid-aligned pixel coordinates. Positions are clamped here.
pub const MAX_COORD: i32 = (i32::MAX / CELL_SIZE) * CELL_SIZE;
pub const MIN_COORD: i32 = (i32::MIN / CELL_SIZE) * CELL_SIZE;

/// Raw pointer coordinate, possibly off-grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Pixel position of a placed piece's top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_grid(self) -> GridCell {
        GridCell {
            row: round_half_up(self.y as f64 / CELL_SIZE as f64),
            col: round_half_up(self.x as f64 / CELL_SIZE as f64),
        }
    }

    /// Shift by whole cells, saturating at the coordinate bounds.
    pub fn offset_cells(self, dx: i32, dy: i32) -> Self {
        let shift = |v: i32, d: i32| {
            v.saturating_add(d.saturating_mul(CELL_SIZE))
                .clamp(MIN_COORD, MAX_COORD)
        };
        Self {
            x: shift(self.x, dx),
            y: shift(self.y, dy),
        }
    }

    pub fn distance_to(self, other: Position) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_grid_aligned(self) -> bool {
        self.x % CELL_SIZE == 0 && self.y % CELL_SIZE == 0
    }
}

impl From<Position> for Point {
    fn from(pos: Position) -> Self {
        Point::new(pos.x as f64, pos.y as f64)
    }
}

/// Unbounded integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub row: i32,
    pub col: i32,
}

// Halves round toward +infinity, so -0.5 goes to 0 rather than -1.
// The cast saturates; NaN becomes 0.
fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

fn snap_axis(value: f64) -> i32 {
    let cell = round_half_up(value / CELL_SIZE as f64);
    cell.clamp(MIN_COORD / CELL_SIZE, MAX_COORD / CELL_SIZE) * CELL_SIZE
}

/// Snap a raw point to the nearest grid-aligned position.
///
/// Coordinates beyond the representable range clamp to `MIN_COORD` /
/// `MAX_COORD`. Callers taking external input reject non-finite points first.
pub fn snap(point: Point) -> Position {
    Position {
        x: snap_axis(point.x),
        y: snap_axis(point.y),
    }
}

/// Global grid cells covered by the solid part of `piece` placed at `pos`.
pub fn occupied_cells(piece: &PieceType, pos: Position) -> impl Iterator<Item = GridCell> + '_ {
    let origin = pos.to_grid();
    piece.mask.solid_cells().map(move |(r, c)| GridCell {
        row: origin.row.saturating_add(r as i32),
        col: origin.col.saturating_add(c as i32),
    })
}

/// True when `a` at `pos_a` and `b` at `pos_b` share no solid cell.
pub fn can_interlock(a: &PieceType, pos_a: Position, b: &PieceType, pos_b: Position) -> bool {
    let cells_a: Vec<GridCell> = occupied_cells(a, pos_a).collect();
    !occupied_cells(b, pos_b).any(|cell| cells_a.contains(&cell))
}
