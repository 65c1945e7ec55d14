//! Placement Resolver - Drop Position Search
//!
//! Snap first. On collision, try six neighbouring cells. If all of them
//! collide too, keep the snap anyway: a drop is never refused, the validator
//! reports the overlap later.

use serde::{Deserialize, Serialize};

use crate::catalog::PieceType;
use crate::geometry::{can_interlock, snap, Point, Position};
use crate::workflow::PlacedPiece;

/// Neighbour offsets in cell units, in search order.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 6] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (-1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionKind {
    /// The direct snap was free.
    Snapped,
    /// The snap collided; a neighbour at `(dx, dy)` cells was free.
    Nudged { dx: i32, dy: i32 },
    /// Everything collided; the snap is used and overlaps.
    Overlapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub position: Position,
    #[serde(flatten)]
    pub kind: ResolutionKind,
}

/// Resolve a drop and return the chosen position.
pub fn resolve_drop<'a, I>(moving: &PieceType, raw: Point, existing: I) -> Position
where
    I: IntoIterator<Item = &'a PlacedPiece> + Clone,
{
    resolve_drop_detailed(moving, raw, existing).position
}

/// Resolve a drop, also reporting which branch of the search produced it.
pub fn resolve_drop_detailed<'a, I>(moving: &PieceType, raw: Point, existing: I) -> Resolution
where
    I: IntoIterator<Item = &'a PlacedPiece> + Clone,
{
    let candidate = snap(raw);

    if fits(moving, candidate, existing.clone()) {
        return Resolution {
            position: candidate,
            kind: ResolutionKind::Snapped,
        };
    }

    for (dx, dy) in NEIGHBOR_OFFSETS {
        let nearby = candidate.offset_cells(dx, dy);
        tracing::trace!(piece = %moving.id, x = nearby.x, y = nearby.y, "probing neighbour");
        if fits(moving, nearby, existing.clone()) {
            return Resolution {
                position: nearby,
                kind: ResolutionKind::Nudged { dx, dy },
            };
        }
    }

    tracing::debug!(
        piece = %moving.id,
        x = candidate.x,
        y = candidate.y,
        "no free neighbour, keeping overlapping snap"
    );
    Resolution {
        position: candidate,
        kind: ResolutionKind::Overlapping,
    }
}

fn fits<'a, I>(moving: &PieceType, pos: Position, existing: I) -> bool
where
    I: IntoIterator<Item = &'a PlacedPiece>,
{
    existing
        .into_iter()
        .all(|other| can_interlock(moving, pos, &other.piece_type, other.position))
}
