//! Workflow Model - Single Owner of Placed Pieces
//!
//! Every mutation (add, remove, move) goes through `Workflow`. Validity is
//! never evaluated here; see `validation`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::{PieceCatalog, PieceType};
use crate::geometry::{Point, Position};
use crate::placement::resolve_drop;

#[derive(Debug, Error, PartialEq)]
pub enum WorkflowError {
    #[error("Unknown piece type: {0}")]
    UnknownPieceType(String),

    #[error("Coordinates must be finite, got ({x}, {y})")]
    InvalidPoint { x: f64, y: f64 },
}

/// Reject NaN and infinite coordinates from external input.
pub fn ensure_finite(raw: Point) -> Result<Point, WorkflowError> {
    if raw.is_finite() {
        Ok(raw)
    } else {
        Err(WorkflowError::InvalidPoint { x: raw.x, y: raw.y })
    }
}

/// `<piece-type-id>-<sequence>`, unique for the lifetime of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(piece_type_id: &str, seq: u64) -> Self {
        Self(format!("{}-{}", piece_type_id, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone)]
pub struct PlacedPiece {
    pub instance_id: InstanceId,
    pub piece_type: Arc<PieceType>,
    pub position: Position,
    pub placed_at: DateTime<Utc>,
}

impl PlacedPiece {
    pub fn is_source(&self) -> bool {
        self.piece_type.is_source()
    }
}

/// Render-facing view of one placed piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceView {
    pub instance_id: InstanceId,
    pub piece_type: String,
    pub name: String,
    pub position: Position,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub pieces: Vec<PieceView>,
}

/// The mutable piece collection of one editing session.
#[derive(Debug, Clone)]
pub struct Workflow {
    id: Uuid,
    created_at: DateTime<Utc>,
    pieces: Vec<PlacedPiece>,
    next_seq: u64,
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            pieces: Vec::new(),
            next_seq: 1,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Instantiate `piece_type` at the resolved position for `raw`.
    pub fn add(&mut self, piece_type: Arc<PieceType>, raw: Point) -> &PlacedPiece {
        let position = resolve_drop(&piece_type, raw, &self.pieces);
        let instance_id = InstanceId::new(&piece_type.id, self.next_seq);
        self.next_seq += 1;

        tracing::debug!(
            workflow = %self.id,
            instance = %instance_id,
            x = position.x,
            y = position.y,
            "piece added"
        );

        let index = self.pieces.len();
        self.pieces.push(PlacedPiece {
            instance_id,
            piece_type,
            position,
            placed_at: Utc::now(),
        });
        &self.pieces[index]
    }

    /// Catalog lookup, then `add`. Unknown ids and non-finite points are
    /// caller errors.
    pub fn drop_piece(
        &mut self,
        catalog: &PieceCatalog,
        piece_type_id: &str,
        raw: Point,
    ) -> Result<&PlacedPiece, WorkflowError> {
        let piece_type = catalog
            .get(piece_type_id)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownPieceType(piece_type_id.to_string()))?;
        let raw = ensure_finite(raw)?;
        Ok(self.add(piece_type, raw))
    }

    /// Returns whether anything was removed.
    pub fn remove(&mut self, instance_id: &InstanceId) -> bool {
        let before = self.pieces.len();
        self.pieces.retain(|p| &p.instance_id != instance_id);
        let removed = self.pieces.len() != before;
        if removed {
            tracing::debug!(workflow = %self.id, instance = %instance_id, "piece removed");
        }
        removed
    }

    /// Returns how many pieces were cleared.
    pub fn remove_all(&mut self) -> usize {
        let count = self.pieces.len();
        self.pieces.clear();
        tracing::debug!(workflow = %self.id, count, "workflow cleared");
        count
    }

    /// Re-resolve `instance_id` at `raw` against every other piece.
    /// `None` when the piece no longer exists.
    pub fn move_piece(&mut self, instance_id: &InstanceId, raw: Point) -> Option<Position> {
        let moving = self.get(instance_id)?.piece_type.clone();
        let others = self.pieces.iter().filter(|p| &p.instance_id != instance_id);
        let position = resolve_drop(&moving, raw, others);

        let piece = self.pieces.iter_mut().find(|p| &p.instance_id == instance_id)?;
        piece.position = position;
        tracing::trace!(instance = %instance_id, x = position.x, y = position.y, "piece moved");
        Some(position)
    }

    pub fn get(&self, instance_id: &InstanceId) -> Option<&PlacedPiece> {
        self.pieces.iter().find(|p| &p.instance_id == instance_id)
    }

    pub fn pieces(&self) -> &[PlacedPiece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            id: self.id,
            created_at: self.created_at,
            pieces: self
                .pieces
                .iter()
                .map(|p| PieceView {
                    instance_id: p.instance_id.clone(),
                    piece_type: p.piece_type.id.clone(),
                    name: p.piece_type.name.clone(),
                    position: p.position,
                    placed_at: p.placed_at,
                })
                .collect(),
        }
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MAX_COORD;

    #[test]
    fn test_drop_assigns_sequential_ids() {
        let catalog = PieceCatalog::builtin();
        let mut workflow = Workflow::new();

        let first = workflow
            .drop_piece(&catalog, "user-input", Point::new(100.0, 100.0))
            .unwrap()
            .instance_id
            .clone();
        let second = workflow
            .drop_piece(&catalog, "ocr", Point::new(400.0, 400.0))
            .unwrap()
            .instance_id
            .clone();

        assert_eq!(first.as_str(), "user-input-1");
        assert_eq!(second.as_str(), "ocr-2");
        assert_eq!(workflow.get(&first).unwrap().position, Position::new(96, 96));
    }

    #[test]
    fn test_unknown_piece_type() {
        let mut workflow = Workflow::new();
        let result = workflow.drop_piece(&PieceCatalog::builtin(), "nope", Point::default());
        assert_eq!(result.unwrap_err(), WorkflowError::UnknownPieceType("nope".into()));
        assert!(workflow.is_empty());
    }

    #[test]
    fn test_non_finite_drop_rejected() {
        let catalog = PieceCatalog::builtin();
        let mut workflow = Workflow::new();

        let result = workflow.drop_piece(&catalog, "ocr", Point::new(f64::INFINITY, 0.0));
        assert_eq!(
            result.unwrap_err(),
            WorkflowError::InvalidPoint { x: f64::INFINITY, y: 0.0 }
        );
        assert!(workflow.drop_piece(&catalog, "ocr", Point::new(0.0, f64::NAN)).is_err());
        assert!(workflow.is_empty());
    }

    #[test]
    fn test_huge_drop_clamps_to_edge() {
        let catalog = PieceCatalog::builtin();
        let mut workflow = Workflow::new();
        workflow.drop_piece(&catalog, "user-input", Point::new(3.0e9, 3.0e9)).unwrap();

        // The neighbour search runs at the edge of the coordinate range.
        let second = workflow
            .drop_piece(&catalog, "user-input", Point::new(3.0e9, 3.0e9))
            .unwrap();
        assert!(second.position.is_grid_aligned());
        assert!(second.position.x <= MAX_COORD && second.position.y <= MAX_COORD);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let catalog = PieceCatalog::builtin();
        let mut workflow = Workflow::new();
        workflow.drop_piece(&catalog, "rag", Point::default()).unwrap();

        assert!(!workflow.remove(&InstanceId::from("rag-99")));
        assert_eq!(workflow.len(), 1);
        assert!(workflow.remove(&InstanceId::from("rag-1")));
        assert!(workflow.is_empty());
    }

    #[test]
    fn test_move_excludes_self_from_collisions() {
        let catalog = PieceCatalog::builtin();
        let mut workflow = Workflow::new();
        let id = workflow
            .drop_piece(&catalog, "gerador-texto", Point::new(48.0, 48.0))
            .unwrap()
            .instance_id
            .clone();

        // One cell over overlaps its own old footprint, which must not count.
        let moved = workflow.move_piece(&id, Point::new(60.0, 48.0));
        assert_eq!(moved, Some(Position::new(60, 48)));
        assert_eq!(workflow.get(&id).unwrap().position, Position::new(60, 48));
    }

    #[test]
    fn test_move_absent_is_noop() {
        let mut workflow = Workflow::new();
        assert_eq!(workflow.move_piece(&InstanceId::from("ghost-1"), Point::default()), None);
    }

    #[test]
    fn test_snapshot_lists_pieces_in_order() {
        let catalog = PieceCatalog::builtin();
        let mut workflow = Workflow::new();
        workflow.drop_piece(&catalog, "ms-office", Point::new(0.0, 0.0)).unwrap();
        workflow.drop_piece(&catalog, "ocr", Point::new(0.0, 24.0)).unwrap();

        let snapshot = workflow.snapshot();
        assert_eq!(snapshot.id, workflow.id());
        let names: Vec<_> = snapshot.pieces.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["MS-Office, PDFs", "OCR"]);
        assert_eq!(snapshot.pieces[1].position, Position::new(0, 24));
    }
}
