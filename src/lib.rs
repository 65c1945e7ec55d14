//! Pieceflow Core - Interlocking Workflow Pieces
//!
//! # Rules
//! 1. Masks Are Constants
//! 2. Solid Never Meets Solid In A Legal Placement
//! 3. Drops Always Land Somewhere
//! 4. The Workflow Owns Every Placed Piece
//! 5. Validation Reads, Never Mutates

pub mod catalog;
pub mod command;
pub mod geometry;
pub mod gesture;
pub mod placement;
pub mod validation;
pub mod workflow;

pub use catalog::{CatalogError, DataKind, Mask, PieceCatalog, PieceType};
pub use command::{CommandOutcome, DeleteTarget, WorkflowCommand};
pub use geometry::{can_interlock, snap, GridCell, Point, Position, CELL_SIZE, MAX_COORD, MIN_COORD};
pub use gesture::DragGesture;
pub use placement::{resolve_drop, resolve_drop_detailed, Resolution, ResolutionKind};
pub use validation::{validate, ValidationReport, Verdict, PROXIMITY_THRESHOLD};
pub use workflow::{ensure_finite, InstanceId, PlacedPiece, Workflow, WorkflowError, WorkflowSnapshot};

pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
