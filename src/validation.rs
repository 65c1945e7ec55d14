//! Workflow Validator - Verdicts Over a Bag of Placed Pieces
//!
//! Outcomes are checked in a fixed order: empty, missing source, single
//! piece, then interlock counting among proximate pairs.

use serde::{Deserialize, Serialize};

use crate::catalog::PieceCatalog;
use crate::geometry::can_interlock;
use crate::workflow::{InstanceId, PlacedPiece};

/// Pairs closer than this (pixel units, Euclidean) are checked for interlock.
pub const PROXIMITY_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Empty,
    MissingSource,
    SinglePiece,
    Valid(usize),
    NoInterlocks,
}

impl Verdict {
    /// Whether the outcome is reported to the user as a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Valid(_) | Verdict::SinglePiece)
    }

    pub fn reason(&self) -> String {
        match self {
            Verdict::Empty => "Add at least one piece to the workflow".to_string(),
            Verdict::MissingSource => "Add at least one source piece".to_string(),
            Verdict::SinglePiece => {
                "Piece added. Add more pieces to build a complete workflow".to_string()
            }
            Verdict::Valid(count) => {
                format!("Valid workflow: {} interlock(s) between pieces", count)
            }
            Verdict::NoInterlocks => {
                "Pieces are not interlocked. Overlap pieces on their empty cells".to_string()
            }
        }
    }
}

/// Two placed pieces counted as one interlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterlockPair {
    pub first: InstanceId,
    pub second: InstanceId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub verdict: Verdict,
    pub message: String,
    pub piece_count: usize,
    pub interlocks: Vec<InterlockPair>,
}

impl ValidationReport {
    /// Validate `pieces`, naming the catalog's source pieces when one is missing.
    pub fn build(pieces: &[PlacedPiece], catalog: &PieceCatalog) -> Self {
        let (verdict, interlocks) = evaluate(pieces);

        let message = match verdict {
            Verdict::MissingSource => {
                let names: Vec<_> = catalog.sources().map(|t| t.name.as_str()).collect();
                if names.is_empty() {
                    verdict.reason()
                } else {
                    format!("{} ({})", verdict.reason(), names.join(", "))
                }
            }
            _ => verdict.reason(),
        };

        tracing::debug!(?verdict, pieces = pieces.len(), "workflow validated");

        Self {
            valid: verdict.is_success(),
            verdict,
            message,
            piece_count: pieces.len(),
            interlocks,
        }
    }
}

/// Decide the verdict for the current resting positions of `pieces`.
pub fn validate(pieces: &[PlacedPiece]) -> Verdict {
    evaluate(pieces).0
}

fn evaluate(pieces: &[PlacedPiece]) -> (Verdict, Vec<InterlockPair>) {
    if pieces.is_empty() {
        return (Verdict::Empty, vec![]);
    }

    if !pieces.iter().any(PlacedPiece::is_source) {
        return (Verdict::MissingSource, vec![]);
    }

    if pieces.len() == 1 {
        return (Verdict::SinglePiece, vec![]);
    }

    let interlocks = interlocked_pairs(pieces);
    if interlocks.is_empty() {
        (Verdict::NoInterlocks, interlocks)
    } else {
        (Verdict::Valid(interlocks.len()), interlocks)
    }
}

/// Unordered pairs within `PROXIMITY_THRESHOLD` whose solid cells are disjoint
/// at their current positions.
pub fn interlocked_pairs(pieces: &[PlacedPiece]) -> Vec<InterlockPair> {
    let mut pairs = vec![];

    for (i, a) in pieces.iter().enumerate() {
        for b in &pieces[i + 1..] {
            if a.position.distance_to(b.position) >= PROXIMITY_THRESHOLD {
                continue;
            }
            if can_interlock(&a.piece_type, a.position, &b.piece_type, b.position) {
                pairs.push(InterlockPair {
                    first: a.instance_id.clone(),
                    second: b.instance_id.clone(),
                });
            }
        }
    }

    pairs
}
