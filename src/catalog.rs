//! Piece Catalog - Static Registry of Piece Types
//!
//! Loaded once, immutable afterwards. Placed pieces share types by `Arc`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub type PieceTypeId = String;
pub type DataKind = String;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate piece type: {0}")]
    DuplicatePieceType(String),

    #[error("Catalog contains no piece types")]
    EmptyCatalog,

    #[error("Invalid mask: {0}")]
    InvalidMask(#[from] MaskError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaskError {
    #[error("Mask must have at least one row")]
    NoRows,

    #[error("Mask cell ({row}, {col}) must be 0 or 1, got {value}")]
    InvalidCell { row: usize, col: usize, value: u8 },
}

/// Binary occupancy grid. `true` is a solid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Mask {
    rows: Vec<Vec<bool>>,
}

impl Mask {
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self, MaskError> {
        if rows.is_empty() {
            return Err(MaskError::NoRows);
        }
        Ok(Self { rows })
    }

    /// Fully solid `height` x `width` mask.
    pub fn solid(height: usize, width: usize) -> Self {
        Self {
            rows: vec![vec![true; width]; height.max(1)],
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row; rows may be ragged.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_solid(&self, row: usize, col: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// `(row, col)` of every solid cell, row-major.
    pub fn solid_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, solid)| **solid)
                .map(move |(c, _)| (r, c))
        })
    }

    pub fn solid_count(&self) -> usize {
        self.solid_cells().count()
    }
}

impl TryFrom<Vec<Vec<u8>>> for Mask {
    type Error = MaskError;

    fn try_from(raw: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        let mut rows = Vec::with_capacity(raw.len());
        for (r, raw_row) in raw.into_iter().enumerate() {
            let mut row = Vec::with_capacity(raw_row.len());
            for (c, value) in raw_row.into_iter().enumerate() {
                match value {
                    0 => row.push(false),
                    1 => row.push(true),
                    value => return Err(MaskError::InvalidCell { row: r, col: c, value }),
                }
            }
            rows.push(row);
        }
        Mask::from_rows(rows)
    }
}

impl From<Mask> for Vec<Vec<u8>> {
    fn from(mask: Mask) -> Self {
        mask.rows
            .into_iter()
            .map(|row| row.into_iter().map(u8::from).collect())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceType {
    pub id: PieceTypeId,
    pub name: String,
    /// `None` marks a source piece.
    #[serde(default)]
    pub input_kind: Option<DataKind>,
    pub output_kind: DataKind,
    pub mask: Mask,
}

impl PieceType {
    /// Build a piece type from a raw 0/1 mask.
    pub fn new(
        id: &str,
        name: &str,
        input_kind: Option<&str>,
        output_kind: &str,
        mask: Vec<Vec<u8>>,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            input_kind: input_kind.map(str::to_string),
            output_kind: output_kind.to_string(),
            mask: Mask::try_from(mask)?,
        })
    }

    pub fn is_source(&self) -> bool {
        self.input_kind.is_none()
    }
}

/// Ordered piece type registry.
#[derive(Debug, Clone, Default)]
pub struct PieceCatalog {
    types: Vec<Arc<PieceType>>,
}

impl PieceCatalog {
    pub fn new() -> Self {
        Self { types: Vec::new() }
    }

    /// Builds a catalog, rejecting duplicate ids.
    pub fn from_types(types: Vec<PieceType>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for piece_type in types {
            catalog.register(piece_type)?;
        }
        Ok(catalog)
    }

    /// Reads a JSON array of piece types.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let types: Vec<PieceType> = serde_json::from_str(&content)?;
        if types.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        let catalog = Self::from_types(types)?;
        tracing::debug!(path = %path.display(), count = catalog.len(), "loaded piece catalog");
        Ok(catalog)
    }

    pub fn register(&mut self, piece_type: PieceType) -> Result<(), CatalogError> {
        if self.get(&piece_type.id).is_some() {
            return Err(CatalogError::DuplicatePieceType(piece_type.id));
        }
        self.types.push(Arc::new(piece_type));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<PieceType>> {
        self.types.iter().find(|t| t.id == id)
    }

    pub fn list(&self) -> &[Arc<PieceType>] {
        &self.types
    }

    pub fn sources(&self) -> impl Iterator<Item = &Arc<PieceType>> {
        self.types.iter().filter(|t| t.is_source())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The eight stock pieces: three sources and five processing stages.
    pub fn builtin() -> Self {
        let types = BUILTIN_PIECES
            .iter()
            .map(|(id, name, input, output, shape)| PieceType {
                id: id.to_string(),
                name: name.to_string(),
                input_kind: input.map(str::to_string),
                output_kind: output.to_string(),
                mask: Mask {
                    rows: shape
                        .iter()
                        .map(|row| row.iter().map(|cell| *cell == 1).collect())
                        .collect(),
                },
            })
            .map(Arc::new)
            .collect();
        Self { types }
    }
}

type BuiltinPiece = (
    &'static str,
    &'static str,
    Option<&'static str>,
    &'static str,
    &'static [&'static [u8]],
);

const BUILTIN_PIECES: &[BuiltinPiece] = &[
    (
        "user-input",
        "User Input",
        None,
        "text",
        &[
            &[1, 1, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[0, 0, 1, 1, 0, 0],
            &[0, 0, 1, 1, 0, 0],
        ],
    ),
    (
        "ms-office",
        "MS-Office, PDFs",
        None,
        "document",
        &[
            &[1, 1, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[1, 1, 0, 0, 0, 0],
            &[1, 1, 0, 0, 0, 0],
        ],
    ),
    (
        "ligacoes",
        "Ligações, MP3",
        None,
        "audio",
        &[
            &[1, 1, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[0, 0, 0, 0, 1, 1],
            &[0, 0, 0, 0, 1, 1],
        ],
    ),
    (
        "ocr",
        "OCR",
        Some("document"),
        "text",
        &[
            &[0, 0, 1, 1, 1, 1],
            &[0, 0, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[0, 0, 1, 1, 0, 0],
            &[0, 0, 1, 1, 0, 0],
        ],
    ),
    (
        "tts",
        "TTS - texto para fala",
        Some("text"),
        "audio",
        &[
            &[1, 1, 0, 0, 1, 1],
            &[1, 1, 0, 0, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[0, 0, 0, 0, 1, 1],
            &[0, 0, 0, 0, 1, 1],
        ],
    ),
    (
        "stt",
        "STT - Fala para texto",
        Some("audio"),
        "text",
        &[
            &[1, 1, 1, 1, 0, 0],
            &[1, 1, 1, 1, 0, 0],
            &[1, 1, 1, 1, 1, 1],
            &[0, 0, 1, 1, 0, 0],
            &[0, 0, 1, 1, 0, 0],
        ],
    ),
    (
        "gerador-texto",
        "gerador de texto",
        Some("text"),
        "text",
        &[
            &[1, 1, 0, 0, 1, 1],
            &[1, 1, 0, 0, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[0, 0, 1, 1, 0, 0],
            &[0, 0, 1, 1, 0, 0],
        ],
    ),
    (
        "rag",
        "RAG - Busca bases",
        Some("text"),
        "text",
        &[
            &[1, 1, 0, 0, 1, 1],
            &[1, 1, 0, 0, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[1, 1, 1, 1, 1, 1],
            &[0, 0, 1, 1, 0, 0],
            &[0, 0, 1, 1, 0, 0],
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog_order_and_sources() {
        let catalog = PieceCatalog::builtin();
        assert_eq!(catalog.len(), 8);
        assert_eq!(catalog.list()[0].id, "user-input");
        assert_eq!(catalog.list()[7].id, "rag");

        let sources: Vec<_> = catalog.sources().map(|t| t.id.as_str()).collect();
        assert_eq!(sources, vec!["user-input", "ms-office", "ligacoes"]);
    }

    #[test]
    fn test_builtin_masks_are_six_wide() {
        for piece in PieceCatalog::builtin().list() {
            assert_eq!(piece.mask.width(), 6, "{}", piece.id);
        }
        let ocr = PieceCatalog::builtin().get("ocr").cloned().unwrap();
        assert_eq!(ocr.mask.height(), 5);
        assert!(!ocr.mask.is_solid(0, 0));
        assert!(ocr.mask.is_solid(2, 0));
        assert!(!ocr.mask.is_solid(9, 9));
    }

    #[test]
    fn test_mask_json_round_trip_uses_integers() {
        let mask: Mask = serde_json::from_str("[[1,0],[0,1,1]]").unwrap();
        assert_eq!(mask.solid_cells().collect::<Vec<_>>(), vec![(0, 0), (1, 1), (1, 2)]);
        assert_eq!(serde_json::to_string(&mask).unwrap(), "[[1,0],[0,1,1]]");
    }

    #[test]
    fn test_mask_rejects_bad_cells_and_empty() {
        assert!(serde_json::from_str::<Mask>("[[1,2]]").is_err());
        assert!(serde_json::from_str::<Mask>("[]").is_err());
        assert_eq!(
            Mask::try_from(vec![vec![0, 3]]),
            Err(MaskError::InvalidCell { row: 0, col: 1, value: 3 })
        );
    }

    #[test]
    fn test_piece_type_new_validates_mask() {
        let ocr =
            PieceType::new("ocr2", "OCR", Some("document"), "text", vec![vec![0, 1]]).unwrap();
        assert!(!ocr.is_source());
        assert_eq!(ocr.mask.solid_count(), 1);

        let result = PieceType::new("bad", "Bad", None, "text", vec![vec![1], vec![0, 2]]);
        assert!(matches!(
            result,
            Err(CatalogError::InvalidMask(MaskError::InvalidCell { row: 1, col: 1, value: 2 }))
        ));
        assert!(matches!(
            PieceType::new("none", "None", None, "text", vec![]),
            Err(CatalogError::InvalidMask(MaskError::NoRows))
        ));
    }

    #[test]
    fn test_duplicate_piece_type_rejected() {
        let piece = PieceType {
            id: "dup".to_string(),
            name: "Dup".to_string(),
            input_kind: None,
            output_kind: "text".to_string(),
            mask: Mask::solid(1, 1),
        };
        let result = PieceCatalog::from_types(vec![piece.clone(), piece]);
        assert!(matches!(result, Err(CatalogError::DuplicatePieceType(id)) if id == "dup"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "src", "name": "Source", "inputKind": null, "outputKind": "text", "mask": [[1,1]]}},
                {{"id": "sink", "name": "Sink", "inputKind": "text", "outputKind": "text", "mask": [[0,1],[1,1]]}}
            ]"#
        )
        .unwrap();

        let catalog = PieceCatalog::load_from_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("src").unwrap().is_source());
        assert_eq!(catalog.get("sink").unwrap().input_kind.as_deref(), Some("text"));
    }

    #[test]
    fn test_load_empty_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        assert!(matches!(
            PieceCatalog::load_from_file(file.path()),
            Err(CatalogError::EmptyCatalog)
        ));
    }
}
