use thiserror::Error;

use crate::color::GridSize;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Grid row {row} has {found} cells, expected {expected}")]
    NonRectangularGrid {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Expected {expected} samples, found {found}")]
    PixelCountMismatch { expected: usize, found: usize },

    #[error("Grid is empty")]
    EmptyGrid,

    #[error("Grid is {found}, expected {expected}")]
    GridSizeMismatch { expected: GridSize, found: GridSize },

    #[error("Invalid grid size: {width}x{height}")]
    InvalidGridSize { width: u32, height: u32 },

    #[error("Invalid color: {0:?} (expected #rrggbb)")]
    InvalidColor(String),

    #[error("Cell ({row}, {col}) is outside the {size} chart")]
    CellOutOfRange { row: usize, col: usize, size: GridSize },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Failed to encode export: {0}")]
    Encode(String),

    #[error("Failed to generate chart: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
