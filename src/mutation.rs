//! Chart edits.
//!
//! Every edit flattens the chart back to a [`ColorGrid`], changes colors
//! there, and rebuilds the whole chart. Cells are never patched in place, so
//! run lengths and the catalog always match the edited grid. The palette
//! reducer is not re-run: an edited color becomes a regular catalog entry
//! even if that pushes the chart past its original color cap.

use serde::{Deserialize, Serialize};

use crate::chart::Chart;
use crate::color::Color;
use crate::error::ChartError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Edit {
    /// Paint a single cell.
    Recolor { row: usize, col: usize, color: Color },
    /// Swap every cell of one color for another (exact match only).
    Replace { from: Color, to: Color },
}

impl Edit {
    pub fn apply(&self, chart: &Chart) -> Result<Chart, ChartError> {
        match *self {
            Edit::Recolor { row, col, color } => recolor_cell(chart, row, col, color),
            Edit::Replace { from, to } => Ok(replace_color(chart, from, to)),
        }
    }
}

/// Returns a new chart with the cell at `(row, col)` set to `color`.
pub fn recolor_cell(
    chart: &Chart,
    row: usize,
    col: usize,
    color: Color,
) -> Result<Chart, ChartError> {
    let mut grid = chart.to_grid();
    grid.set(row, col, color)?;
    log::debug!("Recolored cell ({}, {}) to {}", row, col, color);
    Ok(Chart::build(&grid, chart.grid_size(), chart.max_colors()))
}

/// Returns a new chart with every `from` cell changed to `to`. A color that
/// is not on the chart leaves an identical chart.
pub fn replace_color(chart: &Chart, from: Color, to: Color) -> Chart {
    let grid = chart
        .to_grid()
        .map(|color| if color == from { to } else { color });
    log::debug!("Replaced {} with {}", from, to);
    Chart::build(&grid, chart.grid_size(), chart.max_colors())
}

/// Applies `edits` in order.
pub fn apply_edits(chart: &Chart, edits: &[Edit]) -> Result<Chart, ChartError> {
    edits
        .iter()
        .try_fold(chart.clone(), |current, edit| edit.apply(&current))
}
