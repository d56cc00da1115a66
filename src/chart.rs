//! Chart builder: run-length cells paired with their color catalog.
//!
//! A [`Chart`] is an immutable value. Its `colors` are always computed from
//! the same grid as its `cells`; there is no way to construct one with a
//! stale catalog, including through deserialization.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::{catalog, ColorInfo};
use crate::color::{Color, ColorGrid, GridSize};
use crate::error::ChartError;

/// One stitch of the chart.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub color: Color,
    /// Consecutive same-color cells ending here, counted from the left.
    pub sequence_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ChartDocument")]
pub struct Chart {
    cells: Vec<Vec<Cell>>,
    colors: Vec<ColorInfo>,
    grid_size: GridSize,
    max_colors: usize,
}

/// Wire shape of a chart. Only the cell colors are trusted on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartDocument {
    cells: Vec<Vec<Cell>>,
    grid_size: GridSize,
    max_colors: usize,
}

impl TryFrom<ChartDocument> for Chart {
    type Error = ChartError;

    fn try_from(doc: ChartDocument) -> Result<Self, Self::Error> {
        let rows = doc
            .cells
            .into_iter()
            .map(|row| row.into_iter().map(|cell| cell.color).collect())
            .collect();
        let grid = ColorGrid::new(rows)?;
        if grid.size() != doc.grid_size {
            return Err(ChartError::GridSizeMismatch {
                expected: doc.grid_size,
                found: grid.size(),
            });
        }
        Ok(Chart::build(&grid, doc.grid_size, doc.max_colors))
    }
}

impl Chart {
    /// Builds the run-length cells and the catalog from the same grid.
    ///
    /// `grid_size` must be the size of `grid`.
    pub fn build(grid: &ColorGrid, grid_size: GridSize, max_colors: usize) -> Self {
        debug_assert_eq!(grid.size(), grid_size);
        Self {
            cells: build_cells(grid),
            colors: catalog(grid),
            grid_size,
            max_colors,
        }
    }

    pub fn cells(&self) -> &[Vec<Cell>] {
        &self.cells
    }

    pub fn colors(&self) -> &[ColorInfo] {
        &self.colors
    }

    pub fn grid_size(&self) -> GridSize {
        self.grid_size
    }

    pub fn max_colors(&self) -> usize {
        self.max_colors
    }

    pub fn width(&self) -> usize {
        self.cells.first().map(Vec::len).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row).and_then(|cells| cells.get(col))
    }

    /// Drops the sequence numbers, keeping only the colors.
    pub fn to_grid(&self) -> ColorGrid {
        ColorGrid::from_rows_unchecked(
            self.cells
                .iter()
                .map(|row| row.iter().map(|cell| cell.color).collect())
                .collect(),
        )
    }

    /// 1-based position of `color` in the catalog.
    pub fn color_index(&self, color: Color) -> Option<usize> {
        self.colors
            .iter()
            .position(|info| info.hex == color)
            .map(|idx| idx + 1)
    }

    pub fn statistics(&self) -> ChartStatistics {
        let mut total_stitches = 0usize;
        let mut total_sequence_length = 0u64;
        let mut sequence_count = 0usize;

        for cell in self.cells.iter().flatten() {
            total_stitches += 1;
            total_sequence_length += cell.sequence_number as u64;
            if cell.sequence_number == 1 {
                sequence_count += 1;
            }
        }

        let color_breakdown = self
            .colors
            .iter()
            .map(|info| ColorBreakdown {
                name: info.name.clone(),
                hex: info.hex,
                count: info.count,
                percentage: if total_stitches > 0 {
                    info.count as f64 / total_stitches as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        let average = if sequence_count > 0 {
            total_sequence_length as f64 / sequence_count as f64
        } else {
            0.0
        };

        ChartStatistics {
            total_stitches,
            color_breakdown,
            average_sequence_length: (average * 100.0).round() / 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartStatistics {
    pub total_stitches: usize,
    pub color_breakdown: Vec<ColorBreakdown>,
    pub average_sequence_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorBreakdown {
    pub name: String,
    pub hex: Color,
    pub count: usize,
    pub percentage: f64,
}

/// Run-length cells for every row. Rows are independent: a run never
/// continues from the end of one row into the next.
pub fn build_cells(grid: &ColorGrid) -> Vec<Vec<Cell>> {
    grid.rows().par_iter().map(|row| build_row(row)).collect()
}

fn build_row(row: &[Color]) -> Vec<Cell> {
    let mut current: Option<Color> = None;
    let mut sequence_number = 0u32;

    row.iter()
        .map(|&color| {
            if current != Some(color) {
                current = Some(color);
                sequence_number = 1;
            } else {
                sequence_number += 1;
            }
            Cell {
                color,
                sequence_number,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Color {
        Color::new(255, 0, 0)
    }

    fn blue() -> Color {
        Color::new(0, 0, 255)
    }

    fn cell(color: Color, sequence_number: u32) -> Cell {
        Cell {
            color,
            sequence_number,
        }
    }

    fn two_by_two() -> ColorGrid {
        ColorGrid::new(vec![vec![red(), red()], vec![blue(), blue()]]).unwrap()
    }

    #[test]
    fn builds_two_by_two_chart() {
        let chart = Chart::build(&two_by_two(), GridSize { width: 2, height: 2 }, 6);
        assert_eq!(
            chart.cells(),
            &[
                vec![cell(red(), 1), cell(red(), 2)],
                vec![cell(blue(), 1), cell(blue(), 2)],
            ]
        );
        let colors: Vec<(Color, usize)> = chart.colors().iter().map(|c| (c.hex, c.count)).collect();
        assert_eq!(colors, vec![(red(), 2), (blue(), 2)]);
        assert_eq!(chart.max_colors(), 6);
    }

    #[test]
    fn sequence_resets_at_each_color_change() {
        let row = vec![red(), red(), blue(), red(), red(), red()];
        let seq: Vec<u32> = build_row(&row).iter().map(|c| c.sequence_number).collect();
        assert_eq!(seq, vec![1, 2, 1, 1, 2, 3]);
    }

    #[test]
    fn runs_do_not_carry_across_rows() {
        let grid = ColorGrid::new(vec![vec![blue(), red()], vec![red(), red()]]).unwrap();
        let cells = build_cells(&grid);
        assert_eq!(cells[1][0], cell(red(), 1));
        assert_eq!(cells[1][1], cell(red(), 2));
    }

    #[test]
    fn flattening_round_trips_the_grid() {
        let grid = two_by_two();
        let chart = Chart::build(&grid, grid.size(), 6);
        assert_eq!(chart.to_grid(), grid);
    }

    #[test]
    fn color_index_is_one_based() {
        let grid = ColorGrid::new(vec![vec![red(), blue(), blue()]]).unwrap();
        let chart = Chart::build(&grid, grid.size(), 6);
        assert_eq!(chart.color_index(blue()), Some(1));
        assert_eq!(chart.color_index(red()), Some(2));
        assert_eq!(chart.color_index(Color::WHITE), None);
    }

    #[test]
    fn statistics_summarize_runs() {
        let grid = ColorGrid::new(vec![vec![red(), red(), blue()], vec![blue(), blue(), blue()]])
            .unwrap();
        let stats = Chart::build(&grid, grid.size(), 6).statistics();
        assert_eq!(stats.total_stitches, 6);
        // sum of sequence numbers 1+2+1 + 1+2+3 = 10 over 3 runs
        assert_eq!(stats.average_sequence_length, 3.33);
        assert_eq!(stats.color_breakdown[0].name, "Blue");
        assert_eq!(stats.color_breakdown[0].count, 4);
        assert!((stats.color_breakdown[1].percentage - 33.333).abs() < 0.01);
    }

    #[test]
    fn statistics_of_empty_chart() {
        let stats = Chart::build(&ColorGrid::default(), GridSize { width: 0, height: 0 }, 6)
            .statistics();
        assert_eq!(stats.total_stitches, 0);
        assert_eq!(stats.average_sequence_length, 0.0);
    }

    #[test]
    fn json_uses_camel_case_and_hex_colors() {
        let chart = Chart::build(&two_by_two(), GridSize { width: 2, height: 2 }, 6);
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["cells"][0][1]["color"], "#ff0000");
        assert_eq!(json["cells"][0][1]["sequenceNumber"], 2);
        assert_eq!(json["gridSize"]["width"], 2);
        assert_eq!(json["maxColors"], 6);
        assert_eq!(json["colors"][1]["yarnSuggestion"], "Matching yarn color");
    }

    #[test]
    fn deserializing_recomputes_derived_fields() {
        let tampered = r##"{
            "cells": [[{"color": "#ff0000", "sequenceNumber": 9},
                       {"color": "#ff0000", "sequenceNumber": 9}]],
            "colors": [],
            "gridSize": {"width": 2, "height": 1},
            "maxColors": 4
        }"##;
        let chart: Chart = serde_json::from_str(tampered).unwrap();
        assert_eq!(chart.cells()[0][1].sequence_number, 2);
        assert_eq!(chart.colors().len(), 1);
        assert_eq!(chart.colors()[0].count, 2);
    }

    #[test]
    fn deserializing_rejects_declared_size_mismatch() {
        let mislabeled = r##"{
            "cells": [[{"color": "#ff0000", "sequenceNumber": 1},
                       {"color": "#ff0000", "sequenceNumber": 2}]],
            "gridSize": {"width": 99, "height": 0},
            "maxColors": 4
        }"##;
        let err = serde_json::from_str::<Chart>(mislabeled).unwrap_err();
        assert!(err.to_string().contains("expected 99x0"), "{err}");

        let swapped = r##"{
            "cells": [[{"color": "#ff0000", "sequenceNumber": 1},
                       {"color": "#ff0000", "sequenceNumber": 2}]],
            "gridSize": {"width": 1, "height": 2},
            "maxColors": 4
        }"##;
        assert!(serde_json::from_str::<Chart>(swapped).is_err());
    }

    #[test]
    fn deserializing_rejects_ragged_cells() {
        let ragged = r##"{
            "cells": [[{"color": "#ff0000", "sequenceNumber": 1}], []],
            "gridSize": {"width": 1, "height": 2},
            "maxColors": 4
        }"##;
        assert!(serde_json::from_str::<Chart>(ragged).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        fn color_grid() -> impl Strategy<Value = ColorGrid> {
            (1usize..10, 1usize..10).prop_flat_map(|(w, h)| {
                prop::collection::vec(
                    prop::collection::vec(
                        (0u8..3, 0u8..3).prop_map(|(r, b)| Color::new(r * 120, 0, b * 120)),
                        w,
                    ),
                    h,
                )
                .prop_map(|rows| ColorGrid::new(rows).unwrap())
            })
        }

        proptest! {
            #[test]
            fn run_lengths_cover_each_row(grid in color_grid()) {
                let width = grid.width() as u32;
                for row in build_cells(&grid) {
                    prop_assert_eq!(row[0].sequence_number, 1);
                    let mut run_total = 0u32;
                    for (idx, cell) in row.iter().enumerate() {
                        prop_assert!(cell.sequence_number >= 1);
                        prop_assert!(cell.sequence_number <= width);
                        let run_ends = row
                            .get(idx + 1)
                            .map_or(true, |next| next.sequence_number == 1);
                        if run_ends {
                            run_total += cell.sequence_number;
                        }
                    }
                    prop_assert_eq!(run_total, width);
                }
            }

            #[test]
            fn catalog_accounts_for_every_cell(grid in color_grid()) {
                let chart = Chart::build(&grid, grid.size(), 6);
                let total: usize = chart.colors().iter().map(|c| c.count).sum();
                prop_assert_eq!(total, grid.width() * grid.height());
                let listed: HashSet<Color> = chart.colors().iter().map(|c| c.hex).collect();
                let present: HashSet<Color> = grid.iter().collect();
                prop_assert_eq!(listed.len(), chart.colors().len());
                prop_assert_eq!(listed, present);
            }

            #[test]
            fn building_is_deterministic(grid in color_grid()) {
                let first = Chart::build(&grid, grid.size(), 6);
                let second = Chart::build(&grid, grid.size(), 6);
                prop_assert_eq!(
                    serde_json::to_string(&first).unwrap(),
                    serde_json::to_string(&second).unwrap()
                );
            }
        }
    }
}
