//! Frequency-ranked palette reduction.
//!
//! The palette is the `effective_cap` most frequent colors of the grid, and
//! every sample is remapped to its nearest palette entry by squared RGB
//! distance. The selection is fully deterministic:
//! identical input always yields an identical grid.

use rayon::prelude::*;
use serde::Serialize;

use crate::color::{Color, ColorGrid};

/// Lower bound on the reduced palette, whatever the caller asks for.
pub const MIN_PALETTE_SIZE: usize = 2;

/// Result of a reduction pass, including the palette it settled on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reduction {
    pub grid: ColorGrid,
    pub palette: Vec<Color>,
    pub distinct_count: usize,
    pub effective_cap: usize,
}

/// Reduces `grid` to at most the effective cap of colors.
///
/// In detailed mode the grid is returned untouched, even when it holds more
/// than `max_colors` distinct colors.
pub fn reduce(grid: &ColorGrid, max_colors: usize, detailed_mode: bool) -> ColorGrid {
    if detailed_mode {
        log::debug!("Detailed mode: skipping palette reduction");
        return grid.clone();
    }
    reduce_to_palette(grid, max_colors).grid
}

/// `max(2, min(max_colors, distinct_count / 2))`
pub fn effective_cap(max_colors: usize, distinct_count: usize) -> usize {
    MIN_PALETTE_SIZE.max(max_colors.min(distinct_count / 2))
}

pub fn reduce_to_palette(grid: &ColorGrid, max_colors: usize) -> Reduction {
    if grid.is_empty() {
        return Reduction {
            grid: grid.clone(),
            palette: Vec::new(),
            distinct_count: 0,
            effective_cap: 0,
        };
    }

    let ranked = grid.frequencies();
    let distinct_count = ranked.len();
    let cap = effective_cap(max_colors, distinct_count);
    let palette: Vec<Color> = ranked.into_iter().take(cap).map(|(color, _)| color).collect();

    log::debug!(
        "Reducing {} distinct colors: requested={} effective_cap={} palette={}",
        distinct_count,
        max_colors,
        cap,
        palette.len()
    );

    // Assign every sample to its nearest palette entry (parallel, order preserving)
    let rows: Vec<Vec<Color>> = grid
        .rows()
        .par_iter()
        .map(|row| row.iter().map(|c| nearest_color(*c, &palette)).collect())
        .collect();

    Reduction {
        grid: ColorGrid::from_rows_unchecked(rows),
        palette,
        distinct_count,
        effective_cap: cap,
    }
}

/// Nearest palette entry by squared RGB distance.
///
/// Ties go to the entry that comes first in `palette`. Returns `target`
/// itself when the palette is empty.
pub fn nearest_color(target: Color, palette: &[Color]) -> Color {
    let Some(first) = palette.first() else {
        return target;
    };
    let mut closest = *first;
    let mut min_distance = target.distance_sq(first);

    for candidate in &palette[1..] {
        let distance = target.distance_sq(candidate);
        if distance < min_distance {
            min_distance = distance;
            closest = *candidate;
        }
    }

    closest
}
