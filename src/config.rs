use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::color::{Color, ColorGrid, GridSize};
use crate::error::ChartError;

pub const MIN_MAX_COLORS: usize = 2;
pub const MAX_MAX_COLORS: usize = 20;

/// Chart generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartConfig {
    pub grid_size: GridSize,
    pub max_colors: usize,
    /// Skip palette reduction and keep every resampled color.
    pub detailed_mode: bool,
    /// Threshold samples to a black and white silhouette before charting.
    pub outline_mode: bool,
    /// Colors to swap after reduction, keyed by the color they replace.
    pub color_overrides: BTreeMap<Color, Color>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            grid_size: GridSize {
                width: 30,
                height: 30,
            },
            max_colors: 6,
            detailed_mode: false,
            outline_mode: false,
            color_overrides: BTreeMap::new(),
        }
    }
}

impl ChartConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ChartError> {
        let raw = fs::read_to_string(path)?;
        let config: ChartConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Validates the grid size and clamps `max_colors` to the supported range.
    pub fn normalized(mut self) -> Result<Self, ChartError> {
        self.grid_size = GridSize::new(self.grid_size.width, self.grid_size.height)?;
        self.max_colors = self.max_colors.clamp(MIN_MAX_COLORS, MAX_MAX_COLORS);
        Ok(self)
    }

    pub fn apply_overrides(&self, grid: &ColorGrid) -> ColorGrid {
        if self.color_overrides.is_empty() {
            return grid.clone();
        }
        grid.map(|color| self.color_overrides.get(&color).copied().unwrap_or(color))
    }
}
