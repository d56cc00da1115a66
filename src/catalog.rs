//! Color catalog: per-color usage metadata for a grid.

use serde::{Deserialize, Serialize};

use crate::color::{Color, ColorGrid};

/// Legend entry for one distinct color of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorInfo {
    pub hex: Color,
    pub name: String,
    pub count: usize,
    pub yarn_suggestion: String,
}

impl ColorInfo {
    pub fn new(color: Color, count: usize) -> Self {
        Self {
            hex: color,
            name: color_name(color),
            count,
            yarn_suggestion: yarn_suggestion(color),
        }
    }
}

/// One entry per distinct color, sorted by count descending; ties keep
/// row-major first-encountered order.
pub fn catalog(grid: &ColorGrid) -> Vec<ColorInfo> {
    grid.frequencies()
        .into_iter()
        .map(|(color, count)| ColorInfo::new(color, count))
        .collect()
}

/// Coarse name for a color. Checks run in order and the first match wins.
pub fn color_name(color: Color) -> String {
    let [r, g, b] = color.rgb();

    if r == g && g == b {
        return match r {
            0 => "Black".to_string(),
            255 => "White".to_string(),
            _ => format!("Gray {}%", (r as f64 / 255.0 * 100.0).round()),
        };
    }

    if r > g && r > b {
        return "Red".to_string();
    }
    if g > r && g > b {
        return "Green".to_string();
    }
    if b > r && b > g {
        return "Blue".to_string();
    }
    if r > 200 && g > 200 && b < 100 {
        return "Yellow".to_string();
    }
    if r > 200 && g < 100 && b > 200 {
        return "Magenta".to_string();
    }
    if r < 100 && g > 200 && b > 200 {
        return "Cyan".to_string();
    }

    format!("Color {}", color)
}

pub fn yarn_suggestion(color: Color) -> String {
    match color {
        Color::BLACK => "Black yarn".to_string(),
        Color::WHITE => "White yarn".to_string(),
        _ => "Matching yarn color".to_string(),
    }
}
