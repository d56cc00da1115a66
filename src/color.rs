//! Color primitives shared by every stage of the chart pipeline.
//!
//! A [`Color`] is an RGB triple whose canonical text form is `#rrggbb`
//! (lowercase, zero padded). A [`ColorGrid`] is the rectangular, row-major
//! matrix of colors handed between the resampler, the reducer and the chart
//! builder.

use palette::Srgb;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ChartError;

/// An RGB color. Two colors are equal iff their `#rrggbb` forms are equal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    rgb: [u8; 3],
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { rgb: [r, g, b] }
    }

    pub fn r(&self) -> u8 {
        self.rgb[0]
    }

    pub fn g(&self) -> u8 {
        self.rgb[1]
    }

    pub fn b(&self) -> u8 {
        self.rgb[2]
    }

    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }

    /// Canonical `#rrggbb` text.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.rgb[0], self.rgb[1], self.rgb[2])
    }

    /// Squared Euclidean distance in RGB space.
    pub fn distance_sq(&self, other: &Color) -> u32 {
        let dr = self.rgb[0] as i32 - other.rgb[0] as i32;
        let dg = self.rgb[1] as i32 - other.rgb[1] as i32;
        let db = self.rgb[2] as i32 - other.rgb[2] as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    /// Relative luminance on a 0..=1 scale using the Rec. 601 weights.
    pub fn luminance(&self) -> f32 {
        let srgb: Srgb<f32> = Srgb::<u8>::from(*self).into_format();
        0.299 * srgb.red + 0.587 * srgb.green + 0.114 * srgb.blue
    }

    /// Ink color for text drawn on top of this color.
    pub fn contrast_ink(&self) -> Color {
        if self.luminance() > 0.5 {
            Color::BLACK
        } else {
            Color::WHITE
        }
    }
}

impl From<Srgb<u8>> for Color {
    fn from(srgb: Srgb<u8>) -> Self {
        Self::new(srgb.red, srgb.green, srgb.blue)
    }
}

impl From<Color> for Srgb<u8> {
    fn from(color: Color) -> Self {
        Srgb::new(color.rgb[0], color.rgb[1], color.rgb[2])
    }
}

impl FromStr for Color {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ChartError::InvalidColor(s.to_string()))?;
        // palette's parser goes through from_str_radix, which also takes a sign
        if !matches!(digits.len(), 3 | 6) || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ChartError::InvalidColor(s.to_string()));
        }
        trimmed
            .parse::<Srgb<u8>>()
            .map(Color::from)
            .map_err(|_| ChartError::InvalidColor(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ChartError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub fn new(width: u32, height: u32) -> Result<Self, ChartError> {
        if width == 0 || height == 0 {
            return Err(ChartError::InvalidGridSize { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rectangular row-major matrix of colors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Color>>", into = "Vec<Vec<Color>>")]
pub struct ColorGrid {
    rows: Vec<Vec<Color>>,
}

impl ColorGrid {
    pub fn new(rows: Vec<Vec<Color>>) -> Result<Self, ChartError> {
        if let Some(first) = rows.first() {
            let expected = first.len();
            for (row, cells) in rows.iter().enumerate() {
                if cells.len() != expected {
                    return Err(ChartError::NonRectangularGrid {
                        row,
                        expected,
                        found: cells.len(),
                    });
                }
            }
        }
        Ok(Self { rows })
    }

    /// For rows derived cell-for-cell from an existing grid.
    pub(crate) fn from_rows_unchecked(rows: Vec<Vec<Color>>) -> Self {
        debug_assert!(rows.windows(2).all(|pair| pair[0].len() == pair[1].len()));
        Self { rows }
    }

    /// Parses rows of `#rrggbb` strings.
    pub fn from_hex_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self, ChartError> {
        let parsed = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|hex| hex.as_ref().parse::<Color>())
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed)
    }

    /// Wraps a flat row-major buffer of `width * height` samples.
    pub fn from_flat(width: usize, height: usize, pixels: Vec<Color>) -> Result<Self, ChartError> {
        if pixels.len() != width * height {
            return Err(ChartError::PixelCountMismatch {
                expected: width * height,
                found: pixels.len(),
            });
        }
        if width == 0 {
            return Ok(Self::default());
        }
        let rows = pixels.chunks(width).map(<[Color]>::to_vec).collect();
        Ok(Self { rows })
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn size(&self) -> GridSize {
        GridSize {
            width: self.width() as u32,
            height: self.height() as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn rows(&self) -> &[Vec<Color>] {
        &self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Color> {
        self.rows.get(row).and_then(|cells| cells.get(col)).copied()
    }

    /// Row-major scan, top row first, left to right.
    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }

    /// Distinct colors with their occurrence counts, most frequent first.
    ///
    /// Ties keep first-encountered order of the row-major scan.
    pub fn frequencies(&self) -> Vec<(Color, usize)> {
        let mut index: HashMap<Color, usize> = HashMap::new();
        let mut counts: Vec<(Color, usize)> = Vec::new();
        for color in self.iter() {
            match index.get(&color) {
                Some(&idx) => counts[idx].1 += 1,
                None => {
                    index.insert(color, counts.len());
                    counts.push((color, 1));
                }
            }
        }
        // sort_by is stable, so equal counts stay in scan order
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Returns a copy with `f` applied to every sample.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(Color) -> Color,
    {
        Self {
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(|color| f(*color)).collect())
                .collect(),
        }
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, color: Color) -> Result<(), ChartError> {
        let size = self.size();
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|cells| cells.get_mut(col))
            .ok_or(ChartError::CellOutOfRange { row, col, size })?;
        *cell = color;
        Ok(())
    }

    pub fn into_rows(self) -> Vec<Vec<Color>> {
        self.rows
    }
}

impl TryFrom<Vec<Vec<Color>>> for ColorGrid {
    type Error = ChartError;

    fn try_from(rows: Vec<Vec<Color>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<ColorGrid> for Vec<Vec<Color>> {
    fn from(grid: ColorGrid) -> Self {
        grid.rows
    }
}
