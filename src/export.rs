//! Chart exporters: JSON, plain-text grid, crochet instructions and PNG.

use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Cursor;

use crate::chart::Chart;
use crate::color::Color;
use crate::error::ChartError;
use crate::pdf_export::export_chart_pdf;

const CELL_SIZE: u32 = 20;
const PADDING: u32 = 40;
const LEGEND_HEIGHT: u32 = 100;
const LEGEND_ROW_HEIGHT: u32 = 30;
const LEGEND_ITEM_WIDTH: u32 = 150;
const SWATCH_SIZE: u32 = 20;
const GRID_LINE: Rgb<u8> = Rgb([0xcc, 0xcc, 0xcc]);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Text,
    Instructions,
    Png,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Text | ExportFormat::Instructions => "txt",
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, ExportFormat::Png | ExportFormat::Pdf)
    }
}

pub fn export(chart: &Chart, format: ExportFormat) -> Result<Vec<u8>, ChartError> {
    match format {
        ExportFormat::Json => Ok(export_json(chart)?.into_bytes()),
        ExportFormat::Text => Ok(export_text(chart).into_bytes()),
        ExportFormat::Instructions => Ok(generate_instructions(chart).into_bytes()),
        ExportFormat::Png => export_png(chart),
        ExportFormat::Pdf => export_chart_pdf(chart),
    }
}

pub fn export_json(chart: &Chart) -> Result<String, ChartError> {
    Ok(serde_json::to_string_pretty(chart)?)
}

/// Grid of `{sequenceNumber}{colorIndex}` tokens, one line per row.
pub fn export_text(chart: &Chart) -> String {
    let size = chart.grid_size();
    let indices = color_indices(chart);

    let mut text = format!("Crochet Chart - {}x{}\n", size.width, size.height);
    text.push_str(&"=".repeat(50));
    text.push_str("\n\n");

    text.push_str("Colors:\n");
    for (idx, info) in chart.colors().iter().enumerate() {
        text.push_str(&format!("{}. {} ({})\n", idx + 1, info.name, info.hex));
    }
    text.push('\n');

    text.push_str("Chart (numbers represent sequence length):\n");
    for row in chart.cells() {
        for cell in row {
            let color_index = indices.get(&cell.color).copied().unwrap_or(0);
            text.push_str(&format!("{}{} ", cell.sequence_number, color_index));
        }
        text.push('\n');
    }

    text
}

/// Row-by-row instructions, worked bottom to top as crochet rows are.
pub fn generate_instructions(chart: &Chart) -> String {
    let size = chart.grid_size();
    let indices = color_indices(chart);

    let mut out = String::from("Crochet Pattern Instructions\n");
    out.push_str("==========================\n\n");
    out.push_str(&format!("Grid Size: {} x {}\n", size.width, size.height));
    out.push_str(&format!("Total Colors: {}\n\n", chart.colors().len()));

    out.push_str("Color Legend:\n");
    for (idx, info) in chart.colors().iter().enumerate() {
        out.push_str(&format!(
            "{}. {} ({}) - {}\n",
            idx + 1,
            info.name,
            info.hex,
            info.yarn_suggestion
        ));
    }

    out.push_str("\nRow-by-Row Instructions:\n");
    out.push_str("=======================\n\n");

    for (offset, row) in chart.cells().iter().rev().enumerate() {
        let stitches = row
            .iter()
            .map(|cell| {
                let color_index = indices.get(&cell.color).copied().unwrap_or(0);
                format!("{} {}", cell.sequence_number, color_index)
            })
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("Row {}: {}\n", offset + 1, stitches));
    }

    out
}

/// Filled, bordered cells with their sequence numbers, above a legend strip
/// of swatches numbered in catalog order.
pub fn render_png(chart: &Chart) -> Result<RgbImage, ChartError> {
    let width = chart.width() as u32;
    let height = chart.height() as u32;
    if width == 0 || height == 0 {
        return Err(ChartError::EmptyGrid);
    }

    let canvas_width = width * CELL_SIZE + PADDING * 2;
    let per_row = ((canvas_width - PADDING * 2) / LEGEND_ITEM_WIDTH).max(1) as usize;
    let legend_rows = chart.colors().len().div_ceil(per_row).max(1) as u32;
    let legend_height = LEGEND_HEIGHT + (legend_rows - 1) * LEGEND_ROW_HEIGHT;
    let canvas_height = height * CELL_SIZE + PADDING * 2 + legend_height;

    let mut canvas = RgbImage::from_pixel(canvas_width, canvas_height, Rgb([255, 255, 255]));

    for (row, cells) in chart.cells().iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            let x = (col as u32 * CELL_SIZE + PADDING) as i32;
            let y = (row as u32 * CELL_SIZE + PADDING) as i32;
            let rect = Rect::at(x, y).of_size(CELL_SIZE, CELL_SIZE);
            draw_filled_rect_mut(&mut canvas, rect, Rgb(cell.color.rgb()));
            draw_hollow_rect_mut(&mut canvas, rect, GRID_LINE);
            draw_number(
                &mut canvas,
                &cell.sequence_number.to_string(),
                x + CELL_SIZE as i32 / 2,
                y + CELL_SIZE as i32 / 2,
                cell.color.contrast_ink(),
            );
        }
    }

    let legend_top = canvas_height - legend_height + 30;
    for (idx, info) in chart.colors().iter().enumerate() {
        let x = (PADDING + (idx % per_row) as u32 * LEGEND_ITEM_WIDTH) as i32;
        let y = (legend_top + (idx / per_row) as u32 * LEGEND_ROW_HEIGHT) as i32;
        let swatch = Rect::at(x, y).of_size(SWATCH_SIZE, SWATCH_SIZE);
        draw_filled_rect_mut(&mut canvas, swatch, Rgb(info.hex.rgb()));
        draw_hollow_rect_mut(&mut canvas, swatch, GRID_LINE);
        draw_number(
            &mut canvas,
            &(idx + 1).to_string(),
            x + SWATCH_SIZE as i32 + 12,
            y + SWATCH_SIZE as i32 / 2,
            Color::BLACK,
        );
    }

    Ok(canvas)
}

pub fn export_png(chart: &Chart) -> Result<Vec<u8>, ChartError> {
    let canvas = render_png(chart)?;
    let mut bytes = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| ChartError::Encode(e.to_string()))?;
    Ok(bytes)
}

fn color_indices(chart: &Chart) -> HashMap<Color, usize> {
    chart
        .colors()
        .iter()
        .enumerate()
        .map(|(idx, info)| (info.hex, idx + 1))
        .collect()
}

/// Draws `value` centred on `(cx, cy)` with the 3x5 digit font.
fn draw_number(canvas: &mut RgbImage, value: &str, cx: i32, cy: i32, ink: Color) {
    let (dots, width) = digit_dots(value);
    if dots.is_empty() {
        return;
    }
    // one- and two-digit runs fit a 20 px cell at double size
    let scale: i32 = if width <= 7 { 2 } else { 1 };
    let left = cx - width as i32 * scale / 2;
    let top = cy - 5 * scale / 2;

    for (col, row) in dots {
        let rect = Rect::at(left + col as i32 * scale, top + row as i32 * scale)
            .of_size(scale as u32, scale as u32);
        draw_filled_rect_mut(canvas, rect, Rgb(ink.rgb()));
    }
}

/// Lit dots of `value` in the digit font as `(column, row)`, row 0 on top,
/// with the overall width in dots. Glyphs sit one blank column apart and
/// non-digits are skipped.
pub(crate) fn digit_dots(value: &str) -> (Vec<(u32, u32)>, u32) {
    let mut dots = Vec::new();
    let mut advance = 0u32;
    for glyph in value.chars().filter_map(digit_glyph) {
        for (row, bits) in glyph.iter().enumerate() {
            for (col, bit) in bits.bytes().enumerate() {
                if bit == b'1' {
                    dots.push((advance + col as u32, row as u32));
                }
            }
        }
        advance += 4;
    }
    (dots, advance.saturating_sub(1))
}

/// 3x5 bitmap digits, top row first.
fn digit_glyph(ch: char) -> Option<[&'static str; 5]> {
    let glyph = match ch {
        '0' => ["111", "101", "101", "101", "111"],
        '1' => ["010", "110", "010", "010", "111"],
        '2' => ["111", "001", "111", "100", "111"],
        '3' => ["111", "001", "111", "001", "111"],
        '4' => ["101", "101", "111", "001", "001"],
        '5' => ["111", "100", "111", "001", "111"],
        '6' => ["111", "100", "111", "101", "111"],
        '7' => ["111", "001", "010", "010", "010"],
        '8' => ["111", "101", "111", "101", "111"],
        '9' => ["111", "101", "111", "001", "111"],
        _ => return None,
    };
    Some(glyph)
}
