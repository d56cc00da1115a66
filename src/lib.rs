//! Crochet chart generation.
//!
//! An image is resampled into a [`ColorGrid`], reduced to a small palette,
//! and turned into a [`Chart`]: run-length numbered cells plus a color
//! catalog with yarn suggestions. Charts can be edited and exported as JSON,
//! text, crochet instructions, PNG or PDF.

pub mod catalog;
pub mod chart;
pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod image_processor;
pub mod mutation;
pub mod pdf_export;
pub mod reducer;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

pub use catalog::ColorInfo;
pub use chart::{Cell, Chart, ChartStatistics};
pub use color::{Color, ColorGrid, GridSize};
pub use config::ChartConfig;
pub use error::ChartError;
pub use export::ExportFormat;
pub use image_processor::{ImageResampler, Resampler};
pub use mutation::{apply_edits, recolor_cell, replace_color, Edit};

/// Runs the chart pipeline over an already resampled grid: outline,
/// palette reduction, color overrides, then chart construction.
///
/// The grid must match `config.grid_size` exactly. Either a fully consistent
/// chart comes back or an error does.
pub fn generate_chart(grid: &ColorGrid, config: &ChartConfig) -> Result<Chart, ChartError> {
    if grid.is_empty() {
        return Err(ChartError::EmptyGrid);
    }
    if grid.size() != config.grid_size {
        return Err(ChartError::GridSizeMismatch {
            expected: config.grid_size,
            found: grid.size(),
        });
    }

    log::info!(
        "Generating chart: {} grid, max {} colors, detailed={}, outline={}",
        config.grid_size,
        config.max_colors,
        config.detailed_mode,
        config.outline_mode
    );

    let started = Instant::now();
    let chart = guarded(|| build_pipeline(grid, config))?;

    log::info!(
        "Chart generated: {}x{}, {} colors, {}ms",
        chart.width(),
        chart.height(),
        chart.colors().len(),
        started.elapsed().as_millis()
    );

    Ok(chart)
}

/// Resamples `image_bytes` to `config.grid_size` and generates the chart.
pub fn generate_chart_from_image<R: Resampler>(
    image_bytes: &[u8],
    config: &ChartConfig,
    resampler: &R,
) -> Result<Chart, ChartError> {
    log::info!(
        "Processing image: {} bytes into {} grid",
        image_bytes.len(),
        config.grid_size
    );
    let grid = resampler.resample(image_bytes, config.grid_size)?;
    generate_chart(&grid, config)
}

fn build_pipeline(grid: &ColorGrid, config: &ChartConfig) -> Chart {
    let stage_start = Instant::now();
    let source = if config.outline_mode {
        image_processor::outline(grid)
    } else {
        grid.clone()
    };
    let reduced = reducer::reduce(&source, config.max_colors, config.detailed_mode);
    let reduce_ms = stage_start.elapsed().as_millis();

    let stage_start = Instant::now();
    let finished = config.apply_overrides(&reduced);
    let chart = Chart::build(&finished, config.grid_size, config.max_colors);
    let build_ms = stage_start.elapsed().as_millis();

    log::debug!(
        "Pipeline timings: reduce={}ms build={}ms",
        reduce_ms,
        build_ms
    );

    chart
}

/// Last line of defence behind the up-front input checks: a panic anywhere
/// in `stage` becomes `ChartError::Generation` instead of unwinding into the
/// caller, so no partially built chart escapes.
fn guarded<T>(stage: impl FnOnce() -> T) -> Result<T, ChartError> {
    panic::catch_unwind(AssertUnwindSafe(stage))
        .map_err(|payload| ChartError::Generation(panic_message(&*payload)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown error".to_string()
    }
}
