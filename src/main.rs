use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crochet_chart::export::export;
use crochet_chart::image_processor::{image_dimensions, suggest_grid_size};
use crochet_chart::pdf_export::{export_chart_pdf_with, PdfOptions};
use crochet_chart::{
    apply_edits, generate_chart_from_image, ChartConfig, Color, Edit, ExportFormat, GridSize,
    ImageResampler,
};

#[derive(Parser)]
#[command(
    name = "crochet-chart",
    version,
    about = "Turn an image into a color-reduced crochet chart",
    after_help = "Examples:
  crochet-chart fox.png                                Text chart, 30x30, 6 colors
  crochet-chart fox.png --suggest --format instructions
  crochet-chart fox.png --width 40 --height 50 -c 8 --format png -o fox.png
  crochet-chart fox.png --replace '#ff0000=#aa0000' --recolor 0,3,#000000
  crochet-chart fox.png --config chart.json --format pdf -o fox.pdf"
)]
struct Args {
    /// Source image (PNG, JPEG, GIF, BMP, WebP)
    image: PathBuf,

    /// Chart width in stitches
    #[arg(long, value_name = "STITCHES")]
    width: Option<u32>,

    /// Chart height in stitches
    #[arg(long, value_name = "STITCHES")]
    height: Option<u32>,

    /// Size the chart from the image's aspect ratio
    #[arg(long, conflicts_with_all = ["width", "height"])]
    suggest: bool,

    /// Upper bound on chart colors (2-20)
    #[arg(short = 'c', long, value_name = "N")]
    max_colors: Option<usize>,

    /// Keep every resampled color instead of reducing the palette
    #[arg(long)]
    detailed: bool,

    /// Chart a black and white silhouette
    #[arg(long)]
    outline: bool,

    /// JSON settings file; flags given here take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Swap a color before the chart is built
    #[arg(long = "override", value_name = "OLD=NEW", value_parser = parse_color_pair)]
    overrides: Vec<(Color, Color)>,

    /// Replace every cell of one color after generation
    #[arg(long, value_name = "OLD=NEW", value_parser = parse_color_pair)]
    replace: Vec<(Color, Color)>,

    /// Recolor a single cell after generation (zero-based row and column)
    #[arg(long, value_name = "ROW,COL,HEX", value_parser = parse_recolor)]
    recolor: Vec<Edit>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Text)]
    format: ExportFormat,

    /// Output file (stdout for textual formats when omitted)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Title printed on the PDF chart page
    #[arg(long)]
    title: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crochet_chart=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse();

    if args.output.is_none() && args.format.is_binary() {
        bail!(
            "{} output is binary; pass -o/--output with a file path",
            args.format.extension()
        );
    }

    let image_bytes = fs::read(&args.image)
        .with_context(|| format!("Failed to read image {}", args.image.display()))?;

    let config = build_config(&args, &image_bytes)?;
    let chart = generate_chart_from_image(&image_bytes, &config, &ImageResampler::default())
        .context("Failed to generate chart")?;

    let edits: Vec<Edit> = args
        .replace
        .iter()
        .map(|&(from, to)| Edit::Replace { from, to })
        .chain(args.recolor.iter().copied())
        .collect();
    let chart = apply_edits(&chart, &edits).context("Failed to apply chart edits")?;

    let stats = chart.statistics();
    log::info!(
        "Chart ready: {} stitches, {} colors, average run {:.2}",
        stats.total_stitches,
        stats.color_breakdown.len(),
        stats.average_sequence_length
    );

    let bytes = match (args.format, &args.title) {
        (ExportFormat::Pdf, Some(title)) => {
            let options = PdfOptions {
                title: title.clone(),
                ..PdfOptions::default()
            };
            export_chart_pdf_with(&chart, &options)?
        }
        (format, _) => export(&chart, format)?,
    };

    match &args.output {
        Some(path) => fs::write(path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => std::io::stdout()
            .write_all(&bytes)
            .context("Failed to write to stdout")?,
    }

    Ok(())
}

fn build_config(args: &Args, image_bytes: &[u8]) -> Result<ChartConfig> {
    let mut config = match &args.config {
        Some(path) => ChartConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ChartConfig::default(),
    };

    if args.suggest {
        let (width, height) = image_dimensions(image_bytes).context("Failed to read image")?;
        config.grid_size = suggest_grid_size(width, height)?;
    } else {
        config.grid_size = GridSize {
            width: args.width.unwrap_or(config.grid_size.width),
            height: args.height.unwrap_or(config.grid_size.height),
        };
    }

    if let Some(max_colors) = args.max_colors {
        config.max_colors = max_colors;
    }
    config.detailed_mode |= args.detailed;
    config.outline_mode |= args.outline;
    config.color_overrides.extend(args.overrides.iter().copied());

    Ok(config.normalized()?)
}

fn parse_color_pair(raw: &str) -> Result<(Color, Color), String> {
    let (old, new) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected OLD=NEW, got '{raw}'"))?;
    let old: Color = old.trim().parse().map_err(|e| format!("{e}"))?;
    let new: Color = new.trim().parse().map_err(|e| format!("{e}"))?;
    Ok((old, new))
}

fn parse_recolor(raw: &str) -> Result<Edit, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [row, col, hex] = parts.as_slice() else {
        return Err(format!("expected ROW,COL,HEX, got '{raw}'"));
    };
    let row = row
        .parse()
        .map_err(|_| format!("invalid row '{row}'"))?;
    let col = col
        .parse()
        .map_err(|_| format!("invalid column '{col}'"))?;
    let color = hex.parse().map_err(|e| format!("{e}"))?;
    Ok(Edit::Recolor { row, col, color })
}
