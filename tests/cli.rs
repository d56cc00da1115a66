//! Integration tests for the crochet-chart CLI

use image::{ImageBuffer, Rgb};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_crochet-chart"))
        .args(args)
        .output()
        .expect("failed to execute crochet-chart")
}

/// 4x4 PNG: top half red, bottom half blue.
fn write_two_band_png(dir: &TempDir) -> PathBuf {
    let img = ImageBuffer::from_fn(4, 4, |_, y| {
        if y < 2 {
            Rgb([255u8, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    });
    let path = dir.path().join("bands.png");
    img.save(&path).unwrap();
    path
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn help_lists_options() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("crochet chart"));
    assert!(stdout.contains("--max-colors"));
    assert!(stdout.contains("--recolor"));
    assert!(stdout.contains("--format"));
}

#[test]
fn prints_text_chart_to_stdout() {
    let dir = TempDir::new().unwrap();
    let image = write_two_band_png(&dir);

    let output = run(&[path_str(&image), "--width", "4", "--height", "4"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Crochet Chart - 4x4\n"));
    assert!(stdout.contains("1. Red (#ff0000)\n"));
    assert!(stdout.contains("2. Blue (#0000ff)\n"));
    assert!(stdout.contains("11 21 31 41 \n"));
    assert!(stdout.contains("12 22 32 42 \n"));
}

#[test]
fn instructions_reflect_edits() {
    let dir = TempDir::new().unwrap();
    let image = write_two_band_png(&dir);

    let output = run(&[
        path_str(&image),
        "--width",
        "4",
        "--height",
        "4",
        "--format",
        "instructions",
        "--replace",
        "#ff0000=#000000",
        "--recolor",
        "3,0,#ffffff",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Crochet Pattern Instructions\n"));
    assert!(stdout.contains("Total Colors: 3\n"));
    assert!(stdout.contains("Black (#000000) - Black yarn\n"));
    assert!(stdout.contains("White (#ffffff) - White yarn\n"));
    // bottom row first: white cell then three blue
    assert!(stdout.contains("Row 1: 1 3, 1 2, 2 2, 3 2\n"));
}

#[test]
fn writes_json_file() {
    let dir = TempDir::new().unwrap();
    let image = write_two_band_png(&dir);
    let out = dir.path().join("chart.json");

    let output = run(&[
        path_str(&image),
        "--width",
        "4",
        "--height",
        "4",
        "--format",
        "json",
        "-o",
        path_str(&out),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["gridSize"]["width"], 4);
    assert_eq!(json["maxColors"], 6);
    assert_eq!(json["cells"][3][3]["sequenceNumber"], 4);
    assert_eq!(json["colors"][0]["hex"], "#ff0000");
}

#[test]
fn writes_png_and_pdf_files() {
    let dir = TempDir::new().unwrap();
    let image = write_two_band_png(&dir);
    let png = dir.path().join("chart.png");
    let pdf = dir.path().join("chart.pdf");

    let output = run(&[
        path_str(&image),
        "--width",
        "4",
        "--height",
        "4",
        "--format",
        "png",
        "-o",
        path_str(&png),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let rendered = image::open(&png).unwrap();
    assert_eq!(rendered.width(), 4 * 20 + 80);
    // two legend rows: only one 150 px legend slot fits across a 4-stitch chart
    assert_eq!(rendered.height(), 4 * 20 + 80 + 100 + 30);

    let output = run(&[
        path_str(&image),
        "--format",
        "pdf",
        "--title",
        "Bands",
        "-o",
        path_str(&pdf),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let bytes = std::fs::read(&pdf).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4"));
    assert!(String::from_utf8_lossy(&bytes).contains("(Bands) Tj"));
}

#[test]
fn suggest_sizes_from_image() {
    let dir = TempDir::new().unwrap();
    let image = write_two_band_png(&dir);

    let output = run(&[path_str(&image), "--suggest"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Crochet Chart - 10x10\n"));
}

#[test]
fn reads_settings_from_config_file() {
    let dir = TempDir::new().unwrap();
    let image = write_two_band_png(&dir);
    let config = dir.path().join("chart.json");
    std::fs::write(
        &config,
        r##"{"gridSize": {"width": 4, "height": 4}, "maxColors": 40, "colorOverrides": {"#0000ff": "#00ff00"}}"##,
    )
    .unwrap();

    let output = run(&[path_str(&image), "--config", path_str(&config)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Crochet Chart - 4x4\n"));
    assert!(stdout.contains("Green (#00ff00)"));
}

#[test]
fn binary_format_requires_output_path() {
    let dir = TempDir::new().unwrap();
    let image = write_two_band_png(&dir);

    let output = run(&[path_str(&image), "--format", "png"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--output"));
}

#[test]
fn reports_missing_image() {
    let output = run(&["/nonexistent/picture.png"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read image"));
}

#[test]
fn rejects_out_of_range_recolor() {
    let dir = TempDir::new().unwrap();
    let image = write_two_band_png(&dir);

    let output = run(&[
        path_str(&image),
        "--width",
        "4",
        "--height",
        "4",
        "--recolor",
        "9,0,#000000",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to apply chart edits"));
}
