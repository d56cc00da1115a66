use serde::Deserialize;
use std::fmt::Write;

use crate::chart::Chart;
use crate::color::Color;
use crate::error::ChartError;
use crate::export::digit_dots;

/// Below this cell size the sequence numbers are unreadable and skipped.
const MIN_NUMBERED_CELL_PT: f32 = 6.0;
const MARGIN_PT: f32 = 40.0;
const HEADER_PT: f32 = 110.0;
const FOOTER_PT: f32 = 56.0;
const LEGEND_ROW_PT: f32 = 16.0;

#[derive(Debug, Deserialize, Copy, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PdfPageSize {
    #[default]
    A4,
    Letter,
}

impl PdfPageSize {
    /// Width and height in points.
    fn points(self) -> (f32, f32) {
        match self {
            PdfPageSize::A4 => (595.0, 842.0),
            PdfPageSize::Letter => (612.0, 792.0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PdfOptions {
    pub title: String,
    pub page_size: PdfPageSize,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            title: "Crochet Chart".to_string(),
            page_size: PdfPageSize::A4,
        }
    }
}

pub fn export_chart_pdf(chart: &Chart) -> Result<Vec<u8>, ChartError> {
    export_chart_pdf_with(chart, &PdfOptions::default())
}

/// Two pages: the colored chart with sequence numbers, then the yarn legend.
pub fn export_chart_pdf_with(chart: &Chart, options: &PdfOptions) -> Result<Vec<u8>, ChartError> {
    if chart.width() == 0 || chart.height() == 0 {
        return Err(ChartError::EmptyGrid);
    }

    let (page_width, page_height) = options.page_size.points();
    let layout = ChartLayout::fit(chart, page_width, page_height);
    let pages = [
        chart_page(chart, &options.title, &layout, page_height),
        legend_page(chart, page_width, page_height),
    ];

    log::debug!(
        "Rendered {}x{} chart to PDF, cell {:.2}pt",
        chart.width(),
        chart.height(),
        layout.cell
    );

    let mut doc = PdfDocument::new(page_width, page_height);
    for content in &pages {
        doc.add_page(content);
    }
    Ok(doc.finish())
}

/// Square cells centred in the area between the header and footer bands.
struct ChartLayout {
    cell: f32,
    left: f32,
    bottom: f32,
    columns: usize,
    rows: usize,
}

impl ChartLayout {
    fn fit(chart: &Chart, page_width: f32, page_height: f32) -> Self {
        let (columns, rows) = (chart.width(), chart.height());
        let avail_w = page_width - 2.0 * MARGIN_PT;
        let avail_h = page_height - HEADER_PT - FOOTER_PT;
        let cell = (avail_w / columns as f32)
            .min(avail_h / rows as f32)
            .max(0.8);
        let left = ((page_width - cell * columns as f32) / 2.0).max(20.0);
        let bottom = FOOTER_PT + ((avail_h - cell * rows as f32) / 2.0).max(0.0);
        Self {
            cell,
            left,
            bottom,
            columns,
            rows,
        }
    }

    fn width(&self) -> f32 {
        self.cell * self.columns as f32
    }

    fn height(&self) -> f32 {
        self.cell * self.rows as f32
    }

    /// Lower-left corner of a cell. Row 0 is drawn at the top of the page.
    fn corner(&self, row: usize, col: usize) -> (f32, f32) {
        (
            self.left + col as f32 * self.cell,
            self.bottom + (self.rows - 1 - row) as f32 * self.cell,
        )
    }
}

fn chart_page(chart: &Chart, title: &str, layout: &ChartLayout, page_height: f32) -> String {
    let mut ops = String::from("0 0 0 rg\n");
    ops.push_str(&text_op(MARGIN_PT, page_height - 56.0, 20.0, title));
    ops.push_str(&text_op(
        MARGIN_PT,
        page_height - 76.0,
        10.0,
        &format!(
            "Numbers give the run length of each color | {} x {} stitches | {} colors",
            chart.width(),
            chart.height(),
            chart.colors().len()
        ),
    ));

    let numbered = layout.cell >= MIN_NUMBERED_CELL_PT;
    for (row, cells) in chart.cells().iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            let (x, y) = layout.corner(row, col);
            let _ = writeln!(
                ops,
                "{} {:.3} {:.3} {:.3} {:.3} re f",
                fill(cell.color),
                x,
                y,
                layout.cell,
                layout.cell
            );
            if numbered {
                let ink = if cell.color.contrast_ink() == Color::BLACK { 0.0 } else { 1.0 };
                ops.push_str(&number_op(
                    &cell.sequence_number.to_string(),
                    x + layout.cell / 2.0,
                    y + layout.cell / 2.0,
                    layout.cell / 2.0,
                    ink,
                ));
            }
        }
    }

    // #cccccc rules between cells, then a dark frame
    ops.push_str("0.8 0.8 0.8 RG 0.25 w\n");
    let (top, right) = (layout.bottom + layout.height(), layout.left + layout.width());
    for col in 0..=layout.columns {
        let x = layout.left + col as f32 * layout.cell;
        let _ = writeln!(ops, "{x:.3} {:.3} m {x:.3} {top:.3} l S", layout.bottom);
    }
    for row in 0..=layout.rows {
        let y = layout.bottom + row as f32 * layout.cell;
        let _ = writeln!(ops, "{:.3} {y:.3} m {right:.3} {y:.3} l S", layout.left);
    }
    let _ = writeln!(
        ops,
        "0.18 0.18 0.18 RG 0.8 w {:.3} {:.3} {:.3} {:.3} re S",
        layout.left,
        layout.bottom,
        layout.width(),
        layout.height()
    );

    ops.push_str("0 0 0 rg\n");
    ops.push_str(&text_op(MARGIN_PT, 28.0, 8.0, "Crochet Chart | Page 1 of 2"));
    ops
}

fn legend_page(chart: &Chart, page_width: f32, page_height: f32) -> String {
    let mut ops = String::from("0 0 0 rg\n");
    ops.push_str(&text_op(MARGIN_PT, page_height - 56.0, 20.0, "Color Legend"));
    ops.push_str(&text_op(
        MARGIN_PT,
        page_height - 76.0,
        10.0,
        "Color swatches, yarn suggestions, and stitch counts",
    ));

    let first_row = page_height - 108.0;
    let capacity = ((first_row - 52.0) / LEGEND_ROW_PT).floor().max(1.0) as usize;
    let total: usize = chart.colors().iter().map(|info| info.count).sum();

    for (idx, info) in chart.colors().iter().take(capacity).enumerate() {
        let baseline = first_row - idx as f32 * LEGEND_ROW_PT;
        let share = if total > 0 {
            info.count as f32 * 100.0 / total as f32
        } else {
            0.0
        };

        let _ = writeln!(
            ops,
            "{} {MARGIN_PT:.3} {:.3} 10 10 re f",
            fill(info.hex),
            baseline - 9.0
        );
        let _ = writeln!(
            ops,
            "0.2 0.2 0.2 RG 0.4 w {MARGIN_PT:.3} {:.3} 10 10 re S",
            baseline - 9.0
        );
        ops.push_str("0 0 0 rg\n");
        ops.push_str(&text_op(
            MARGIN_PT + 16.0,
            baseline - 1.0,
            9.0,
            &format!("{}. {} ({})", idx + 1, info.name, info.hex),
        ));
        ops.push_str(&text_op(
            MARGIN_PT + 220.0,
            baseline - 1.0,
            8.0,
            &info.yarn_suggestion,
        ));
        ops.push_str(&text_op(
            page_width - 130.0,
            baseline - 1.0,
            8.0,
            &format!("{} st | {:.1}%", info.count, share),
        ));
    }

    if chart.colors().len() > capacity {
        ops.push_str(&text_op(
            MARGIN_PT,
            38.0,
            8.0,
            "Legend truncated for page layout. Export text for the full list.",
        ));
    }

    ops.push_str(&text_op(MARGIN_PT, 24.0, 8.0, "Crochet Chart | Page 2 of 2"));
    ops
}

fn fill(color: Color) -> String {
    let [r, g, b] = color.rgb();
    format!(
        "{:.3} {:.3} {:.3} rg",
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0
    )
}

fn text_op(x: f32, y: f32, size: f32, text: &str) -> String {
    format!(
        "BT /F1 {size:.1} Tf {x:.2} {y:.2} Td ({}) Tj ET\n",
        pdf_literal(text)
    )
}

/// Sequence number in the dot font, centred on `(cx, cy)`, `height` tall.
fn number_op(value: &str, cx: f32, cy: f32, height: f32, gray: f32) -> String {
    let (dots, width) = digit_dots(value);
    if dots.is_empty() {
        return String::new();
    }
    let dot = (height / 5.0).max(0.35);
    let left = cx - width as f32 * dot / 2.0;
    let bottom = cy - 2.5 * dot;

    let mut ops = format!("{gray:.3} {gray:.3} {gray:.3} rg\n");
    for (col, row) in dots {
        let _ = writeln!(
            ops,
            "{:.3} {:.3} {dot:.3} {dot:.3} re f",
            left + col as f32 * dot,
            bottom + (4 - row) as f32 * dot
        );
    }
    ops
}

/// Text for a PDF literal string: printable ASCII only, delimiters escaped.
fn pdf_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(ch);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// PDF 1.4 file with one shared Helvetica resource and equally sized pages.
///
/// Object 1 is the catalog, 2 the page tree, 3 the font; pages and their
/// content streams follow in pairs.
struct PdfDocument {
    media_box: String,
    objects: Vec<Vec<u8>>,
    page_ids: Vec<usize>,
}

impl PdfDocument {
    const CATALOG: usize = 1;
    const PAGES: usize = 2;
    const FONT: usize = 3;

    fn new(width: f32, height: f32) -> Self {
        Self {
            media_box: format!("[0 0 {width:.1} {height:.1}]"),
            objects: vec![
                Vec::new(),
                Vec::new(),
                b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_vec(),
            ],
            page_ids: Vec::new(),
        }
    }

    fn push(&mut self, body: Vec<u8>) -> usize {
        self.objects.push(body);
        self.objects.len()
    }

    fn add_page(&mut self, content: &str) {
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content.as_bytes());
        stream.extend_from_slice(b"endstream");
        let content_id = self.push(stream);

        let page = format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox {} /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
            Self::PAGES,
            self.media_box,
            Self::FONT,
            content_id
        );
        let page_id = self.push(page.into_bytes());
        self.page_ids.push(page_id);
    }

    fn finish(mut self) -> Vec<u8> {
        let kids: Vec<String> = self.page_ids.iter().map(|id| format!("{id} 0 R")).collect();
        self.objects[Self::CATALOG - 1] =
            format!("<< /Type /Catalog /Pages {} 0 R >>", Self::PAGES).into_bytes();
        self.objects[Self::PAGES - 1] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            self.page_ids.len()
        )
        .into_bytes();

        let mut out = b"%PDF-1.4\n%CrochetChart\n".to_vec();
        let mut offsets = Vec::with_capacity(self.objects.len());
        for (idx, body) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", idx + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_at = out.len();
        let size = self.objects.len() + 1;
        let mut table = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for offset in offsets {
            let _ = write!(table, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            table,
            "trailer\n<< /Size {size} /Root {} 0 R >>\nstartxref\n{xref_at}\n%%EOF",
            Self::CATALOG
        );
        out.extend_from_slice(table.as_bytes());
        out
    }
}
