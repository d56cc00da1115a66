//! Image decoding and resampling into a [`ColorGrid`].
//!
//! The chart core never touches image bytes. It consumes whatever a
//! [`Resampler`] produces, so tests and embedders can inject their own.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::time::Instant;

use crate::color::{Color, ColorGrid, GridSize};
use crate::error::ChartError;

/// Largest accepted upload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const MIN_SUGGESTED_GRID: u32 = 10;
const MAX_SUGGESTED_GRID: u32 = 80;
/// Source pixels per suggested stitch along the dominant axis.
const PIXELS_PER_STITCH: f64 = 20.0;
const OUTLINE_THRESHOLD: f32 = 100.0;

/// Turns encoded image bytes into a dense grid of exactly `grid_size` samples.
pub trait Resampler {
    fn resample(&self, image_bytes: &[u8], grid_size: GridSize) -> Result<ColorGrid, ChartError>;
}

/// [`Resampler`] backed by the `image` crate.
#[derive(Debug, Copy, Clone)]
pub struct ImageResampler {
    pub filter: FilterType,
}

impl Default for ImageResampler {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl Resampler for ImageResampler {
    fn resample(&self, image_bytes: &[u8], grid_size: GridSize) -> Result<ColorGrid, ChartError> {
        let grid_size = GridSize::new(grid_size.width, grid_size.height)?;

        let decode_start = Instant::now();
        let decoded = decode_image(image_bytes)?;
        let decode_ms = decode_start.elapsed().as_millis();

        let resize_start = Instant::now();
        let resized = decoded
            .resize_exact(grid_size.width, grid_size.height, self.filter)
            .to_rgba8();
        // fully transparent pixels read as black whatever RGB they hide;
        // any other alpha is dropped
        let pixels: Vec<Color> = resized
            .pixels()
            .map(|p| match p[3] {
                0 => Color::BLACK,
                _ => Color::new(p[0], p[1], p[2]),
            })
            .collect();
        let resize_ms = resize_start.elapsed().as_millis();

        log::debug!(
            "Resampled {}x{} image to {} grid: decode={}ms resize={}ms",
            decoded.width(),
            decoded.height(),
            grid_size,
            decode_ms,
            resize_ms
        );

        ColorGrid::from_flat(
            grid_size.width as usize,
            grid_size.height as usize,
            pixels,
        )
    }
}

/// Rejects empty and oversized uploads.
pub fn validate_image_bytes(image_bytes: &[u8]) -> Result<(), ChartError> {
    if image_bytes.is_empty() {
        return Err(ChartError::Decode("image is empty".to_string()));
    }
    if image_bytes.len() > MAX_IMAGE_BYTES {
        return Err(ChartError::ImageTooLarge {
            size: image_bytes.len(),
            max: MAX_IMAGE_BYTES,
        });
    }
    Ok(())
}

pub fn decode_image(image_bytes: &[u8]) -> Result<DynamicImage, ChartError> {
    validate_image_bytes(image_bytes)?;
    image::load_from_memory(image_bytes).map_err(|e| ChartError::Decode(e.to_string()))
}

/// Pixel dimensions of an encoded image.
pub fn image_dimensions(image_bytes: &[u8]) -> Result<(u32, u32), ChartError> {
    Ok(decode_image(image_bytes)?.dimensions())
}

/// Black silhouette on white: samples darker than the threshold go black.
pub fn outline(grid: &ColorGrid) -> ColorGrid {
    grid.map(|color| {
        let gray = 0.299 * color.r() as f32 + 0.587 * color.g() as f32 + 0.114 * color.b() as f32;
        if gray < OUTLINE_THRESHOLD {
            Color::BLACK
        } else {
            Color::WHITE
        }
    })
}

/// Grid size proportional to the image, roughly one stitch per 20 pixels
/// along the longer side, kept within 10..=80 stitches per axis.
pub fn suggest_grid_size(image_width: u32, image_height: u32) -> Result<GridSize, ChartError> {
    if image_width == 0 || image_height == 0 {
        return Err(ChartError::InvalidGridSize {
            width: image_width,
            height: image_height,
        });
    }

    let aspect_ratio = image_width as f64 / image_height as f64;
    let clamp = |v: f64| (v.round() as u32).clamp(MIN_SUGGESTED_GRID, MAX_SUGGESTED_GRID);

    let (width, height) = if aspect_ratio > 1.0 {
        let width = clamp(image_width as f64 / PIXELS_PER_STITCH);
        (width, clamp(width as f64 / aspect_ratio))
    } else {
        let height = clamp(image_height as f64 / PIXELS_PER_STITCH);
        (clamp(height as f64 * aspect_ratio), height)
    };

    GridSize::new(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn quadrant_png(size: u32) -> Vec<u8> {
        let half = size / 2;
        let img = ImageBuffer::from_fn(size, size, |x, y| match (x < half, y < half) {
            (true, true) => Rgba([255u8, 0, 0, 255]),
            (false, true) => Rgba([0, 255, 0, 255]),
            (true, false) => Rgba([0, 0, 255, 255]),
            (false, false) => Rgba([255, 255, 255, 255]),
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn transparent_pixels_read_as_black() {
        let img = ImageBuffer::from_fn(3, 1, |x, _| match x {
            0 => Rgba([200u8, 120, 40, 0]),
            1 => Rgba([200, 120, 40, 128]),
            _ => Rgba([255, 255, 255, 0]),
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let resampler = ImageResampler {
            filter: FilterType::Nearest,
        };
        let grid = resampler
            .resample(&bytes, GridSize { width: 3, height: 1 })
            .unwrap();
        assert_eq!(grid.get(0, 0), Some(Color::BLACK));
        assert_eq!(grid.get(0, 1), Some(Color::new(200, 120, 40)));
        assert_eq!(grid.get(0, 2), Some(Color::BLACK));
    }

    #[test]
    fn resamples_to_requested_grid() {
        let resampler = ImageResampler {
            filter: FilterType::Nearest,
        };
        let grid = resampler
            .resample(&quadrant_png(8), GridSize { width: 2, height: 2 })
            .unwrap();
        assert_eq!(grid.size(), GridSize { width: 2, height: 2 });
        assert_eq!(grid.get(0, 0), Some(Color::new(255, 0, 0)));
        assert_eq!(grid.get(0, 1), Some(Color::new(0, 255, 0)));
        assert_eq!(grid.get(1, 0), Some(Color::new(0, 0, 255)));
        assert_eq!(grid.get(1, 1), Some(Color::WHITE));
    }

    #[test]
    fn default_resampler_fills_every_cell() {
        let grid = ImageResampler::default()
            .resample(&quadrant_png(40), GridSize { width: 7, height: 5 })
            .unwrap();
        assert_eq!(grid.width(), 7);
        assert_eq!(grid.height(), 5);
    }

    #[test]
    fn rejects_garbage_and_empty_input() {
        let resampler = ImageResampler::default();
        let size = GridSize { width: 4, height: 4 };
        assert!(matches!(
            resampler.resample(b"not an image", size),
            Err(ChartError::Decode(_))
        ));
        assert!(matches!(
            resampler.resample(&[], size),
            Err(ChartError::Decode(_))
        ));
    }

    #[test]
    fn rejects_oversized_upload() {
        let oversized = vec![0u8; MAX_IMAGE_BYTES + 1];
        assert!(matches!(
            validate_image_bytes(&oversized),
            Err(ChartError::ImageTooLarge { .. })
        ));
    }

    #[test]
    fn reads_image_dimensions() {
        assert_eq!(image_dimensions(&quadrant_png(12)).unwrap(), (12, 12));
    }

    #[test]
    fn outline_thresholds_luminance() {
        let grid = ColorGrid::new(vec![vec![
            Color::new(90, 90, 90),
            Color::new(120, 120, 120),
            Color::new(0, 0, 255),
            Color::new(255, 255, 0),
        ]])
        .unwrap();
        let silhouette = outline(&grid);
        assert_eq!(
            silhouette.rows()[0],
            vec![Color::BLACK, Color::WHITE, Color::BLACK, Color::WHITE]
        );
    }

    #[test]
    fn suggests_landscape_grid() {
        // 800x400: width 40, height round(40 / 2) = 20
        assert_eq!(
            suggest_grid_size(800, 400).unwrap(),
            GridSize {
                width: 40,
                height: 20
            }
        );
    }

    #[test]
    fn suggests_portrait_grid_within_bounds() {
        assert_eq!(
            suggest_grid_size(300, 3000).unwrap(),
            GridSize {
                width: 10,
                height: 80
            }
        );
        assert_eq!(
            suggest_grid_size(50, 50).unwrap(),
            GridSize {
                width: 10,
                height: 10
            }
        );
        assert!(suggest_grid_size(0, 10).is_err());
    }
}
