use crate::types::{ExplorerError, ExplorerResult, RasterGrid};
use image::{DynamicImage, GrayImage};
use std::path::Path;

/// Something the visualizer can display: a catalog thumbnail or a
/// loaded band grid
pub enum Artifact<'a> {
    Thumbnail(&'a [u8]),
    Grid(&'a RasterGrid),
}

/// Decode thumbnail bytes into an image
pub fn render_thumbnail(bytes: &[u8]) -> ExplorerResult<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| ExplorerError::RenderFailure(format!("Failed to decode thumbnail: {}", e)))
}

/// Render a band grid as an 8-bit grayscale preview.
///
/// Values are stretched linearly between the 2nd and 98th percentile of
/// the finite pixels, the usual quick-look stretch for SAR amplitudes.
/// Non-finite pixels render black.
pub fn render_grid(grid: &RasterGrid) -> ExplorerResult<GrayImage> {
    if grid.rows() == 0 || grid.cols() == 0 {
        return Err(ExplorerError::RenderFailure(
            "Cannot render an empty grid".to_string(),
        ));
    }

    let mut finite: Vec<f32> = grid.data.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(ExplorerError::RenderFailure(
            "Grid contains no finite values".to_string(),
        ));
    }
    finite.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let lo = percentile(&finite, 0.02);
    let hi = percentile(&finite, 0.98);
    let span = if hi > lo { hi - lo } else { 1.0 };

    log::debug!("Preview stretch: [{}, {}]", lo, hi);

    let mut img = GrayImage::new(grid.cols() as u32, grid.rows() as u32);
    for ((row, col), &value) in grid.data.indexed_iter() {
        let level = if value.is_finite() {
            (((value - lo) / span).clamp(0.0, 1.0) * 255.0) as u8
        } else {
            0
        };
        img.put_pixel(col as u32, row as u32, image::Luma([level]));
    }
    Ok(img)
}

/// Write a visual representation of the artifact to `path`.
///
/// This is a terminal sink: nothing downstream consumes its output, and
/// a failure here does not invalidate previously returned data.
pub fn show<P: AsRef<Path>>(artifact: Artifact<'_>, path: P) -> ExplorerResult<()> {
    let path = path.as_ref();
    match artifact {
        Artifact::Thumbnail(bytes) => {
            let img = render_thumbnail(bytes)?;
            img.save(path)
                .map_err(|e| ExplorerError::RenderFailure(format!("Failed to save preview: {}", e)))?;
        }
        Artifact::Grid(grid) => {
            let img = render_grid(grid)?;
            img.save(path)
                .map_err(|e| ExplorerError::RenderFailure(format!("Failed to save preview: {}", e)))?;
        }
    }
    log::info!("Preview written to {}", path.display());
    Ok(())
}

fn percentile(sorted: &[f32], fraction: f64) -> f32 {
    let idx = ((sorted.len() - 1) as f64 * fraction).round() as usize;
    sorted[idx]
}
