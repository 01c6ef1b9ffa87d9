use super::bindings::{bind_pdfium, load_document};
use super::error::{PdfError, Result};
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::Path;

const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Largest edge (pixels) a rendered page may have; oversized pages are rendered at a
/// lower DPI instead.
const MAX_IMAGE_DIMENSION: f32 = 10_000.0;

/// DPI that keeps both edges of a `width_points` x `height_points` page within
/// `MAX_IMAGE_DIMENSION`.
pub(crate) fn effective_dpi(width_points: f32, height_points: f32, target_dpi: u16) -> f32 {
    let target = f32::from(target_dpi);
    let longest_inches = width_points.max(height_points) / PDF_POINTS_PER_INCH;
    if longest_inches <= 0.0 {
        return target;
    }
    target.min(MAX_IMAGE_DIMENSION / longest_inches)
}

/// Render the first `max_pages` pages of the PDF at `path` to PNG, in page order.
///
/// Any page failing to render fails the whole call: the caller treats rasterization as
/// all-or-nothing.
pub fn render_pages_to_png(path: &Path, dpi: u16, max_pages: usize) -> Result<Vec<Vec<u8>>> {
    let pdfium = bind_pdfium(PdfError::RenderingFailed, "page rendering")?;
    let document = load_document(&pdfium, path)?;

    let mut pages = Vec::new();
    for (index, page) in document.pages().iter().enumerate().take(max_pages) {
        let width_points = page.width().value;
        let height_points = page.height().value;
        let scale = effective_dpi(width_points, height_points, dpi) / PDF_POINTS_PER_INCH;

        let config = PdfRenderConfig::new()
            .set_target_width(((width_points * scale) as i32).max(1))
            .set_target_height(((height_points * scale) as i32).max(1))
            .rotate_if_landscape(PdfPageRenderRotation::None, false);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| PdfError::RenderingFailed(format!("Failed to render page {}: {}", index + 1, e)))?;

        let mut png = Vec::new();
        bitmap
            .as_image()
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| PdfError::RenderingFailed(format!("Failed to encode page {}: {}", index + 1, e)))?;

        pages.push(png);
    }

    Ok(pages)
}
