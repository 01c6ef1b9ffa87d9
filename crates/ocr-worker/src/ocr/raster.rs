//! Rasterize-then-recognize driver shared by the image-based backends.

use super::{TextBackend, prepare_page_text};
use crate::error::{Result, WorkerError};
use crate::pdf::render_pages_to_png;
use crate::types::{TextBlock, TextMethod};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Turns a PDF into ordered PNG page images.
pub trait Rasterizer: Send + Sync {
    /// Render at most `max_pages` pages. All-or-nothing: one bad page fails the call.
    fn rasterize(&self, pdf_path: &Path, dpi: u16, max_pages: usize) -> Result<Vec<Vec<u8>>>;
}

/// Pdfium-backed rasterizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumRasterizer;

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf_path: &Path, dpi: u16, max_pages: usize) -> Result<Vec<Vec<u8>>> {
        Ok(render_pages_to_png(pdf_path, dpi, max_pages)?)
    }
}

/// Recognized text of one page image.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub text: String,
    pub confidence: Option<f32>,
}

/// Recognizes the text of a single PNG page image.
#[async_trait]
pub trait PageRecognizer: Send + Sync {
    async fn recognize(&self, png: &[u8]) -> Result<PageText>;
}

/// Identity and limits of one image-based backend.
#[derive(Debug, Clone)]
pub struct RasterSettings {
    pub name: &'static str,
    pub method_tag: &'static str,
    pub method: TextMethod,
    pub dpi: u16,
    pub max_pages: usize,
    pub max_chars: usize,
}

/// Backend that rasterizes the document and hands each page to a [`PageRecognizer`].
pub struct RasterBackend<R> {
    rasterizer: Arc<dyn Rasterizer>,
    recognizer: R,
    settings: RasterSettings,
}

impl<R: PageRecognizer> RasterBackend<R> {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, recognizer: R, settings: RasterSettings) -> Self {
        Self {
            rasterizer,
            recognizer,
            settings,
        }
    }

    pub fn settings(&self) -> &RasterSettings {
        &self.settings
    }

    async fn rasterize(&self, pdf_path: &Path) -> Result<Vec<Vec<u8>>> {
        let rasterizer = Arc::clone(&self.rasterizer);
        let path = pdf_path.to_path_buf();
        let (dpi, max_pages) = (self.settings.dpi, self.settings.max_pages);

        tokio::task::spawn_blocking(move || rasterizer.rasterize(&path, dpi, max_pages))
            .await?
            .map_err(|e| WorkerError::ocr(format!("Could not convert PDF to images: {}", e)))
    }
}

#[async_trait]
impl<R: PageRecognizer> TextBackend for RasterBackend<R> {
    fn name(&self) -> &str {
        self.settings.name
    }

    fn method_tag(&self) -> &str {
        self.settings.method_tag
    }

    async fn extract_text(&self, pdf_path: &Path) -> Result<Vec<TextBlock>> {
        let images = self.rasterize(pdf_path).await?;
        tracing::debug!(backend = self.settings.name, pages = images.len(), "Rasterized PDF");

        let mut blocks = Vec::with_capacity(images.len());
        for (index, png) in images.iter().enumerate() {
            let page = index + 1;
            match self.recognizer.recognize(png).await {
                Ok(recognized) => {
                    if let Some(text) = prepare_page_text(&recognized.text, self.settings.max_chars) {
                        blocks.push(TextBlock {
                            page,
                            text,
                            extraction_method: self.settings.method,
                            confidence: recognized.confidence,
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(backend = self.settings.name, page, error = %e, "Page recognition failed");
                    blocks.push(TextBlock::error(
                        page,
                        format!("OCR extraction failed for page {}: {}", page, e),
                    ));
                }
            }
        }

        Ok(blocks)
    }
}
