//! Text extraction backends.
//!
//! One backend is chosen per worker from [`WorkerConfig`], in priority order:
//!
//! 1. **Document AI** when a processor id is configured
//! 2. **Cloud Vision** when enabled and credentials are present
//! 3. **Tesseract** when enabled
//! 4. **Text layer** otherwise; needs no external service
//!
//! The choice is fixed for the lifetime of the pipeline. A backend that fails as a whole
//! yields a single page-1 error block; other backends are never tried as a fallback.
mod cloud;
pub mod document_ai;
pub mod raster;
pub mod tesseract;
pub mod text_layer;
pub mod vision;

use crate::core::config::{BackendKind, WorkerConfig};
use crate::error::Result;
use crate::text::normalize::{clean_text, truncate_chars};
use crate::types::TextBlock;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use document_ai::DocumentAiBackend;
pub use raster::{PageRecognizer, PageText, PdfiumRasterizer, RasterBackend, Rasterizer};
pub use tesseract::TesseractRecognizer;
pub use text_layer::TextLayerBackend;
pub use vision::VisionRecognizer;

/// Pages whose cleaned text is this short or shorter produce no block.
pub const MIN_PAGE_TEXT_CHARS: usize = 20;

/// Truncation for the local, lower-fidelity backends.
pub const LOCAL_MAX_CHARS: usize = 2000;

/// Truncation for the cloud backends.
pub const CLOUD_MAX_CHARS: usize = 4000;

/// A text extraction backend.
#[async_trait]
pub trait TextBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Prefix of the composite `extraction_method` (`<tag>+tabula`).
    fn method_tag(&self) -> &str;

    /// Extract one block per page with usable text, ordered by page.
    ///
    /// Per-page failures are returned as error blocks inside `Ok`. `Err` means the
    /// backend could not process the document at all.
    async fn extract_text(&self, pdf_path: &Path) -> Result<Vec<TextBlock>>;

    /// Like [`extract_text`](Self::extract_text), but folds a whole-document failure into
    /// a single page-1 error block.
    async fn extract_blocks(&self, pdf_path: &Path) -> Vec<TextBlock> {
        match self.extract_text(pdf_path).await {
            Ok(blocks) => blocks,
            Err(e) => {
                tracing::warn!(backend = self.name(), error = %e, "Text backend failed for the whole document");
                vec![TextBlock::error(1, format!("{} extraction failed: {}", self.name(), e))]
            }
        }
    }
}

/// Clean raw page text; `None` when too little is left to be worth a block.
pub(crate) fn prepare_page_text(raw: &str, max_chars: usize) -> Option<String> {
    let cleaned = clean_text(raw);
    if cleaned.chars().count() <= MIN_PAGE_TEXT_CHARS {
        return None;
    }
    Some(truncate_chars(&cleaned, max_chars))
}

/// Build the backend the configuration selects.
pub fn select_backend(config: &WorkerConfig) -> Result<Arc<dyn TextBackend>> {
    let backend: Arc<dyn TextBackend> = match config.backend_kind() {
        BackendKind::DocumentAi => Arc::new(DocumentAiBackend::from_config(config)?),
        BackendKind::Vision => Arc::new(RasterBackend::vision(config)?),
        BackendKind::Tesseract => Arc::new(RasterBackend::tesseract(config)),
        BackendKind::TextLayer => Arc::new(TextLayerBackend::default()),
    };
    tracing::info!(backend = backend.name(), "Selected text backend");
    Ok(backend)
}
