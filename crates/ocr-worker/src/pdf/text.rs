//! Embedded text-layer access.
//!
//! Uses lopdf directly, so reading a digital PDF's text needs neither Pdfium nor any
//! rasterization.

use super::error::{PdfError, Result};
use lopdf::Document;

/// A parsed PDF whose pages can be read one at a time.
pub struct TextLayer {
    document: Document,
    page_numbers: Vec<u32>,
}

impl TextLayer {
    pub fn load(pdf_bytes: &[u8]) -> Result<Self> {
        let document = Document::load_mem(pdf_bytes)?;
        if document.is_encrypted() {
            return Err(PdfError::PasswordRequired);
        }
        let page_numbers = document.get_pages().keys().copied().collect();
        Ok(Self { document, page_numbers })
    }

    pub fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    /// Raw embedded text of the page at `index` (0-based).
    pub fn page_text(&self, index: usize) -> Result<String> {
        let page_number = *self.page_numbers.get(index).ok_or(PdfError::PageNotFound(index + 1))?;
        self.document
            .extract_text(&[page_number])
            .map_err(|e| PdfError::TextExtractionFailed(format!("page {}: {}", index + 1, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_rejects_garbage() {
        let result = TextLayer::load(b"definitely not a pdf");
        assert!(matches!(result, Err(PdfError::InvalidPdf(_))));
    }
}
