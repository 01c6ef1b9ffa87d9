//! Fallback backend reading the PDF's embedded text layer.

use super::{LOCAL_MAX_CHARS, TextBackend, prepare_page_text};
use crate::error::Result;
use crate::pdf::TextLayer;
use crate::types::{TextBlock, TextMethod};
use async_trait::async_trait;
use std::path::Path;

/// Fixed confidence: the text is exact when present, but nothing says how good it is.
pub const TEXT_LAYER_CONFIDENCE: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct TextLayerBackend {
    max_chars: usize,
}

impl Default for TextLayerBackend {
    fn default() -> Self {
        Self {
            max_chars: LOCAL_MAX_CHARS,
        }
    }
}

impl TextLayerBackend {
    fn blocks_from_bytes(&self, pdf: &[u8]) -> Result<Vec<TextBlock>> {
        let layer = TextLayer::load(pdf)?;
        let mut blocks = Vec::new();

        for index in 0..layer.page_count() {
            let page = index + 1;
            match layer.page_text(index) {
                Ok(raw) => {
                    if let Some(text) = prepare_page_text(&raw, self.max_chars) {
                        blocks.push(TextBlock {
                            page,
                            text,
                            extraction_method: TextMethod::TextLayer,
                            confidence: Some(TEXT_LAYER_CONFIDENCE),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "Text layer extraction failed for page");
                    blocks.push(TextBlock::error(
                        page,
                        format!("Text extraction failed for page {}: {}", page, e),
                    ));
                }
            }
        }

        Ok(blocks)
    }
}

#[async_trait]
impl TextBackend for TextLayerBackend {
    fn name(&self) -> &str {
        "text_layer"
    }

    fn method_tag(&self) -> &str {
        "text_layer"
    }

    async fn extract_text(&self, pdf_path: &Path) -> Result<Vec<TextBlock>> {
        let pdf = tokio::fs::read(pdf_path).await?;
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.blocks_from_bytes(&pdf)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_whole_document_error() {
        let blocks = TextLayerBackend::default()
            .extract_blocks(Path::new("/nonexistent/input.pdf"))
            .await;
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].page, 1);
        assert!(blocks[0].is_error());
    }

    #[test]
    fn test_garbage_bytes_fail() {
        assert!(TextLayerBackend::default().blocks_from_bytes(b"not a pdf").is_err());
    }
}
