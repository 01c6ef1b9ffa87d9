//! Response data model.
//!
//! These types are the wire contract of `POST /process-pdf`. Field names and tag strings
//! are consumed by downstream ingestion and must stay stable.

use serde::{Deserialize, Serialize};

/// Tag identifying which backend produced a [`TextBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextMethod {
    #[serde(rename = "tesseract_ocr")]
    TesseractOcr,
    #[serde(rename = "google_vision_api")]
    GoogleVisionApi,
    #[serde(rename = "google_document_ai")]
    GoogleDocumentAi,
    /// Embedded text layer read without rasterization. The tag string predates this
    /// implementation and is kept for consumers that key on it.
    #[serde(rename = "pypdf2_fallback")]
    TextLayer,
    #[serde(rename = "error")]
    Error,
}

/// One page's worth of recognized prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// 1-based page number.
    pub page: usize,
    pub text: String,
    pub extraction_method: TextMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl TextBlock {
    /// Placeholder block recording that `page` could not be extracted.
    pub fn error(page: usize, message: impl Into<String>) -> Self {
        Self {
            page,
            text: message.into(),
            extraction_method: TextMethod::Error,
            confidence: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.extraction_method == TextMethod::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowType {
    Header,
    Data,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub text: String,
    /// 0-based column position in the source grid.
    pub col: usize,
    pub is_header: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub row_type: RowType,
}

/// One detected tabular region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Position of the table in the selected strategy's output (1-based). This is not
    /// the PDF page; see `source_page`.
    pub page: usize,
    /// 1-based PDF page the table was detected on.
    pub source_page: usize,
    pub table_id: String,
    pub rows: Vec<Row>,
    pub extraction_method: String,
    /// Cell count of the first row.
    pub columns: usize,
    /// Number of rows tagged `data`.
    pub data_rows: usize,
}

/// Response envelope for one processed PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub pages: usize,
    pub extraction_method: String,
    pub extraction_quality: f64,
    pub tables: Vec<Table>,
    pub text_blocks: Vec<TextBlock>,
    pub logs: Vec<String>,
}

impl ExtractionResult {
    /// Degraded-but-valid envelope returned when orchestration fails.
    pub fn degraded(message: &str) -> Self {
        Self {
            pages: 1,
            extraction_method: "error".to_string(),
            extraction_quality: 0.0,
            tables: Vec::new(),
            text_blocks: vec![TextBlock::error(1, format!("Processing failed: {}", message))],
            logs: vec![format!("Error: {}", message)],
        }
    }
}
