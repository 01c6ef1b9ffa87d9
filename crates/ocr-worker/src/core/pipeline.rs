//! Per-request orchestration.
//!
//! A request runs through:
//! 1. size validation, before anything touches the disk
//! 2. a temp `.pdf` file, deleted when the request finishes on any path
//! 3. table extraction and text extraction, concurrently
//! 4. assembly of the envelope: composite method, page count, quality and logs

use super::config::WorkerConfig;
use super::io::persist_temp_pdf;
use crate::ocr::{TextBackend, select_backend};
use crate::tables::{TABLE_EXTRACTION_METHOD, TableExtractor};
use crate::text::score_extraction;
use crate::types::ExtractionResult;
use crate::{Result, WorkerError};
use std::sync::Arc;

/// Processes PDFs with a fixed configuration and fixed backends.
#[derive(Clone)]
pub struct Pipeline {
    config: WorkerConfig,
    tables: TableExtractor,
    text: Arc<dyn TextBackend>,
}

impl Pipeline {
    /// Build the pipeline with the default table strategies and the text backend the
    /// configuration selects.
    pub fn new(config: WorkerConfig) -> Result<Self> {
        let text = select_backend(&config)?;
        Ok(Self::with_components(config, TableExtractor::default(), text))
    }

    pub fn with_components(config: WorkerConfig, tables: TableExtractor, text: Arc<dyn TextBackend>) -> Self {
        tracing::debug!(
            table_strategies = ?tables.strategy_names(),
            text_backend = text.name(),
            "Pipeline ready"
        );
        Self { config, tables, text }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Composite `extraction_method` of every successful envelope.
    pub fn extraction_method(&self) -> String {
        format!("{}+{}", self.text.method_tag(), TABLE_EXTRACTION_METHOD)
    }

    /// Reject empty input and input at or over `max_pdf_bytes`.
    pub fn check_size(&self, len: usize) -> Result<()> {
        if len == 0 {
            return Err(WorkerError::validation("Empty PDF payload"));
        }
        if len >= self.config.max_pdf_bytes {
            return Err(WorkerError::PayloadTooLarge {
                actual: len,
                limit: self.config.max_pdf_bytes,
            });
        }
        Ok(())
    }

    /// Process one PDF.
    ///
    /// Page and strategy failures are folded into the result. `Err` is either an input
    /// error (see [`WorkerError::is_input_error`]) or an orchestration failure, for which
    /// callers should answer with [`ExtractionResult::degraded`].
    pub async fn process(&self, pdf: &[u8]) -> Result<ExtractionResult> {
        self.check_size(pdf.len())?;
        tracing::info!(bytes = pdf.len(), backend = self.text.name(), "Processing PDF");

        let temp = persist_temp_pdf(pdf)?;
        let path = temp.path().to_path_buf();

        let tables = self.tables.clone();
        let table_path = path.clone();
        let table_task = tokio::task::spawn_blocking(move || tables.extract(&table_path));

        let text = Arc::clone(&self.text);
        let text_path = path.clone();
        let text_task = tokio::spawn(async move { text.extract_blocks(&text_path).await });

        let (table_result, text_result) = tokio::join!(table_task, text_task);
        drop(temp);
        let table_extraction = table_result?;
        let text_blocks = text_result?;

        let tables = table_extraction.tables;
        let strategy = table_extraction.strategy.as_deref().unwrap_or("none");
        tracing::info!(tables = tables.len(), strategy, "Table extraction finished");
        tracing::info!(blocks = text_blocks.len(), backend = self.text.name(), "Text extraction finished");

        let extraction_quality = score_extraction(&text_blocks, &tables);
        let logs = vec![
            format!("Processed {} bytes", pdf.len()),
            format!("Found {} tables via tabula (strategy: {})", tables.len(), strategy),
            format!("Extracted {} text blocks via {}", text_blocks.len(), self.text.name()),
        ];

        Ok(ExtractionResult {
            pages: text_blocks.len().max(1),
            extraction_method: self.extraction_method(),
            extraction_quality,
            tables,
            text_blocks,
            logs,
        })
    }

    /// [`process`](Self::process), with orchestration failures turned into the degraded
    /// envelope. Input errors are still returned as `Err`.
    pub async fn process_or_degrade(&self, pdf: &[u8]) -> Result<ExtractionResult> {
        match self.process(pdf).await {
            Ok(result) => Ok(result),
            Err(e) if e.is_input_error() => Err(e),
            Err(e) => {
                tracing::error!(error = %e, "PDF processing failed");
                Ok(ExtractionResult::degraded(&e.to_string()))
            }
        }
    }
}
