//! ocr-worker - PDF extraction worker for B2B technical documents
//!
//! Takes one PDF (datasheets, API specs, feature tables) and returns page text blocks,
//! structured tables and a heuristic quality score in a single JSON envelope.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ocr_worker::{Pipeline, WorkerConfig};
//!
//! # async fn example() -> ocr_worker::Result<()> {
//! let pipeline = Pipeline::new(WorkerConfig::default())?;
//! let pdf = std::fs::read("datasheet.pdf")?;
//! let result = pipeline.process(&pdf).await?;
//! println!("{}: {} blocks", result.extraction_method, result.text_blocks.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): configuration, input plumbing, the per-request pipeline
//! - **Tables** (`tables`): competing detection strategies, best one wins
//! - **Text backends** (`ocr`): Document AI, Cloud Vision, Tesseract or the embedded text layer
//! - **Text** (`text`): normalization and quality scoring
//! - **PDF** (`pdf`): pdfium/lopdf access for layout, rendering and text
//! - **API** (`api`, feature `api`): the axum HTTP surface

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod ocr;
pub mod pdf;
pub mod tables;
pub mod text;
pub mod types;

#[cfg(feature = "api")]
pub mod api;

pub use error::{Result, WorkerError};
pub use types::*;

pub use core::config::{BackendKind, CloudConfig, TesseractConfig, WorkerConfig};
pub use core::pipeline::Pipeline;
pub use ocr::{TextBackend, select_backend};
pub use tables::{RawTable, TableExtractor, TableStrategy, select_best};
