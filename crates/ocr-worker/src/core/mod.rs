//! Orchestration layer: configuration, input plumbing and the per-request pipeline.
//!
//! ```rust,no_run
//! use ocr_worker::core::{Pipeline, WorkerConfig};
//!
//! # async fn example() -> ocr_worker::Result<()> {
//! let pipeline = Pipeline::new(WorkerConfig::load(None)?)?;
//! let pdf = tokio::fs::read("datasheet.pdf").await?;
//! let result = pipeline.process(&pdf).await?;
//! println!("{} tables, quality {:.2}", result.tables.len(), result.extraction_quality);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod io;
pub mod pipeline;

pub use config::{BackendKind, CloudConfig, TesseractConfig, WorkerConfig};
pub use pipeline::Pipeline;
