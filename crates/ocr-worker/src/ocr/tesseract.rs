//! Local Tesseract recognition through the `tesseract` executable.
//!
//! Each page image is piped to `tesseract stdin stdout`, so no intermediate files are
//! written. The process is killed if it outlives the timeout.

use super::raster::{PageRecognizer, PageText, PdfiumRasterizer, RasterBackend, RasterSettings};
use super::LOCAL_MAX_CHARS;
use crate::core::config::{TesseractConfig, WorkerConfig};
use crate::error::{Result, WorkerError};
use crate::types::TextMethod;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

/// Per-page timeout for one tesseract run.
const TESSERACT_TIMEOUT_SECONDS: u64 = 120;

#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: String,
    languages: String,
    oem: u8,
    psm: u8,
}

impl TesseractRecognizer {
    pub fn new(config: &TesseractConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            languages: config.languages.clone(),
            oem: config.oem,
            psm: config.psm,
        }
    }

    fn args(&self) -> Vec<String> {
        vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.languages.clone(),
            "--oem".to_string(),
            self.oem.to_string(),
            "--psm".to_string(),
            self.psm.to_string(),
        ]
    }
}

#[async_trait]
impl PageRecognizer for TesseractRecognizer {
    async fn recognize(&self, png: &[u8]) -> Result<PageText> {
        let mut child = Command::new(&self.binary)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| std::io::Error::other(format!("Failed to execute {}: {}", self.binary, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(png).await?;
        }

        let output = match timeout(Duration::from_secs(TESSERACT_TIMEOUT_SECONDS), child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(std::io::Error::other(format!("Failed to wait for tesseract: {}", e)).into()),
            Err(_) => {
                return Err(WorkerError::ocr(format!(
                    "tesseract timed out after {} seconds",
                    TESSERACT_TIMEOUT_SECONDS
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WorkerError::ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(PageText {
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
            confidence: None,
        })
    }
}

impl RasterBackend<TesseractRecognizer> {
    pub fn tesseract(config: &WorkerConfig) -> Self {
        RasterBackend::new(
            Arc::new(PdfiumRasterizer),
            TesseractRecognizer::new(&config.tesseract),
            RasterSettings {
                name: "tesseract",
                method_tag: "ocr",
                method: TextMethod::TesseractOcr,
                dpi: config.ocr_dpi,
                max_pages: config.max_ocr_pages,
                max_chars: LOCAL_MAX_CHARS,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_follow_config() {
        let recognizer = TesseractRecognizer::new(&TesseractConfig::default());
        assert_eq!(
            recognizer.args(),
            vec!["stdin", "stdout", "-l", "eng+ita", "--oem", "3", "--psm", "6"]
        );
    }

    #[test]
    fn test_backend_settings() {
        let mut config = WorkerConfig::default();
        config.ocr_dpi = 300;
        let backend = RasterBackend::tesseract(&config);
        assert_eq!(backend.settings().dpi, 300);
        assert_eq!(backend.settings().max_pages, 20);
        assert_eq!(backend.settings().max_chars, 2000);
        assert_eq!(backend.settings().method, TextMethod::TesseractOcr);
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let config = TesseractConfig {
            binary: "definitely-not-a-tesseract-binary".to_string(),
            ..Default::default()
        };
        let result = TesseractRecognizer::new(&config).recognize(b"png").await;
        assert!(matches!(result, Err(WorkerError::Io(_))));
    }
}
