//! PDF input plumbing: reading, downloading and request-scoped temp files.

use crate::{Result, WorkerError};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Fetch a PDF with a bounded GET.
///
/// Invalid URLs, transport failures and non-2xx statuses all surface as
/// `WorkerError::Download`. Bodies reaching `max_bytes`, by declared length or while
/// streaming, stop with `WorkerError::PayloadTooLarge`.
pub async fn download_pdf(url: &str, timeout_secs: u64, max_bytes: usize) -> Result<Vec<u8>> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| WorkerError::download_with_source(format!("Invalid PDF URL '{}'", url), e))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(WorkerError::download(format!("Unsupported URL scheme '{}'", parsed.scheme())));
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| WorkerError::download_with_source("Failed to create HTTP client", e))?;

    let mut response = client
        .get(parsed)
        .send()
        .await
        .map_err(|e| WorkerError::download(format!("Failed to download {}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(WorkerError::download(format!("Download of {} returned status {}", url, status)));
    }

    if let Some(declared) = response.content_length()
        && declared >= max_bytes as u64
    {
        return Err(WorkerError::PayloadTooLarge {
            actual: usize::try_from(declared).unwrap_or(usize::MAX),
            limit: max_bytes,
        });
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| WorkerError::download(format!("Failed to read body of {}: {}", url, e)))?
    {
        body.extend_from_slice(&chunk);
        if body.len() >= max_bytes {
            return Err(WorkerError::PayloadTooLarge {
                actual: body.len(),
                limit: max_bytes,
            });
        }
    }

    Ok(body)
}

/// Write `bytes` to a new `.pdf` temp file. The file is deleted when the handle drops.
pub fn persist_temp_pdf(bytes: &[u8]) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().prefix("ocr-worker-").suffix(".pdf").tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}
