use thiserror::Error;

/// Failures of the PDF access layer (pdfium and lopdf).
///
/// No `From<std::io::Error>`: file access happens in the callers and surfaces as
/// `WorkerError::Io`.
#[derive(Debug, Clone, Error)]
pub enum PdfError {
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    #[error("PDF is password-protected")]
    PasswordRequired,

    #[error("Page {0} not found")]
    PageNotFound(usize),

    #[error("Pdfium unavailable: {0}")]
    BindingFailed(String),

    #[error("Text extraction failed: {0}")]
    TextExtractionFailed(String),

    #[error("Layout extraction failed: {0}")]
    LayoutExtractionFailed(String),

    #[error("Page rendering failed: {0}")]
    RenderingFailed(String),
}

impl From<lopdf::Error> for PdfError {
    fn from(err: lopdf::Error) -> Self {
        PdfError::InvalidPdf(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;
