//! Error types for the worker.
//!
//! Every fallible operation in the library returns [`WorkerError`]. Recoverable failures
//! (a single page, a single table strategy) never reach the caller as errors; they are
//! folded into the extraction result by the component that owns them. What remains here is
//! what a caller actually has to react to:
//!
//! - `Io` - file system errors (temp file creation, reads). Always bubble up unchanged.
//! - `Validation` / `PayloadTooLarge` / `Download` - input problems, reported before any
//!   extraction work starts
//! - `Parsing` / `Ocr` / `Backend` - document or collaborator failures
//! - `Serialization` - JSON encoding/decoding of backend payloads
use thiserror::Error;

/// Result type alias using `WorkerError`.
pub type Result<T> = std::result::Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {message}")]
    Parsing {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Download error: {message}")]
    Download {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("PDF too large: {actual} bytes > {limit} limit")]
    PayloadTooLarge { actual: usize, limit: usize },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        WorkerError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<crate::pdf::PdfError> for WorkerError {
    fn from(err: crate::pdf::PdfError) -> Self {
        WorkerError::Parsing {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<tokio::task::JoinError> for WorkerError {
    fn from(err: tokio::task::JoinError) -> Self {
        WorkerError::Other(format!("Worker task failed: {}", err))
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        paste::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl WorkerError {
    error_constructor!(parsing, Parsing);
    error_constructor!(ocr, Ocr);
    error_constructor!(validation, Validation);
    error_constructor!(download, Download);
    error_constructor!(backend, Backend);
    error_constructor!(serialization, Serialization);

    /// True for errors caused by the caller's input rather than by the worker.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            WorkerError::Validation { .. } | WorkerError::Download { .. } | WorkerError::PayloadTooLarge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WorkerError = io_err.into();
        assert!(matches!(err, WorkerError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_payload_too_large_message_names_both_sizes() {
        let err = WorkerError::PayloadTooLarge {
            actual: 200,
            limit: 100,
        };
        assert_eq!(err.to_string(), "PDF too large: 200 bytes > 100 limit");
        assert!(err.is_input_error());
    }

    #[test]
    fn test_backend_error_with_source() {
        let source = std::io::Error::other("connection refused");
        let err = WorkerError::backend_with_source("vision request failed", source);
        assert_eq!(err.to_string(), "Backend error: vision request failed");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_download_is_input_error() {
        let err = WorkerError::download("404 Not Found");
        assert!(err.is_input_error());
        assert_eq!(err.to_string(), "Download error: 404 Not Found");
    }

    #[test]
    fn test_serde_json_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: WorkerError = json_err.into();
        assert!(matches!(err, WorkerError::Serialization { .. }));
    }
}
