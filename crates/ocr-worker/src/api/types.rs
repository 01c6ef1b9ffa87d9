//! API request and response types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{Pipeline, types::ExtractionResult};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: "ocr-worker".to_string(),
        }
    }
}

/// JSON body of `POST /process-pdf`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub pdf_url: Option<String>,
}

/// Body of 4xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of 500 responses: the degraded envelope plus what went wrong.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureResponse {
    /// Always `"PDF processing failed"`
    pub error: String,
    pub message: String,
    #[serde(flatten)]
    pub result: ExtractionResult,
}

impl FailureResponse {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            error: "PDF processing failed".to_string(),
            result: ExtractionResult::degraded(&message),
            message,
        }
    }
}

/// API server state.
///
/// The pipeline is built once at startup; requests share it read-only.
#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<Pipeline>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_response_is_flat() {
        let value = serde_json::to_value(FailureResponse::new("disk full")).unwrap();
        assert_eq!(value["error"], "PDF processing failed");
        assert_eq!(value["message"], "disk full");
        assert_eq!(value["pages"], 1);
        assert_eq!(value["extraction_method"], "error");
        assert_eq!(value["extraction_quality"], 0.0);
        assert_eq!(value["text_blocks"][0]["text"], "Processing failed: disk full");
        assert_eq!(value["logs"][0], "Error: disk full");
    }

    #[test]
    fn test_process_request_url_optional() {
        let request: ProcessRequest = serde_json::from_str("{}").unwrap();
        assert!(request.pdf_url.is_none());
    }
}
