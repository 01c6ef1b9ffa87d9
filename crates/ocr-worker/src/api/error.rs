//! HTTP error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::WorkerError;

use super::types::{ErrorResponse, FailureResponse};

/// Error returned by the handlers.
///
/// - `BadRequest` (400): no PDF, malformed body, invalid or failed download
/// - `PayloadTooLarge` (413): input at or over the size limit
/// - `Internal` (500): anything else, answered with the degraded envelope
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl ApiError {
    pub fn no_pdf() -> Self {
        ApiError::BadRequest("No PDF provided".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map an extractor rejection by its status code.
    pub(crate) fn from_rejection(status: StatusCode, message: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(message)
        } else {
            ApiError::BadRequest(message)
        }
    }
}

impl From<WorkerError> for ApiError {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::PayloadTooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            WorkerError::Validation { .. } | WorkerError::Download { .. } => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::BadRequest(error) | ApiError::PayloadTooLarge(error) => {
                tracing::warn!(status = status.as_u16(), %error, "Rejected request");
                (status, Json(ErrorResponse { error })).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(%message, "PDF processing failed");
                (status, Json(FailureResponse::new(message))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_error_mapping() {
        let too_large: ApiError = WorkerError::PayloadTooLarge { actual: 10, limit: 5 }.into();
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(matches!(too_large, ApiError::PayloadTooLarge(ref m) if m == "PDF too large: 10 bytes > 5 limit"));

        let download: ApiError = WorkerError::download("404").into();
        assert_eq!(download.status(), StatusCode::BAD_REQUEST);

        let io: ApiError = WorkerError::Io(std::io::Error::other("disk full")).into();
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_rejection_mapping() {
        assert_eq!(
            ApiError::from_rejection(StatusCode::PAYLOAD_TOO_LARGE, "too big".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::from_rejection(StatusCode::UNSUPPORTED_MEDIA_TYPE, "bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
