//! API request handlers.

use axum::{
    Json,
    extract::{
        FromRequest, Multipart, Request, State,
        multipart::{Field, MultipartError},
    },
    http::{
        HeaderMap, StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
};
use http_body_util::LengthLimitError;

use crate::WorkerError;
use crate::core::io::download_pdf;
use crate::types::ExtractionResult;

use super::{
    error::ApiError,
    server::BODY_LIMIT_HEADROOM,
    types::{ApiState, HealthResponse, ProcessRequest},
};

/// Multipart field carrying an uploaded PDF.
pub const PDF_FIELD: &str = "pdf_data";

/// Where the PDF of a `POST /process-pdf` request comes from.
///
/// JSON bodies must carry `pdf_url`; multipart bodies must carry a `pdf_data` field. Any
/// other request is rejected with `No PDF provided`. Uploads are read chunk by chunk and
/// rejected as soon as they reach `max_pdf_bytes`.
#[derive(Debug)]
pub enum PdfSource {
    Url(String),
    Upload(Vec<u8>),
}

fn too_large(actual: usize, limit: usize) -> ApiError {
    WorkerError::PayloadTooLarge { actual, limit }.into()
}

/// Body ended by the transport limit before the upload itself could be measured.
fn transport_limit_exceeded(limit: usize) -> ApiError {
    ApiError::PayloadTooLarge(format!(
        "PDF too large: >{} bytes > {} limit",
        limit.saturating_add(BODY_LIMIT_HEADROOM),
        limit
    ))
}

fn hit_length_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

fn multipart_rejection(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE || hit_length_limit(&err) {
        transport_limit_exceeded(limit)
    } else {
        ApiError::from_rejection(err.status(), err.body_text())
    }
}

/// Declared body size, when the client sent a usable `Content-Length`.
fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Buffer one multipart field, stopping once it reaches `limit` bytes.
async fn read_upload(mut field: Field<'_>, limit: usize) -> Result<Vec<u8>, ApiError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_rejection(e, limit))? {
        data.extend_from_slice(&chunk);
        if data.len() >= limit {
            return Err(too_large(data.len(), limit));
        }
    }
    Ok(data)
}

impl FromRequest<ApiState> for PdfSource {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &ApiState) -> Result<Self, Self::Rejection> {
        let limit = state.pipeline.config().max_pdf_bytes;

        // Multipart framing stays well under the headroom, so a body this large cannot
        // carry a PDF under the limit.
        if let Some(declared) = declared_length(req.headers())
            && declared > limit.saturating_add(BODY_LIMIT_HEADROOM)
        {
            return Err(too_large(declared, limit));
        }

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;

            while let Some(field) = multipart.next_field().await.map_err(|e| multipart_rejection(e, limit))? {
                if field.name() == Some(PDF_FIELD) {
                    return read_upload(field, limit).await.map(PdfSource::Upload);
                }
            }

            return Err(ApiError::no_pdf());
        }

        if content_type.starts_with("application/json") {
            let Json(body) = Json::<ProcessRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;

            return match body.pdf_url.filter(|url| !url.trim().is_empty()) {
                Some(url) => Ok(PdfSource::Url(url)),
                None => Err(ApiError::no_pdf()),
            };
        }

        Err(ApiError::no_pdf())
    }
}

/// Process endpoint handler.
///
/// POST /process-pdf
///
/// Accepts either JSON `{"pdf_url": "..."}` or multipart form data with a `pdf_data`
/// file field and returns the extraction envelope.
pub async fn process_pdf_handler(
    State(state): State<ApiState>,
    source: PdfSource,
) -> Result<Json<ExtractionResult>, ApiError> {
    let pdf = match source {
        PdfSource::Url(url) => {
            let config = state.pipeline.config();
            tracing::info!(%url, "Downloading PDF");
            download_pdf(&url, config.download_timeout_secs, config.max_pdf_bytes).await?
        }
        PdfSource::Upload(bytes) => bytes,
    };

    let result = state.pipeline.process(&pdf).await?;
    Ok(Json(result))
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
