//! HTTP surface of the worker.
//!
//! # Endpoints
//!
//! - `GET /health` - liveness, `{"status":"healthy","service":"ocr-worker"}`
//! - `POST /process-pdf` - JSON `{"pdf_url": ...}` or multipart field `pdf_data`
//!
//! | outcome | status | body |
//! |---|---|---|
//! | success | 200 | extraction envelope |
//! | no PDF, bad body, failed download | 400 | `{"error": ...}` |
//! | PDF at or over the size limit | 413 | `{"error": "PDF too large: ..."}` |
//! | processing failure | 500 | degraded envelope + `error` / `message` |
//!
//! ```bash
//! curl -F "pdf_data=@datasheet.pdf" http://localhost:8080/process-pdf
//! curl -H 'content-type: application/json' -d '{"pdf_url":"https://example.com/a.pdf"}' \
//!      http://localhost:8080/process-pdf
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use handlers::{PDF_FIELD, PdfSource};
pub use server::{BODY_LIMIT_HEADROOM, create_router, create_router_with_pipeline, serve};
pub use types::{ApiState, ErrorResponse, FailureResponse, HealthResponse, ProcessRequest};
