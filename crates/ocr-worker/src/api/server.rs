//! API server setup and configuration.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{Pipeline, Result, WorkerConfig, WorkerError};

use super::{
    handlers::{health_handler, process_pdf_handler},
    types::ApiState,
};

/// Body limit headroom above `max_pdf_bytes` for multipart framing. Uploads themselves
/// are cut off at `max_pdf_bytes` while they stream in.
pub const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

/// CORS from a comma-separated origin list; permissive when unset or unusable.
fn cors_layer(origins: Option<String>) -> CorsLayer {
    let Some(origins_str) = origins else {
        tracing::warn!(
            "CORS configured to allow all origins (default). Set OCR_WORKER_CORS_ORIGINS to a \
             comma-separated list of allowed origins for production."
        );
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    };

    let origins: Vec<_> = origins_str
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("OCR_WORKER_CORS_ORIGINS set but empty/invalid - falling back to permissive CORS");
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    tracing::info!("CORS configured with {} explicit allowed origin(s)", origins.len());
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the router around an already-built pipeline.
pub fn create_router_with_pipeline(pipeline: Pipeline) -> Router {
    let body_limit = pipeline.config().max_pdf_bytes.saturating_add(BODY_LIMIT_HEADROOM);
    let state = ApiState {
        pipeline: Arc::new(pipeline),
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/process-pdf", post(process_pdf_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(std::env::var("OCR_WORKER_CORS_ORIGINS").ok()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the router, building the pipeline from `config`.
///
/// ```no_run
/// use ocr_worker::{WorkerConfig, api::create_router};
///
/// # fn main() -> ocr_worker::Result<()> {
/// let app = axum::Router::new().nest("/ocr", create_router(WorkerConfig::default())?);
/// # Ok(())
/// # }
/// ```
pub fn create_router(config: WorkerConfig) -> Result<Router> {
    Ok(create_router_with_pipeline(Pipeline::new(config)?))
}

/// Start the API server.
pub async fn serve(host: impl AsRef<str>, port: u16, config: WorkerConfig) -> Result<()> {
    let ip: IpAddr = host
        .as_ref()
        .parse()
        .map_err(|e| WorkerError::validation(format!("Invalid host address: {}", e)))?;

    let addr = SocketAddr::new(ip, port);
    tracing::info!(
        max_pdf_bytes = config.max_pdf_bytes,
        backend = ?config.backend_kind(),
        "Starting ocr-worker on http://{}",
        addr
    );
    let app = create_router(config)?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(WorkerError::Io)?;

    axum::serve(listener, app)
        .await
        .map_err(|e| WorkerError::Other(e.to_string()))?;

    Ok(())
}
