//! Defines the routes for the upload-and-search service.
//!
//! ## Structure
//! - `GET  /`        — static greeting page
//! - `GET  /healthz` — liveness probe
//! - `GET  /readyz`  — readiness probe (DB + staging directory)
//! - `POST /upload`  — multipart upload: stage, push to the drive, record
//! - `POST /submit`  — full-text search with link resolution

use crate::handlers::{
    AppState,
    health_handlers::{healthz, readyz, root},
    search_handlers::search_documents,
    upload_handlers::upload_document,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

/// Build and return the router for all endpoints.
///
/// The router carries shared state (`AppState`) to all handlers. The upload
/// route gets its own body limit so oversized payloads are rejected before
/// staging. Every route shares the permissive CORS layer for browser
/// clients.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        // health endpoints
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // upload and search
        .route(
            "/upload",
            post(upload_document).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/submit", post(search_documents))
        .layer(cors_layer())
}

/// Permissive CORS: any origin, any headers, the methods served here. The
/// layer answers preflight OPTIONS requests itself.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any)
}
