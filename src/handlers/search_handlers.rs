//! HTTP handler for metadata search.
//!
//! The endpoint keeps its own response envelope: success and failure both
//! come back as `{"success": ..., "message": ..., ...}` rather than the
//! error shape used elsewhere.

use crate::handlers::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

/// Request body for `POST /submit`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub input_value: String,
}

/// POST `/submit` — full-text search returning matching records with their
/// resolved links, ordered by relevance.
pub async fn search_documents(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Response {
    match state.search.run(&payload.input_value).await {
        Ok(hits) => Json(json!({
            "success": true,
            "message": "Data Retrieved",
            "results": hits,
        }))
        .into_response(),
        Err(err) => {
            error!(error = %err, "search request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "Error in data retrieval",
                    "error": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}
