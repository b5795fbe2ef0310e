//! HTTP handler for multipart document uploads.
//!
//! Streams the file part into a per-request staging file before handing it
//! to the upload workflow, so request bodies are never buffered whole in
//! memory.

use crate::{
    errors::AppError,
    handlers::AppState,
    services::{staging::StagedBlob, upload_service::UploadMeta},
};
use axum::{
    Json,
    extract::{Multipart, State, multipart::Field},
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;

/// POST `/upload` — multipart form carrying `title`, `collegename`,
/// `fileType`, and the blob itself in a `file` part.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut title = None;
    let mut college = None;
    let mut category = None;
    let mut staged: Option<(StagedBlob, String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::new(err.status(), format!("invalid multipart body: {}", err)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => {
                title = Some(text_value(field).await?);
            }
            Some("collegename") => {
                college = Some(text_value(field).await?);
            }
            Some("fileType") => {
                category = Some(text_value(field).await?);
            }
            Some("file") => {
                staged = Some(stage_file(&state, field).await?);
            }
            _ => {}
        }
    }

    let (blob, file_name, mime_type) =
        staged.ok_or_else(|| AppError::bad_request("no file provided"))?;

    info!(file = %file_name, "received upload");
    let remote_file_id = state
        .uploads
        .run(
            blob,
            UploadMeta {
                title,
                college,
                category,
                file_name,
                mime_type,
            },
        )
        .await?;

    Ok(Json(json!({
        "message": "File uploaded successfully!",
        "fileId": remote_file_id,
    })))
}

/// Stream the `file` part to a staging file. Returns the staged blob plus
/// the original file name and MIME type.
async fn stage_file(
    state: &AppState,
    mut field: Field<'_>,
) -> Result<(StagedBlob, String, String), AppError> {
    let file_name = field
        .file_name()
        .map(str::to_string)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::bad_request("file part is missing a file name"))?;
    let mime_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let mut blob = state.staging.stage(&file_name).await?;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|err| AppError::new(err.status(), format!("failed to read file part: {}", err)))?
    {
        blob.write_chunk(&chunk).await?;
    }
    blob.finish().await?;

    Ok((blob, file_name, mime_type))
}

/// Read a text field, rejecting malformed content with the multipart
/// error's own status.
async fn text_value(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|err| AppError::new(err.status(), format!("invalid form field: {}", err)))
}
