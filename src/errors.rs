use crate::services::{
    drive_service::DriveError, record_service::RecordError, upload_service::UploadFlowError,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
///
/// `orphaned_file_id` is set when an upload reached the remote drive but the
/// metadata insert failed, so the response can name the blob left behind.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub orphaned_file_id: Option<String>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            orphaned_file_id: None,
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Attach the id of a remote blob left without a metadata record.
    pub fn with_orphaned_file_id(mut self, id: impl Into<String>) -> Self {
        self.orphaned_file_id = Some(id.into());
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.message,
            "status": self.status.as_u16()
        });
        if let Some(id) = self.orphaned_file_id {
            body["orphanedFileId"] = json!(id);
        }

        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::internal(format!("storage i/o failed: {}", err))
    }
}

impl From<DriveError> for AppError {
    fn from(err: DriveError) -> Self {
        match err {
            DriveError::Auth(_) | DriveError::Upload(_) => {
                AppError::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            DriveError::LinkLookup(_) => AppError::internal(err.to_string()),
        }
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<UploadFlowError> for AppError {
    fn from(err: UploadFlowError) -> Self {
        match err {
            UploadFlowError::Drive(inner) => inner.into(),
            UploadFlowError::Persist {
                remote_file_id,
                source,
            } => AppError::internal(format!(
                "uploaded blob {} could not be recorded: {}",
                remote_file_id, source
            ))
            .with_orphaned_file_id(remote_file_id),
        }
    }
}
