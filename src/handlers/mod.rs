//! HTTP request handlers and the state they share.

pub mod health_handlers;
pub mod search_handlers;
pub mod upload_handlers;

use crate::services::{
    record_service::RecordService, search_service::SearchService, staging::StagingArea,
    upload_service::UploadService,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadService,
    pub search: SearchService,
    pub records: RecordService,
    pub staging: StagingArea,
}
