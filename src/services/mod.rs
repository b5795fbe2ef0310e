//! Service layer: the staging area and storage gateways, plus the
//! workflows that orchestrate them.

pub mod drive_service;
pub mod record_service;
pub mod search_service;
pub mod staging;
pub mod upload_service;
