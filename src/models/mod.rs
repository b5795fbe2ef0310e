//! Core data models for the upload-and-search service.
//!
//! These entities describe the metadata records kept for uploaded documents
//! and the link-resolution results attached to search hits. Records map to
//! database rows via `sqlx::FromRow` and serialize as JSON via `serde`.

pub mod link;
pub mod record;
