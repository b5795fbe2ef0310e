//! notedrop — a small backend that accepts document uploads, stores the
//! blobs in a remote drive, indexes their metadata for full-text search,
//! and resolves search results back into shareable links.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
