//! SearchService — full-text search plus link resolution.
//!
//! Every hit's stored file names are resolved to shareable links
//! concurrently. A failed lookup degrades to a per-name status instead of
//! failing the request, and hit order follows the store's relevance ranking
//! throughout.

use crate::{
    models::{
        link::{LinkStatus, ResolvedLink, SearchHit},
        record::ScoredRecord,
    },
    services::{
        drive_service::{AccessToken, DriveError, DriveService},
        record_service::{RecordError, RecordService},
    },
};
use futures::future::join_all;
use thiserror::Error;
use tracing::warn;

/// How a search run failed. Per-name lookup failures are not in here; they
/// degrade to [`LinkStatus::LookupFailed`] entries on the hit.
#[derive(Debug, Error)]
pub enum SearchFlowError {
    #[error(transparent)]
    Drive(#[from] DriveError),
    #[error(transparent)]
    Records(#[from] RecordError),
}

/// Orchestrates authorize, full-text search, and link fan-out for one
/// query.
#[derive(Clone)]
pub struct SearchService {
    drive: DriveService,
    records: RecordService,
}

impl SearchService {
    pub fn new(drive: DriveService, records: RecordService) -> Self {
        Self { drive, records }
    }

    /// Run a free-text query and resolve every hit's file names to links.
    pub async fn run(&self, query: &str) -> Result<Vec<SearchHit>, SearchFlowError> {
        let token = self.drive.authorize().await?;
        let scored = self.records.search_by_text(query).await?;

        let hits = join_all(
            scored
                .into_iter()
                .map(|record| self.resolve_record(&token, record)),
        )
        .await;

        Ok(hits)
    }

    /// Resolve all file names of one record, preserving name order.
    async fn resolve_record(&self, token: &AccessToken, scored: ScoredRecord) -> SearchHit {
        let links = join_all(
            scored
                .record
                .file_names
                .iter()
                .map(|name| self.resolve_name(token, name)),
        )
        .await;

        SearchHit {
            record: scored.record,
            score: scored.score,
            links,
        }
    }

    async fn resolve_name(&self, token: &AccessToken, file_name: &str) -> ResolvedLink {
        match self.drive.find_link_by_name(token, file_name).await {
            Ok(Some(link)) => ResolvedLink {
                file_name: file_name.to_string(),
                file_link: Some(link),
                status: LinkStatus::Found,
            },
            Ok(None) => ResolvedLink {
                file_name: file_name.to_string(),
                file_link: None,
                status: LinkStatus::NotFound,
            },
            Err(err) => {
                warn!(file = %file_name, error = %err, "link lookup failed");
                ResolvedLink {
                    file_name: file_name.to_string(),
                    file_link: None,
                    status: LinkStatus::LookupFailed,
                }
            }
        }
    }
}
