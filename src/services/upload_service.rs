//! UploadService — drives one staged blob through the remote drive and the
//! metadata store.

use crate::{
    models::record::NewRecord,
    services::{
        drive_service::{DriveError, DriveService},
        record_service::{RecordError, RecordService},
        staging::StagedBlob,
    },
};
use thiserror::Error;
use tracing::{info, warn};

/// How an upload run failed.
///
/// `Persist` carries the remote file id so callers can report the orphaned
/// blob left behind in the drive.
#[derive(Debug, Error)]
pub enum UploadFlowError {
    #[error(transparent)]
    Drive(#[from] DriveError),
    #[error("uploaded blob {remote_file_id} could not be recorded: {source}")]
    Persist {
        remote_file_id: String,
        #[source]
        source: RecordError,
    },
}

/// Descriptive fields accompanying an uploaded blob.
#[derive(Debug, Clone)]
pub struct UploadMeta {
    pub title: Option<String>,
    pub college: Option<String>,
    pub category: Option<String>,
    pub file_name: String,
    pub mime_type: String,
}

/// Orchestrates authorize, blob transfer, and metadata insert for one
/// upload.
#[derive(Clone)]
pub struct UploadService {
    drive: DriveService,
    records: RecordService,
}

impl UploadService {
    pub fn new(drive: DriveService, records: RecordService) -> Self {
        Self { drive, records }
    }

    /// Push a staged blob to the drive, record its metadata, and remove the
    /// staged file. Returns the id the drive assigned to the blob.
    ///
    /// The staged file is removed on every path out of this function, and
    /// only this upload's file; concurrently staged uploads keep theirs. A
    /// persist failure leaves the remote blob in place and reports its id.
    pub async fn run(
        &self,
        blob: StagedBlob,
        meta: UploadMeta,
    ) -> Result<String, UploadFlowError> {
        let result = self.transfer(&blob, &meta).await;
        blob.discard().await;
        result
    }

    async fn transfer(
        &self,
        blob: &StagedBlob,
        meta: &UploadMeta,
    ) -> Result<String, UploadFlowError> {
        let token = self.drive.authorize().await?;
        let remote_file_id = self
            .drive
            .upload(&token, blob, &meta.file_name, &meta.mime_type)
            .await?;
        info!(file = %meta.file_name, id = %remote_file_id, "stored blob in drive");

        let record = self
            .records
            .insert(NewRecord {
                title: meta.title.clone(),
                college: meta.college.clone(),
                category: meta.category.clone(),
                file_names: vec![meta.file_name.clone()],
            })
            .await
            .map_err(|source| {
                warn!(
                    id = %remote_file_id,
                    "metadata insert failed after drive upload; remote blob is orphaned"
                );
                UploadFlowError::Persist {
                    remote_file_id: remote_file_id.clone(),
                    source,
                }
            })?;
        info!(record = %record.id, "metadata record written");

        Ok(remote_file_id)
    }
}
