//! Staging area for uploaded blobs awaiting transfer to the remote drive.
//!
//! Every upload stages its payload under a unique name and receives a
//! `StagedBlob` handle that owns exactly that file. Cleanup is scoped to the
//! handle: discarding or dropping it removes its own file and nothing else,
//! so concurrent uploads never disturb each other's staged data.

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

/// Hands out per-upload staging files beneath a base directory.
#[derive(Clone, Debug)]
pub struct StagingArea {
    base_path: PathBuf,
}

impl StagingArea {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Directory holding the staged files.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Create the staging directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.base_path).await
    }

    /// Open a fresh staged file for one upload.
    ///
    /// The staged name embeds a UUID so concurrent uploads of identically
    /// named payloads never collide on disk.
    pub async fn stage(&self, original_name: &str) -> io::Result<StagedBlob> {
        self.ensure_dir().await?;
        let staged_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(original_name));
        let path = self.base_path.join(staged_name);
        let file = File::create(&path).await?;
        Ok(StagedBlob {
            path,
            file: Some(file),
            cleaned: false,
        })
    }
}

/// An open staged file owned by a single upload request.
///
/// The handle removes its own file when discarded and, best-effort, when
/// dropped, so error paths and cancelled requests do not leak staged data.
/// It never touches any other file in the staging directory.
#[derive(Debug)]
pub struct StagedBlob {
    path: PathBuf,
    file: Option<File>,
    cleaned: bool,
}

impl StagedBlob {
    /// Path of the staged file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a chunk of the incoming payload.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(chunk).await,
            None => Err(io::Error::new(
                ErrorKind::Other,
                "staged file already finished",
            )),
        }
    }

    /// Flush and close the write handle once the payload is complete.
    pub async fn finish(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }

    /// Reopen the staged file for reading.
    pub async fn reader(&self) -> io::Result<File> {
        File::open(&self.path).await
    }

    /// Remove this upload's staged file.
    pub async fn discard(mut self) {
        self.file.take();
        self.cleaned = true;
        match fs::remove_file(&self.path).await {
            Ok(_) => debug!("removed staged file {}", self.path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => debug!(
                "failed to remove staged file {}: {}",
                self.path.display(),
                err
            ),
        }
    }
}

impl Drop for StagedBlob {
    fn drop(&mut self) {
        if self.cleaned {
            return;
        }
        self.file.take();
        match std::fs::remove_file(&self.path) {
            Ok(_) => debug!("removed staged file {} on drop", self.path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => debug!(
                "failed to remove staged file {} on drop: {}",
                self.path.display(),
                err
            ),
        }
    }
}

/// Keep only the final path component and drop control characters, so staged
/// names cannot escape the staging directory.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
