//! Buffered writers that upload whole objects

use crate::{FsError, ObjectPath, Result};
use bytes::Bytes;
use cosfs_client::ObjectStore;
use std::io::SeekFrom;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, instrument, warn};

/// A write handle that stages bytes locally and uploads the whole object.
///
/// Appends go to an anonymous temporary file. [`sync`](Self::sync) uploads
/// the entire staged content with a single PUT, so each sync costs
/// O(total size) in transfer: syncing a large, frequently appended file
/// repeatedly re-sends everything written so far. There is no partial or
/// incremental upload.
///
/// A new writer starts empty and dirty: closing it without any append still
/// replaces the object with empty content.
pub struct WritableFile {
    path: ObjectPath,
    store: Arc<dyn ObjectStore>,
    staging: Option<File>,
    dirty: bool,
}

impl WritableFile {
    pub(crate) async fn create(path: ObjectPath, store: Arc<dyn ObjectStore>) -> Self {
        let staging = match open_staging().await {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(path = %path, error = %e, "could not open staging file");
                None
            }
        };
        Self {
            path,
            store,
            staging,
            dirty: true,
        }
    }

    /// Path of the object being written
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// True once the writer has been closed
    pub fn is_closed(&self) -> bool {
        self.staging.is_none()
    }

    /// Append bytes to the staged content
    pub async fn append(&mut self, data: &[u8]) -> Result<()> {
        let staging = self.staging.as_mut().ok_or_else(staging_unavailable)?;
        self.dirty = true;
        staging.write_all(data).await.map_err(|e| {
            FsError::Internal(format!("could not append to the staging file: {}", e))
        })
    }

    /// Upload the staged content if anything changed since the last upload
    #[instrument(skip(self), fields(path = %self.path))]
    pub async fn sync(&mut self) -> Result<()> {
        let staging = self.staging.as_mut().ok_or_else(staging_unavailable)?;
        if !self.dirty {
            return Ok(());
        }

        let content = read_staged(staging)
            .await
            .map_err(|e| FsError::Internal(format!("could not read the staging file: {}", e)))?;
        debug!(len = content.len(), "uploading staged content");

        self.store
            .put_object(self.path.bucket(), self.path.key(), content)
            .await?;
        self.dirty = false;
        Ok(())
    }

    /// Same as [`sync`](Self::sync)
    pub async fn flush(&mut self) -> Result<()> {
        self.sync().await
    }

    /// Upload pending content and release the staging file.
    ///
    /// The staging file is released even when the final upload fails.
    /// Closing an already closed writer does nothing.
    pub async fn close(&mut self) -> Result<()> {
        if self.staging.is_none() {
            return Ok(());
        }
        let result = self.sync().await;
        self.staging = None;
        result
    }
}

impl Drop for WritableFile {
    fn drop(&mut self) {
        if self.staging.is_some() && self.dirty {
            warn!(path = %self.path, "writer dropped without close; staged content discarded");
        }
    }
}

fn staging_unavailable() -> FsError {
    FsError::FailedPrecondition("the staging file is not writable".to_string())
}

/// Create the anonymous staging file off the async worker threads
async fn open_staging() -> std::io::Result<File> {
    let file = tokio::task::spawn_blocking(tempfile::tempfile)
        .await
        .map_err(std::io::Error::other)??;
    Ok(File::from_std(file))
}

/// Read the whole staging file, leaving the write position where it was
async fn read_staged(staging: &mut File) -> std::io::Result<Bytes> {
    staging.flush().await?;
    let position = staging.stream_position().await?;
    staging.seek(SeekFrom::Start(0)).await?;

    let mut content = Vec::with_capacity(position as usize);
    let read = staging.read_to_end(&mut content).await;
    staging.seek(SeekFrom::Start(position)).await?;
    read?;

    Ok(Bytes::from(content))
}
