//! Rename as copy-then-delete over every key under a prefix
//!
//! Object stores have no rename. Moving a path moves every key that starts
//! with the source key, one object at a time, so a rename is not atomic:
//! when a step fails the objects already moved stay moved and the rest stay
//! where they were. The error reports exactly which keys made it.

use crate::listing::list_keys;
use crate::{FsError, ObjectPath, Result};
use cosfs_client::{CopySource, ObjectStore};
use std::fmt;
use tracing::{debug, warn};

/// One object moved by a rename
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovedObject {
    pub source_key: String,
    pub target_key: String,
}

/// Objects moved by a rename, in the order they were moved
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub moved: Vec<MovedObject>,
}

impl RenameReport {
    /// Number of objects moved
    pub fn len(&self) -> usize {
        self.moved.len()
    }

    /// True when nothing was moved
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty()
    }
}

impl fmt::Display for RenameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} objects moved", self.moved.len())
    }
}

/// Step of a per-object move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenameStage {
    Copy,
    Delete,
}

impl fmt::Display for RenameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameStage::Copy => f.write_str("copy"),
            RenameStage::Delete => f.write_str("delete"),
        }
    }
}

/// Move every key under `src` to the same suffix under `target`.
///
/// A source ending with `/` makes the target a directory too; otherwise one
/// trailing `/` is dropped from the target. Keys are enumerated before the
/// first copy.
pub async fn rename(
    store: &dyn ObjectStore,
    src: &ObjectPath,
    target: &ObjectPath,
    page_size: usize,
) -> Result<RenameReport> {
    let target = if src.is_directory_marker() {
        target.with_directory_suffix()
    } else {
        target.without_directory_suffix()
    };
    if target.key().is_empty() {
        return Err(FsError::InvalidArgument(format!(
            "cannot rename {} onto the bucket root {}",
            src, target
        )));
    }
    if src == &target {
        return Ok(RenameReport::default());
    }

    let keys = list_keys(store, src.bucket(), src.key(), page_size).await?;
    debug!(src = %src, target = %target, keys = keys.len(), "renaming");

    let mut report = RenameReport::default();
    for key in keys {
        let suffix = &key[src.key().len()..];
        let target_key = format!("{}{}", target.key(), suffix);

        let source = CopySource::new(src.bucket(), key.as_str());
        if let Err(e) = store.copy_object(&source, target.bucket(), &target_key).await {
            return Err(incomplete(report, key, RenameStage::Copy, e));
        }
        if let Err(e) = store.delete_object(src.bucket(), &key).await {
            return Err(incomplete(report, key, RenameStage::Delete, e));
        }

        report.moved.push(MovedObject {
            source_key: key,
            target_key,
        });
    }

    Ok(report)
}

fn incomplete(
    report: RenameReport,
    failed_key: String,
    stage: RenameStage,
    err: cosfs_client::ClientError,
) -> FsError {
    warn!(key = %failed_key, %stage, moved = report.len(), error = %err, "rename stopped");
    FsError::RenameIncomplete {
        report,
        failed_key,
        stage,
        message: format!("{}: {}", err.code(), err.message()),
    }
}
