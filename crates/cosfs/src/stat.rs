//! Resolving a path to a file, a directory, or nothing

use crate::{FsError, ObjectPath, Result};
use chrono::NaiveDateTime;
use cosfs_client::{HTTP_DATE_FORMAT, ListRequest, ObjectStore};
use tracing::debug;

/// Metadata of a path as seen by filesystem callers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileStatistics {
    /// Object size; zero for directories
    pub length: u64,
    /// True for a bucket root or a key prefix
    pub is_directory: bool,
    /// Last modification time in nanoseconds since the epoch; zero if unknown
    pub modified_at_nanos: i64,
}

impl FileStatistics {
    /// Statistics of a directory
    pub fn directory() -> Self {
        Self {
            length: 0,
            is_directory: true,
            modified_at_nanos: 0,
        }
    }

    /// Statistics of a regular file
    pub fn file(length: u64, modified_at_nanos: i64) -> Self {
        Self {
            length,
            is_directory: false,
            modified_at_nanos,
        }
    }
}

/// What a path resolved to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// An object exists at the exact key
    Object(FileStatistics),
    /// No object at the key, but other keys start with it
    DirectoryPrefix,
    /// The path names an existing bucket
    BucketRoot,
    /// Nothing at the path
    Absent,
}

impl Lookup {
    /// True unless the path resolved to nothing
    pub fn exists(&self) -> bool {
        !matches!(self, Lookup::Absent)
    }

    /// Turn the lookup into statistics, `NotFound` when absent
    pub fn into_statistics(self, path: &ObjectPath) -> Result<FileStatistics> {
        match self {
            Lookup::Object(stats) => Ok(stats),
            Lookup::DirectoryPrefix | Lookup::BucketRoot => Ok(FileStatistics::directory()),
            Lookup::Absent if path.is_bucket_root() => Err(FsError::NotFound(format!(
                "the bucket {} was not found",
                path.bucket()
            ))),
            Lookup::Absent => Err(FsError::NotFound(format!("object {} does not exist", path))),
        }
    }
}

/// Resolve `path` against the store.
///
/// An exact object wins over a prefix. Listing failures during the prefix
/// fallback count as absent.
pub async fn resolve(store: &dyn ObjectStore, path: &ObjectPath) -> Result<Lookup> {
    if path.is_bucket_root() {
        return Ok(if store.bucket_exists(path.bucket()).await? {
            Lookup::BucketRoot
        } else {
            Lookup::Absent
        });
    }

    match store.head_object(path.bucket(), path.key()).await {
        Ok(meta) => {
            let modified = meta
                .last_modified
                .as_deref()
                .map(parse_http_date)
                .unwrap_or(0);
            return Ok(Lookup::Object(FileStatistics::file(
                meta.content_length,
                modified,
            )));
        }
        Err(e) => debug!(path = %path, error = %e, "head failed, trying as prefix"),
    }

    let request = ListRequest::new(path.key()).with_max_keys(2);
    match store.list_objects(path.bucket(), &request).await {
        Ok(page) if !page.contents.is_empty() => Ok(Lookup::DirectoryPrefix),
        Ok(_) => Ok(Lookup::Absent),
        Err(e) => {
            debug!(path = %path, error = %e, "prefix listing failed");
            Ok(Lookup::Absent)
        }
    }
}

/// Nanoseconds since the epoch of an HTTP-date, zero when malformed
pub fn parse_http_date(value: &str) -> i64 {
    NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT)
        .ok()
        .and_then(|time| time.and_utc().timestamp_nanos_opt())
        .unwrap_or(0)
}
