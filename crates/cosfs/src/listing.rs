//! Directory emulation over delimited, paginated listings

use crate::{FsError, ObjectPath, Result};
use cosfs_client::{ListPage, ListRequest, ObjectStore};
use tracing::debug;

/// Keys requested per listing page
pub const LIST_PAGE_SIZE: usize = ListRequest::DEFAULT_MAX_KEYS;

/// Immediate children of a directory, names relative to it.
///
/// Subdirectories come back without their trailing `/`. The directory's own
/// marker object is not a child. An empty key lists the bucket root. On any
/// failure the partial result is discarded.
pub async fn list_children(
    store: &dyn ObjectStore,
    dir: &ObjectPath,
    page_size: usize,
) -> Result<Vec<String>> {
    let prefix = dir.with_directory_suffix().key().to_string();
    let mut request = ListRequest::new(prefix.as_str())
        .with_delimiter("/")
        .with_max_keys(page_size);
    let mut children = Vec::new();

    loop {
        let page = store.list_objects(dir.bucket(), &request).await?;
        debug!(
            prefix = %prefix,
            prefixes = page.common_prefixes.len(),
            objects = page.contents.len(),
            truncated = page.is_truncated,
            "listed page"
        );

        for common_prefix in &page.common_prefixes {
            let name = relative(common_prefix, &prefix).trim_end_matches('/');
            if !name.is_empty() {
                children.push(name.to_string());
            }
        }
        for object in &page.contents {
            let name = relative(&object.key, &prefix);
            if !name.is_empty() {
                children.push(name.to_string());
            }
        }

        if !page.is_truncated {
            return Ok(children);
        }
        let marker = next_marker(&page, request.marker.as_deref())?;
        request = request.with_marker(Some(marker));
    }
}

/// Every key under `prefix`, flat and in store order
pub async fn list_keys(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    page_size: usize,
) -> Result<Vec<String>> {
    let mut request = ListRequest::new(prefix).with_max_keys(page_size);
    let mut keys = Vec::new();

    loop {
        let page = store.list_objects(bucket, &request).await?;
        keys.extend(page.contents.iter().map(|object| object.key.clone()));

        if !page.is_truncated {
            return Ok(keys);
        }
        let marker = next_marker(&page, request.marker.as_deref())?;
        request = request.with_marker(Some(marker));
    }
}

/// Marker of the page after a truncated `page`.
///
/// A truncated page must move the listing forward; a missing or repeated
/// marker would restart or repeat the same page forever.
fn next_marker(page: &ListPage, previous: Option<&str>) -> Result<String> {
    match page.continuation() {
        Some(marker) if previous != Some(marker.as_str()) => Ok(marker),
        _ => Err(FsError::Internal(format!(
            "listing made no progress after marker {:?}",
            previous.unwrap_or("")
        ))),
    }
}

fn relative<'a>(key: &'a str, prefix: &str) -> &'a str {
    key.strip_prefix(prefix).unwrap_or(key)
}
