//! In-memory object store for testing and local development

use crate::{
    ClientError, ObjectStore, Result,
    types::{CopySource, ListPage, ListRequest, ObjectEntry, ObjectMeta},
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Format of the `Last-Modified` header
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Clone, Debug)]
struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

type Bucket = BTreeMap<String, StoredObject>;

/// An in-memory object store.
///
/// Keys are kept sorted per bucket so listings behave like a real service:
/// lexicographic order, delimiter roll-up and marker-based pagination.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    buckets: Arc<RwLock<BTreeMap<String, Bucket>>>,
    puts: Arc<AtomicU64>,
}

impl MemoryObjectStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given buckets already present
    pub fn with_buckets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for name in names {
            store.create_bucket(name);
        }
        store
    }

    /// Create a bucket; creating an existing bucket keeps its contents
    pub fn create_bucket(&self, name: impl Into<String>) {
        self.buckets.write().entry(name.into()).or_default();
    }

    /// Number of objects in a bucket
    pub fn object_count(&self, bucket: &str) -> usize {
        self.buckets.read().get(bucket).map_or(0, BTreeMap::len)
    }

    /// All keys of a bucket, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .read()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Raw content of an object
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.buckets
            .read()
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| object.data.clone())
    }

    /// Number of `put_object` calls served so far
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }

    fn with_object<T>(
        &self,
        bucket: &str,
        key: &str,
        f: impl FnOnce(&StoredObject) -> T,
    ) -> Result<T> {
        let buckets = self.buckets.read();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| ClientError::BucketNotFound(bucket.to_string()))?;
        objects
            .get(key)
            .map(f)
            .ok_or_else(|| ClientError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    fn insert(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        let mut buckets = self.buckets.write();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| ClientError::BucketNotFound(bucket.to_string()))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta> {
        self.with_object(bucket, key, |object| ObjectMeta {
            content_length: object.data.len() as u64,
            last_modified: Some(object.last_modified.format(HTTP_DATE_FORMAT).to_string()),
            etag: format!("{:x}", object.data.len()),
            content_type: None,
        })
    }

    async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        len: u64,
    ) -> Result<Bytes> {
        let data = self.with_object(bucket, key, |object| object.data.clone())?;
        let size = data.len() as u64;
        if offset >= size {
            return Err(ClientError::InvalidRange { offset, size });
        }
        let end = offset.saturating_add(len).min(size);
        Ok(data.slice(offset as usize..end as usize))
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.insert(bucket, key, data)
    }

    async fn list_objects(&self, bucket: &str, request: &ListRequest) -> Result<ListPage> {
        let buckets = self.buckets.read();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| ClientError::BucketNotFound(bucket.to_string()))?;

        let prefix = request.prefix.as_str();
        let marker = request.marker.as_deref();
        let max = request.max_keys.max(1);

        let mut page = ListPage::default();
        let mut count = 0;
        let mut last = None;

        for (key, object) in objects.range::<str, _>((Bound::Included(prefix), Bound::Unbounded)) {
            if !key.starts_with(prefix) {
                break;
            }
            if marker.is_some_and(|m| key.as_str() <= m) {
                continue;
            }

            // Roll the key up into a common prefix at the first delimiter
            // after the query prefix
            let common_prefix = request.delimiter.as_deref().and_then(|delim| {
                key[prefix.len()..]
                    .find(delim)
                    .map(|pos| key[..prefix.len() + pos + delim.len()].to_string())
            });

            if let Some(cp) = &common_prefix {
                if page.common_prefixes.last() == Some(cp) || marker == Some(cp.as_str()) {
                    continue;
                }
            }

            if count == max {
                page.is_truncated = true;
                break;
            }
            count += 1;

            match common_prefix {
                Some(cp) => {
                    last = Some(cp.clone());
                    page.common_prefixes.push(cp);
                }
                None => {
                    last = Some(key.clone());
                    page.contents.push(ObjectEntry {
                        key: key.clone(),
                        size: object.data.len() as u64,
                    });
                }
            }
        }

        if page.is_truncated {
            page.next_marker = last;
        }
        Ok(page)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut buckets = self.buckets.write();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| ClientError::BucketNotFound(bucket.to_string()))?;
        objects.remove(key);
        Ok(())
    }

    async fn copy_object(&self, source: &CopySource, bucket: &str, key: &str) -> Result<()> {
        let data = self.with_object(&source.bucket, &source.key, |object| object.data.clone())?;
        self.insert(bucket, key, data)
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        Ok(self.buckets.read().contains_key(bucket))
    }
}
