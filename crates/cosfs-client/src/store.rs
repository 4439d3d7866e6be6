//! The object store capability

use crate::{
    Result,
    types::{CopySource, ListPage, ListRequest, ObjectMeta},
};
use async_trait::async_trait;
use bytes::Bytes;

/// The primitives a flat bucket/key object store exposes.
///
/// None of them carry hierarchy or transactional semantics; directory
/// emulation is layered on top by callers.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch object metadata without content
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta>;

    /// Fetch `len` bytes starting at `offset`.
    ///
    /// The returned buffer is shorter than `len` when the object ends first.
    /// An `offset` at or past the end of the object is an error.
    async fn get_object_range(&self, bucket: &str, key: &str, offset: u64, len: u64)
        -> Result<Bytes>;

    /// Replace the whole object with `data`
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<()>;

    /// Fetch one page of a listing
    async fn list_objects(&self, bucket: &str, request: &ListRequest) -> Result<ListPage>;

    /// Delete an object; deleting an absent key succeeds
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Server-side copy of `source` to `bucket`/`key`
    async fn copy_object(&self, source: &CopySource, bucket: &str, key: &str) -> Result<()>;

    /// Check if a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;
}
