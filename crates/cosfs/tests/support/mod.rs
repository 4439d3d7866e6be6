//! Shared fixtures for cosfs integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use cosfs::CosFileSystem;
use cosfs::cosfs_client::{
    ClientError, CopySource, ListPage, ListRequest, MemoryObjectStore, ObjectMeta, ObjectStore,
    Result,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A filesystem over a fresh memory store with the given buckets
pub fn memory_fs(buckets: &[&str]) -> (CosFileSystem, MemoryObjectStore) {
    let store = MemoryObjectStore::with_buckets(buckets.iter().copied());
    (CosFileSystem::new(Arc::new(store.clone())), store)
}

/// Store a set of objects whose content is their own key
pub async fn seed(store: &MemoryObjectStore, bucket: &str, keys: &[&str]) {
    for key in keys {
        store
            .put_object(bucket, key, Bytes::copy_from_slice(key.as_bytes()))
            .await
            .unwrap();
    }
}

/// Which store call a [`FaultyStore`] should fail
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    Copy(String),
    Delete(String),
    List,
    /// The nth listing call, counting from 1
    ListCall(usize),
}

/// A memory store that fails selected calls with a service error
#[derive(Clone)]
pub struct FaultyStore {
    inner: MemoryObjectStore,
    faults: Arc<Mutex<Vec<Fault>>>,
    list_calls: Arc<AtomicUsize>,
}

impl FaultyStore {
    pub fn new(inner: MemoryObjectStore) -> Self {
        Self {
            inner,
            faults: Arc::default(),
            list_calls: Arc::default(),
        }
    }

    pub fn fail(&self, fault: Fault) {
        self.faults.lock().push(fault);
    }

    /// Listing calls made so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check(&self, fault: Fault) -> Result<()> {
        if self.faults.lock().contains(&fault) {
            return Err(ClientError::Service {
                code: "InternalError".to_string(),
                message: format!("injected {:?}", fault),
                request_id: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta> {
        self.inner.head_object(bucket, key).await
    }

    async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        len: u64,
    ) -> Result<Bytes> {
        self.inner.get_object_range(bucket, key, offset, len).await
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        self.inner.put_object(bucket, key, data).await
    }

    async fn list_objects(&self, bucket: &str, request: &ListRequest) -> Result<ListPage> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.check(Fault::List)?;
        self.check(Fault::ListCall(call))?;
        self.inner.list_objects(bucket, request).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.check(Fault::Delete(key.to_string()))?;
        self.inner.delete_object(bucket, key).await
    }

    async fn copy_object(&self, source: &CopySource, bucket: &str, key: &str) -> Result<()> {
        self.check(Fault::Copy(source.key.clone()))?;
        self.inner.copy_object(source, bucket, key).await
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        self.inner.bucket_exists(bucket).await
    }
}
