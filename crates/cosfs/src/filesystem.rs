//! The filesystem façade over an object store

use crate::glob::{self, DirectoryTree};
use crate::listing::{self, LIST_PAGE_SIZE};
use crate::rename::{self, RenameReport};
use crate::stat::{self, FileStatistics, Lookup};
use crate::{FsError, ObjectPath, RandomAccessFile, Result, WritableFile};
use async_trait::async_trait;
use bytes::Bytes;
use cosfs_client::{ClientConfig, CosClient, ListRequest, ObjectStore};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

/// Chunk size used when loading an existing object into an appendable file
pub const APPEND_CHUNK_SIZE: usize = 1024 * 1024;

type StoreFactory = Box<dyn Fn() -> cosfs_client::Result<Arc<dyn ObjectStore>> + Send + Sync>;

/// Tunables of a [`CosFileSystem`]
#[derive(Clone, Debug)]
pub struct FileSystemOptions {
    list_page_size: usize,
    append_chunk_size: usize,
}

impl Default for FileSystemOptions {
    fn default() -> Self {
        Self {
            list_page_size: LIST_PAGE_SIZE,
            append_chunk_size: APPEND_CHUNK_SIZE,
        }
    }
}

impl FileSystemOptions {
    /// Set the listing page size
    pub fn with_list_page_size(mut self, size: usize) -> Self {
        self.list_page_size = size.max(1);
        self
    }

    /// Set the append preload chunk size
    pub fn with_append_chunk_size(mut self, size: usize) -> Self {
        self.append_chunk_size = size.max(1);
        self
    }

    /// Keys per listing page
    pub fn list_page_size(&self) -> usize {
        self.list_page_size
    }

    /// Bytes per read when preloading an appendable file
    pub fn append_chunk_size(&self) -> usize {
        self.append_chunk_size
    }
}

/// Hierarchical file operations over `cos://bucket/key` paths.
///
/// Directories are emulated: a directory exists when its bucket exists, when
/// a zero-length `key/` marker exists, or when any key starts with it.
///
/// The store is either injected up front or built lazily by a factory on
/// first use. The factory runs at most once even under concurrent first
/// calls; if it fails, the next call tries again.
pub struct CosFileSystem {
    store: OnceCell<Arc<dyn ObjectStore>>,
    factory: Option<StoreFactory>,
    options: FileSystemOptions,
}

impl CosFileSystem {
    /// Create a filesystem over an existing store
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store: OnceCell::new_with(Some(store)),
            factory: None,
            options: FileSystemOptions::default(),
        }
    }

    /// Create a filesystem whose store is built on first use
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> cosfs_client::Result<Arc<dyn ObjectStore>> + Send + Sync + 'static,
    {
        Self {
            store: OnceCell::new(),
            factory: Some(Box::new(factory)),
            options: FileSystemOptions::default(),
        }
    }

    /// Create a filesystem talking to COS, configured from `COS_*`
    /// environment variables on first use
    pub fn from_env() -> Self {
        Self::with_factory(|| {
            let config = ClientConfig::from_env()?;
            info!(endpoint = %config.base_url(), "creating cos client");
            let client: Arc<dyn ObjectStore> = Arc::new(CosClient::new(config)?);
            Ok(client)
        })
    }

    /// Replace the tunables
    pub fn with_options(mut self, options: FileSystemOptions) -> Self {
        self.options = options;
        self
    }

    /// Current tunables
    pub fn options(&self) -> &FileSystemOptions {
        &self.options
    }

    async fn store(&self) -> Result<Arc<dyn ObjectStore>> {
        let store = self
            .store
            .get_or_try_init(|| async {
                let factory = self.factory.as_ref().ok_or_else(|| {
                    FsError::Internal("no object store configured".to_string())
                })?;
                debug!("constructing object store");
                factory().map_err(|e| {
                    FsError::Internal(format!(
                        "could not create the object store: {}: {}",
                        e.code(),
                        e.message()
                    ))
                })
            })
            .await?;
        Ok(Arc::clone(store))
    }

    // ==================== Files ====================

    /// Open an object for random-access reads. Existence is not checked.
    #[instrument(skip(self))]
    pub async fn new_random_access_file(&self, uri: &str) -> Result<RandomAccessFile> {
        let path = ObjectPath::parse(uri, false)?;
        Ok(RandomAccessFile::new(path, self.store().await?))
    }

    /// Open a writer that replaces the object on sync or close
    #[instrument(skip(self))]
    pub async fn new_writable_file(&self, uri: &str) -> Result<WritableFile> {
        let path = ObjectPath::parse(uri, false)?;
        Ok(WritableFile::create(path, self.store().await?).await)
    }

    /// Open a writer preloaded with the current content of the object.
    ///
    /// The existing content is copied into the staging file chunk by chunk
    /// until the reader reports the end. A missing object yields an empty
    /// writer.
    #[instrument(skip(self))]
    pub async fn new_appendable_file(&self, uri: &str) -> Result<WritableFile> {
        let path = ObjectPath::parse(uri, false)?;
        let store = self.store().await?;
        let reader = RandomAccessFile::new(path.clone(), Arc::clone(&store));
        let mut writer = WritableFile::create(path, store).await;

        let chunk = self.options.append_chunk_size();
        let mut offset = 0u64;
        loop {
            match reader.read(offset, chunk).await {
                Ok(data) => writer.append(&data).await?,
                Err(FsError::OutOfRange(_)) => break,
                Err(e) => return Err(e),
            }
            offset += chunk as u64;
        }
        debug!(preloaded = offset, "appendable file ready");

        Ok(writer)
    }

    /// Load a whole object into memory; directories are rejected
    #[instrument(skip(self))]
    pub async fn new_read_only_memory_region(&self, uri: &str) -> Result<Bytes> {
        let stats = self.stat(uri).await?;
        if stats.is_directory {
            return Err(FsError::FailedPrecondition(format!("{} is a directory", uri)));
        }
        let length = stats.length;
        if length == 0 {
            return Ok(Bytes::new());
        }
        let file = self.new_random_access_file(uri).await?;
        file.read_exact_at(0, length as usize).await
    }

    // ==================== Metadata ====================

    /// Statistics of a file, a directory or a bucket
    #[instrument(skip(self))]
    pub async fn stat(&self, uri: &str) -> Result<FileStatistics> {
        let path = ObjectPath::parse(uri, true)?;
        self.lookup(&path).await?.into_statistics(&path)
    }

    /// Size of an object; zero for a directory
    #[instrument(skip(self))]
    pub async fn get_file_size(&self, uri: &str) -> Result<u64> {
        Ok(self.stat(uri).await?.length)
    }

    /// Check if anything exists at the path
    #[instrument(skip(self))]
    pub async fn file_exists(&self, uri: &str) -> Result<bool> {
        let path = ObjectPath::parse(uri, true)?;
        Ok(self.lookup(&path).await?.exists())
    }

    /// Succeed when the path is a directory.
    ///
    /// Fails with `FailedPrecondition` for a file and `NotFound` when
    /// nothing is there.
    #[instrument(skip(self))]
    pub async fn is_directory(&self, uri: &str) -> Result<()> {
        let stats = self.stat(uri).await?;
        if stats.is_directory {
            Ok(())
        } else {
            Err(FsError::FailedPrecondition(format!("{} is not a directory", uri)))
        }
    }

    async fn lookup(&self, path: &ObjectPath) -> Result<Lookup> {
        let store = self.store().await?;
        stat::resolve(store.as_ref(), path).await
    }

    // ==================== Directories ====================

    /// Names of the immediate children of a directory
    #[instrument(skip(self))]
    pub async fn get_children(&self, uri: &str) -> Result<Vec<String>> {
        let dir = ObjectPath::parse(uri, true)?;
        let store = self.store().await?;
        listing::list_children(store.as_ref(), &dir, self.options.list_page_size()).await
    }

    /// Create a directory marker; on a bucket root, check the bucket exists
    #[instrument(skip(self))]
    pub async fn create_dir(&self, uri: &str) -> Result<()> {
        let path = ObjectPath::parse(uri, true)?;
        let store = self.store().await?;

        if path.is_bucket_root() {
            return if store.bucket_exists(path.bucket()).await? {
                Ok(())
            } else {
                Err(FsError::NotFound(format!(
                    "the bucket {} was not found",
                    path.bucket()
                )))
            };
        }

        let mut marker = WritableFile::create(path.with_directory_suffix(), store).await;
        marker.close().await
    }

    /// Delete an empty directory
    #[instrument(skip(self))]
    pub async fn delete_dir(&self, uri: &str) -> Result<()> {
        let dir = ObjectPath::parse(uri, false)?.with_directory_suffix();
        let store = self.store().await?;

        let request = ListRequest::new(dir.key()).with_max_keys(2);
        let page = store.list_objects(dir.bucket(), &request).await?;

        match page.contents.as_slice() {
            [] => Ok(()),
            [only] if only.key == dir.key() => {
                store.delete_object(dir.bucket(), dir.key()).await?;
                Ok(())
            }
            _ => Err(FsError::FailedPrecondition(
                "cannot delete a non-empty directory".to_string(),
            )),
        }
    }

    // ==================== Mutation ====================

    /// Delete one object
    #[instrument(skip(self))]
    pub async fn delete_file(&self, uri: &str) -> Result<()> {
        let path = ObjectPath::parse(uri, false)?;
        let store = self.store().await?;
        store.delete_object(path.bucket(), path.key()).await?;
        Ok(())
    }

    /// Move a file or a whole prefix; see [`rename::rename`]
    #[instrument(skip(self))]
    pub async fn rename_file(&self, src: &str, target: &str) -> Result<RenameReport> {
        let src = ObjectPath::parse(src, false)?;
        let target = ObjectPath::parse(target, false)?;
        let store = self.store().await?;
        rename::rename(store.as_ref(), &src, &target, self.options.list_page_size()).await
    }

    // ==================== Glob ====================

    /// Paths matching a wildcard pattern, sorted
    #[instrument(skip(self))]
    pub async fn get_matching_paths(&self, pattern: &str) -> Result<Vec<String>> {
        glob::get_matching_paths(self, pattern).await
    }
}

#[async_trait]
impl DirectoryTree for CosFileSystem {
    async fn children(&self, dir: &ObjectPath) -> Result<Vec<String>> {
        let store = self.store().await?;
        listing::list_children(store.as_ref(), dir, self.options.list_page_size()).await
    }

    async fn exists(&self, path: &ObjectPath) -> Result<bool> {
        Ok(self.lookup(path).await?.exists())
    }
}
