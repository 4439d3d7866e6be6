//! Random-access reads over ranged GETs

use crate::{FsError, ObjectPath, Result};
use bytes::Bytes;
use cosfs_client::ObjectStore;
use std::sync::Arc;
use tracing::debug;

/// A read handle on one object.
///
/// Every [`read`](Self::read) is an independent ranged GET; the handle keeps
/// no position, so reads at different offsets may run concurrently.
#[derive(Clone)]
pub struct RandomAccessFile {
    path: ObjectPath,
    store: Arc<dyn ObjectStore>,
}

impl RandomAccessFile {
    pub(crate) fn new(path: ObjectPath, store: Arc<dyn ObjectStore>) -> Self {
        Self { path, store }
    }

    /// Path of the object being read
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Read up to `len` bytes at `offset`.
    ///
    /// The result is shorter than `len` when the object ends first. Any store
    /// failure, including an offset past the end, is reported as
    /// [`FsError::OutOfRange`], which callers treat as end of stream.
    pub async fn read(&self, offset: u64, len: usize) -> Result<Bytes> {
        if len == 0 {
            return Ok(Bytes::new());
        }

        match self
            .store
            .get_object_range(self.path.bucket(), self.path.key(), offset, len as u64)
            .await
        {
            Ok(data) => Ok(data),
            Err(e) => {
                debug!(path = %self.path, offset, len, error = %e, "ranged read failed");
                Err(FsError::OutOfRange("read less bytes than requested".to_string()))
            }
        }
    }

    /// Read exactly `len` bytes at `offset`, failing with
    /// [`FsError::DataLoss`] on a short read.
    pub async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes> {
        let data = self.read(offset, len).await?;
        if data.len() != len {
            return Err(FsError::DataLoss(format!(
                "expected {} got {} bytes",
                len,
                data.len()
            )));
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use cosfs_client::MemoryObjectStore;

    async fn reader_over(content: &'static [u8]) -> RandomAccessFile {
        let store = MemoryObjectStore::with_buckets(["b"]);
        store.put_object("b", "f", Bytes::from_static(content)).await.unwrap();
        let path = ObjectPath::parse("cos://b/f", false).unwrap();
        RandomAccessFile::new(path, Arc::new(store))
    }

    #[tokio::test]
    async fn test_partial_range() {
        let reader = reader_over(b"abcdefghijklmn").await;
        assert_eq!(reader.read(2, 4).await.unwrap().as_ref(), b"cdef");
        assert_eq!(reader.read(0, 14).await.unwrap().as_ref(), b"abcdefghijklmn");
    }

    #[tokio::test]
    async fn test_short_read_is_not_an_error() {
        let reader = reader_over(b"abcdefghijklmn").await;
        assert_eq!(reader.read(10, 100).await.unwrap().as_ref(), b"klmn");

        let err = reader.read_exact_at(10, 100).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataLoss);
    }

    #[tokio::test]
    async fn test_end_of_stream() {
        let reader = reader_over(b"abc").await;
        let err = reader.read(3, 10).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[tokio::test]
    async fn test_concurrent_reads() {
        let reader = reader_over(b"0123456789").await;
        let (a, b) = tokio::join!(reader.read(0, 5), reader.read(5, 5));
        assert_eq!(a.unwrap().as_ref(), b"01234");
        assert_eq!(b.unwrap().as_ref(), b"56789");
    }
}
