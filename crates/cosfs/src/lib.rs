//! # cosfs
//!
//! Hierarchical filesystem semantics over flat bucket/key object storage.
//!
//! Paths look like `cos://bucket/dir/file`. The object store only knows
//! whole objects addressed by key; this crate emulates directories on top:
//!
//! - **Reads**: each read is an independent ranged GET
//! - **Writes**: bytes are staged in a local temporary file and uploaded as
//!   a whole object on sync or close
//! - **Directories**: a bucket root, a zero-length `key/` marker, or any key
//!   prefix
//! - **Rename**: server-side copy then delete of every key under the source,
//!   not atomic
//! - **Glob**: `*`, `?` and `[...]` matched one path component at a time
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              CosFileSystem              │
//! ├──────────┬──────────┬─────────┬─────────┤
//! │  reader  │  writer  │  stat   │ listing │
//! │          │          │ rename  │  glob   │
//! ├──────────┴──────────┴─────────┴─────────┤
//! │         cosfs_client::ObjectStore       │
//! ├────────────────────┬────────────────────┤
//! │     CosClient      │ MemoryObjectStore  │
//! └────────────────────┴────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use cosfs::CosFileSystem;
//!
//! let fs = CosFileSystem::from_env();
//!
//! let mut file = fs.new_writable_file("cos://bucket/dir/hello.txt").await?;
//! file.append(b"Hello, World!").await?;
//! file.close().await?;
//!
//! assert_eq!(fs.get_children("cos://bucket/dir").await?, vec!["hello.txt"]);
//! ```

pub mod error;
pub mod filesystem;
pub mod glob;
pub mod listing;
pub mod path;
pub mod reader;
pub mod rename;
pub mod stat;
pub mod writer;

pub use error::{ErrorKind, FsError, Result};
pub use filesystem::{APPEND_CHUNK_SIZE, CosFileSystem, FileSystemOptions};
pub use path::ObjectPath;
pub use reader::RandomAccessFile;
pub use rename::{MovedObject, RenameReport, RenameStage};
pub use stat::{FileStatistics, Lookup};
pub use writer::WritableFile;

/// Re-export of the store layer
pub use cosfs_client;
