//! # cosfs client
//!
//! The object store capability consumed by the `cosfs` filesystem layer.
//!
//! ## Features
//!
//! - **`ObjectStore` trait**: head, ranged get, put, paginated list, delete,
//!   server-side copy and bucket existence; nothing more
//! - **`CosClient`**: the trait spoken over HTTP against a COS/S3-style XML API
//! - **`MemoryObjectStore`**: a sorted in-process store for tests and local use
//! - **`ClientConfig`**: built from a config file or individual settings
//!
//! ## Example
//!
//! ```rust,ignore
//! use cosfs_client::{ClientConfig, CosClient, ObjectStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CosClient::new(ClientConfig::from_env()?)?;
//!
//!     client.put_object("my-bucket", "hello.txt", "Hello, World!".into()).await?;
//!     let data = client.get_object_range("my-bucket", "hello.txt", 0, 5).await?;
//!     println!("Content: {}", String::from_utf8_lossy(&data));
//!
//!     Ok(())
//! }
//! ```

mod client;
pub mod config;
mod error;
mod memory;
mod store;
mod types;

pub use client::CosClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use memory::{HTTP_DATE_FORMAT, MemoryObjectStore};
pub use store::ObjectStore;
pub use types::*;
