//! `cos://bucket/key` path parsing

use crate::{FsError, Result};
use std::fmt;

/// URI scheme handled by this filesystem
pub const SCHEME: &str = "cos";

/// A parsed object path.
///
/// `key` is empty for a bucket root and ends with `/` for a directory
/// marker. `bucket` is never empty nor `"."`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectPath {
    bucket: String,
    key: String,
}

impl ObjectPath {
    /// Parse `cos://bucket/key`.
    ///
    /// Exactly one leading `/` is stripped from the key. An empty key is
    /// rejected unless `allow_empty_key` is set.
    pub fn parse(uri: &str, allow_empty_key: bool) -> Result<Self> {
        let (scheme, rest) = split_scheme(uri);
        if scheme != Some(SCHEME) {
            return Err(FsError::InvalidArgument(format!(
                "cos path doesn't start with '{}://': {}",
                SCHEME, uri
            )));
        }

        let (bucket, object) = match rest.find('/') {
            Some(pos) => rest.split_at(pos),
            None => (rest, ""),
        };
        if bucket.is_empty() || bucket == "." {
            return Err(FsError::InvalidArgument(format!(
                "cos path doesn't contain a bucket name: {}",
                uri
            )));
        }

        let key = object.strip_prefix('/').unwrap_or(object);
        if !allow_empty_key && key.is_empty() {
            return Err(FsError::InvalidArgument(format!(
                "cos path doesn't contain an object name: {}",
                uri
            )));
        }

        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key, possibly empty
    pub fn key(&self) -> &str {
        &self.key
    }

    /// True when the path names the bucket itself
    pub fn is_bucket_root(&self) -> bool {
        self.key.is_empty()
    }

    /// True when the key ends with `/`
    pub fn is_directory_marker(&self) -> bool {
        self.key.ends_with('/')
    }

    /// The same path with a trailing `/` on a non-empty key
    pub fn with_directory_suffix(&self) -> Self {
        let mut path = self.clone();
        if !path.key.is_empty() && !path.key.ends_with('/') {
            path.key.push('/');
        }
        path
    }

    /// The same path with one trailing `/` removed
    pub fn without_directory_suffix(&self) -> Self {
        let mut path = self.clone();
        if path.key.ends_with('/') {
            path.key.pop();
        }
        path
    }

    /// The root of this path's bucket
    pub fn bucket_root(&self) -> Self {
        Self {
            bucket: self.bucket.clone(),
            key: String::new(),
        }
    }

    /// A child entry named `name` under this path
    pub fn join(&self, name: &str) -> Self {
        let mut path = self.with_directory_suffix();
        path.key.push_str(name);
        path
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", SCHEME, self.bucket, self.key)
    }
}

/// Split `scheme://rest`. A string without a well-formed scheme has none.
fn split_scheme(uri: &str) -> (Option<&str>, &str) {
    match uri.split_once("://") {
        Some((scheme, rest))
            if scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
        {
            (Some(scheme), rest)
        }
        _ => (None, uri),
    }
}
