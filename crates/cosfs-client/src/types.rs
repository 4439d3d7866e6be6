//! Common types shared by store implementations

use serde::{Deserialize, Serialize};

/// Metadata returned by a HEAD request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Content length in bytes
    pub content_length: u64,
    /// Raw `Last-Modified` header, an HTTP-date
    pub last_modified: Option<String>,
    /// ETag
    pub etag: String,
    /// Content type
    pub content_type: Option<String>,
}

/// An object returned by a listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
}

/// Parameters of one listing request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRequest {
    /// Only keys starting with this prefix are returned
    pub prefix: String,
    /// Keys are rolled up into common prefixes at the first delimiter
    /// following the prefix
    pub delimiter: Option<String>,
    /// Listing starts after this key; echoed from the previous page
    pub marker: Option<String>,
    /// Maximum number of entries (keys plus common prefixes) per page
    pub max_keys: usize,
}

impl ListRequest {
    /// Default page size
    pub const DEFAULT_MAX_KEYS: usize = 1000;

    /// A flat listing of every key under `prefix`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: None,
            marker: None,
            max_keys: Self::DEFAULT_MAX_KEYS,
        }
    }

    /// Set the delimiter
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Set the page size; a page always holds at least one entry
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys.max(1);
        self
    }

    /// Set the continuation marker
    pub fn with_marker(mut self, marker: Option<String>) -> Self {
        self.marker = marker;
        self
    }
}

/// One page of a listing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Rolled-up prefixes, each ending with the delimiter
    pub common_prefixes: Vec<String>,
    /// Objects on this page
    pub contents: Vec<ObjectEntry>,
    /// Opaque marker for the next page
    pub next_marker: Option<String>,
    /// Whether more results follow
    pub is_truncated: bool,
}

impl ListPage {
    /// Marker to request the page after this one.
    ///
    /// Services omit `NextMarker` when no delimiter was sent; the last key of
    /// the page is the continuation point then.
    pub fn continuation(&self) -> Option<String> {
        self.next_marker.clone().or_else(|| {
            let last_key = self.contents.last().map(|o| o.key.as_str());
            let last_prefix = self.common_prefixes.last().map(String::as_str);
            last_key.max(last_prefix).map(str::to_string)
        })
    }
}

/// Source of a server-side copy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopySource {
    /// Source bucket
    pub bucket: String,
    /// Source key
    pub key: String,
}

impl CopySource {
    /// Create a copy source
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Path-style header value referencing this object on the given host
    pub fn header_value(&self, host: &str) -> String {
        format!("{}/{}/{}", host, self.bucket, self.encoded_key())
    }

    /// Virtual-host header value, `{bucket}.cos.{region}.myqcloud.com/{key}`
    pub fn virtual_host_value(&self, region: &str) -> String {
        format!("{}.cos.{}.myqcloud.com/{}", self.bucket, region, self.encoded_key())
    }

    fn encoded_key(&self) -> String {
        urlencoding::encode(&self.key).replace("%2F", "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuation_prefers_next_marker() {
        let page = ListPage {
            contents: vec![ObjectEntry { key: "a/1".into(), size: 1 }],
            next_marker: Some("opaque".into()),
            is_truncated: true,
            ..Default::default()
        };
        assert_eq!(page.continuation().as_deref(), Some("opaque"));
    }

    #[test]
    fn test_continuation_falls_back_to_last_entry() {
        let page = ListPage {
            common_prefixes: vec!["a/z/".into()],
            contents: vec![ObjectEntry { key: "a/b".into(), size: 1 }],
            next_marker: None,
            is_truncated: true,
        };
        assert_eq!(page.continuation().as_deref(), Some("a/z/"));
    }

    #[test]
    fn test_copy_source_header() {
        let source = CopySource::new("bucket-1250000000", "dir/my file.txt");
        assert_eq!(
            source.header_value("cos.ap-guangzhou.myqcloud.com"),
            "cos.ap-guangzhou.myqcloud.com/bucket-1250000000/dir/my%20file.txt"
        );
        assert_eq!(
            source.virtual_host_value("ap-guangzhou"),
            "bucket-1250000000.cos.ap-guangzhou.myqcloud.com/dir/my%20file.txt"
        );
    }

    #[test]
    fn test_page_size_is_at_least_one() {
        assert_eq!(ListRequest::new("p").with_max_keys(0).max_keys, 1);
        assert_eq!(ListRequest::new("p").with_max_keys(7).max_keys, 7);
    }
}
