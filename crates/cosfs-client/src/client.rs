//! HTTP object store client

use crate::{
    ClientConfig, ClientError, ObjectStore, Result,
    types::{CopySource, ListPage, ListRequest, ObjectEntry, ObjectMeta},
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response, StatusCode, header};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Header naming the source of a server-side copy
const COPY_SOURCE_HEADER: &str = "x-cos-copy-source";

/// Object store client speaking the COS/S3 XML API over HTTP.
///
/// Requests are path-style (`{endpoint}/{bucket}/{key}`). Copy sources use
/// the virtual-host form `{bucket}.cos.{region}.myqcloud.com/{key}` when the
/// endpoint is derived from the region, and the path-style form
/// `{host}/{bucket}/{key}` when an explicit endpoint is configured.
pub struct CosClient {
    config: ClientConfig,
    http: Client,
}

impl CosClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let user_agent = config
            .user_agent
            .parse()
            .map_err(|_| ClientError::Config(format!("invalid user agent: {}", config.user_agent)))?;
        headers.insert(header::USER_AGENT, user_agent);

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self { config, http })
    }

    /// Create with endpoint URL
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Self::new(ClientConfig::new(endpoint))
    }

    /// Get the configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ==================== Helper Methods ====================

    fn object_path(bucket: &str, key: &str) -> String {
        format!("/{}/{}", bucket, urlencoding::encode(key).replace("%2F", "/"))
    }

    fn copy_source_value(&self, source: &CopySource) -> String {
        if self.config.endpoint.is_empty() {
            source.virtual_host_value(&self.config.region)
        } else {
            source.header_value(&self.config.host())
        }
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        query: Option<&[(&str, String)]>,
        headers: Option<HashMap<&str, String>>,
        body: Option<Bytes>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.config.base_url(), path);

        let mut req = match method {
            "GET" => self.http.get(&url),
            "PUT" => self.http.put(&url),
            "DELETE" => self.http.delete(&url),
            "HEAD" => self.http.head(&url),
            _ => return Err(ClientError::Config(format!("Unknown method: {}", method))),
        };

        if let Some(q) = query {
            req = req.query(q);
        }

        if let Some(token) = &self.config.session_token {
            req = req.header(header::AUTHORIZATION, token);
        }

        if let Some(hdrs) = headers {
            for (k, v) in hdrs {
                req = req.header(k, v);
            }
        }

        if let Some(data) = body {
            req = req.body(data);
        }

        debug!("Sending {} request to {}", method, url);
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::from_service_xml(&text, status.as_u16()));
        }

        Ok(response)
    }
}

#[async_trait]
impl ObjectStore for CosClient {
    #[instrument(skip(self))]
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta> {
        let path = Self::object_path(bucket, key);
        let response = self
            .request("HEAD", &path, None, None, None)
            .await
            .map_err(|e| match e {
                // HEAD responses carry no error body
                ClientError::Service { code, .. } if code == "HTTP404" => ClientError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                },
                other => other,
            })?;

        let headers = response.headers();
        let header_str = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };

        Ok(ObjectMeta {
            content_length: header_str(header::CONTENT_LENGTH)
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            last_modified: header_str(header::LAST_MODIFIED),
            etag: header_str(header::ETAG)
                .map(|s| s.trim_matches('"').to_string())
                .unwrap_or_default(),
            content_type: header_str(header::CONTENT_TYPE),
        })
    }

    #[instrument(skip(self))]
    async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        len: u64,
    ) -> Result<Bytes> {
        if len == 0 {
            return Ok(Bytes::new());
        }
        let path = Self::object_path(bucket, key);
        let mut headers = HashMap::new();
        headers.insert(
            "Range",
            format!("bytes={}-{}", offset, offset.saturating_add(len - 1)),
        );

        let response = self.request("GET", &path, None, Some(headers), None).await?;
        let full_body = response.status() == StatusCode::OK;
        let data = response.bytes().await?;

        // A server that ignores Range answers 200 with the whole object
        if full_body {
            let size = data.len() as u64;
            if offset >= size {
                return Err(ClientError::InvalidRange { offset, size });
            }
            let end = offset.saturating_add(len).min(size);
            return Ok(data.slice(offset as usize..end as usize));
        }
        Ok(data)
    }

    #[instrument(skip(self, data), fields(len = data.len()))]
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        let path = Self::object_path(bucket, key);
        self.request("PUT", &path, None, None, Some(data)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_objects(&self, bucket: &str, request: &ListRequest) -> Result<ListPage> {
        let mut query = vec![
            ("prefix", request.prefix.clone()),
            ("max-keys", request.max_keys.max(1).to_string()),
        ];
        if let Some(delimiter) = &request.delimiter {
            query.push(("delimiter", delimiter.clone()));
        }
        if let Some(marker) = &request.marker {
            query.push(("marker", marker.clone()));
        }

        let path = format!("/{}", bucket);
        let response = self.request("GET", &path, Some(query.as_slice()), None, None).await?;
        let text = response.text().await?;
        parse_list_objects_response(&text)
    }

    #[instrument(skip(self))]
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let path = Self::object_path(bucket, key);
        self.request("DELETE", &path, None, None, None).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn copy_object(&self, source: &CopySource, bucket: &str, key: &str) -> Result<()> {
        let path = Self::object_path(bucket, key);
        let mut headers = HashMap::new();
        headers.insert(COPY_SOURCE_HEADER, self.copy_source_value(source));

        let response = self.request("PUT", &path, None, Some(headers), None).await?;
        let text = response.text().await?;
        // Copies can fail after the 200 status line has been sent
        if text.contains("<Error>") {
            return Err(ClientError::from_service_xml(&text, 200));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let path = format!("/{}", bucket);
        match self.request("HEAD", &path, None, None, None).await {
            Ok(_) => Ok(true),
            Err(ClientError::Service { code, .. }) if code == "NoSuchBucket" || code == "HTTP404" => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

// ==================== Response Parsers ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_marker: Option<String>,
    #[serde(default)]
    contents: Vec<ContentsXml>,
    #[serde(default)]
    common_prefixes: Vec<CommonPrefixXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContentsXml {
    key: String,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CommonPrefixXml {
    prefix: String,
}

fn parse_list_objects_response(xml: &str) -> Result<ListPage> {
    let result: ListBucketResult =
        quick_xml::de::from_str(xml).map_err(|e| ClientError::XmlParse(e.to_string()))?;

    Ok(ListPage {
        common_prefixes: result.common_prefixes.into_iter().map(|p| p.prefix).collect(),
        contents: result
            .contents
            .into_iter()
            .map(|c| ObjectEntry {
                key: c.key,
                size: c.size,
            })
            .collect(),
        next_marker: result.next_marker.filter(|m| !m.is_empty()),
        is_truncated: result.is_truncated,
    })
}
