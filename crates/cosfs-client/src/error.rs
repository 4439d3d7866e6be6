//! Client error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error reported by the object store service
    #[error("service error ({code}): {message}")]
    Service {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Object not found
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Bucket not found
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    /// Requested byte range lies outside the object
    #[error("Invalid range: offset {offset} of object with {size} bytes")]
    InvalidRange { offset: u64, size: u64 },
}

impl ClientError {
    /// Parse a service error from an XML error body
    pub fn from_service_xml(xml: &str, status: u16) -> Self {
        let code = extract_xml_element(xml, "Code").unwrap_or_else(|| format!("HTTP{}", status));
        let message = extract_xml_element(xml, "Message").unwrap_or_else(|| "Unknown error".to_string());
        let request_id = extract_xml_element(xml, "RequestId");

        Self::Service {
            code,
            message,
            request_id,
        }
    }

    /// Short machine-readable code for this error
    pub fn code(&self) -> String {
        match self {
            Self::Http(_) => "HttpError".to_string(),
            Self::Service { code, .. } => code.clone(),
            Self::Config(_) => "ConfigError".to_string(),
            Self::Io(_) => "IoError".to_string(),
            Self::XmlParse(_) => "MalformedXML".to_string(),
            Self::NotFound { .. } => "NoSuchKey".to_string(),
            Self::BucketNotFound(_) => "NoSuchBucket".to_string(),
            Self::InvalidRange { .. } => "InvalidRange".to_string(),
        }
    }

    /// Human-readable message without the code
    pub fn message(&self) -> String {
        match self {
            Self::Service { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::BucketNotFound(_))
            || matches!(self, Self::Service { code, .. } if code == "NoSuchKey" || code == "NoSuchBucket")
    }
}

fn extract_xml_element(xml: &str, element: &str) -> Option<String> {
    let start_tag = format!("<{}>", element);
    let end_tag = format!("</{}>", element);

    let start = xml.find(&start_tag)? + start_tag.len();
    let end = xml.find(&end_tag)?;

    if start < end {
        Some(xml[start..end].to_string())
    } else {
        None
    }
}
