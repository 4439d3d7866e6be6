//! Client configuration

use crate::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Names of the environment settings read by [`ClientConfig::from_env`]
pub mod vars {
    /// Path to a JSON configuration file; wins over every other setting
    pub const CONFIG_FILE: &str = "COS_CONFIG_FILE";
    /// Numeric account (application) id
    pub const APP_ID: &str = "COS_APPID";
    /// Region, e.g. `ap-guangzhou`
    pub const REGION: &str = "COS_REGION";
    /// Access key id
    pub const ACCESS_KEY: &str = "COS_ACCESS_KEY";
    /// Secret key
    pub const SECRET_KEY: &str = "COS_SECRET_KEY";
    /// Presence enables debug logging
    pub const DEBUG: &str = "COS_DEBUG";
    /// Explicit endpoint URL, overriding the one derived from the region
    pub const ENDPOINT: &str = "COS_ENDPOINT";
}

/// Client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service endpoint URL. Derived from `region` when empty.
    pub endpoint: String,
    /// Account id
    pub app_id: Option<u64>,
    /// Region
    pub region: String,
    /// Access key id
    pub access_key: Option<String>,
    /// Secret key
    pub secret_key: Option<String>,
    /// Pre-signed authorization token, sent verbatim when present
    pub session_token: Option<String>,
    /// Verbose logging
    pub debug: bool,
    /// Request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            app_id: None,
            region: "ap-guangzhou".to_string(),
            access_key: None,
            secret_key: None,
            session_token: None,
            debug: false,
            timeout: Duration::from_secs(30),
            user_agent: format!("cosfs-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a new config with the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the region
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the credentials
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Set the pre-signed token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_source(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary key-value source.
    ///
    /// When [`vars::CONFIG_FILE`] is set the file is the only input; the
    /// individual settings are consulted otherwise. An unparsable app id is
    /// ignored rather than rejected.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(vars::CONFIG_FILE) {
            return Self::from_file(path);
        }

        let mut config = Self::default();
        if let Some(app_id) = lookup(vars::APP_ID).and_then(|v| v.trim().parse().ok()) {
            config.app_id = Some(app_id);
        }
        if let Some(region) = lookup(vars::REGION) {
            config.region = region;
        }
        config.access_key = lookup(vars::ACCESS_KEY);
        config.secret_key = lookup(vars::SECRET_KEY);
        config.debug = lookup(vars::DEBUG).is_some();
        if let Some(endpoint) = lookup(vars::ENDPOINT) {
            config.endpoint = endpoint;
        }
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            ClientError::Config(format!("invalid config file {}: {}", path.display(), e))
        })
    }

    /// Build the base URL for API requests
    pub fn base_url(&self) -> String {
        if self.endpoint.is_empty() {
            format!("https://cos.{}.myqcloud.com", self.region)
        } else {
            self.endpoint.trim_end_matches('/').to_string()
        }
    }

    /// Host part of the base URL, as used in copy-source references
    pub fn host(&self) -> String {
        let base = self.base_url();
        let without_scheme = base.split_once("://").map_or(base.as_str(), |(_, rest)| rest);
        without_scheme.to_string()
    }

    /// Log filter directive matching the debug setting
    pub fn log_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "error" }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_individual_settings() {
        let config = ClientConfig::from_source(source(&[
            (vars::APP_ID, "1250000000"),
            (vars::REGION, "ap-beijing"),
            (vars::ACCESS_KEY, "AKID"),
            (vars::SECRET_KEY, "secret"),
        ]))
        .unwrap();

        assert_eq!(config.app_id, Some(1250000000));
        assert_eq!(config.region, "ap-beijing");
        assert_eq!(config.access_key.as_deref(), Some("AKID"));
        assert_eq!(config.secret_key.as_deref(), Some("secret"));
        assert!(!config.debug);
        assert_eq!(config.log_filter(), "error");
        assert_eq!(config.base_url(), "https://cos.ap-beijing.myqcloud.com");
    }

    #[test]
    fn test_bad_app_id_is_ignored() {
        let config = ClientConfig::from_source(source(&[
            (vars::APP_ID, "not-a-number"),
            (vars::DEBUG, "1"),
        ]))
        .unwrap();
        assert_eq!(config.app_id, None);
        assert!(config.debug);
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_config_file_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{"endpoint": "http://127.0.0.1:9000/", "region": "eu-frankfurt", "timeout": 5}"#,
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = ClientConfig::from_source(source(&[
            (vars::CONFIG_FILE, &path),
            (vars::REGION, "ap-beijing"),
        ]))
        .unwrap();

        assert_eq!(config.region, "eu-frankfurt");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
        assert_eq!(config.host(), "127.0.0.1:9000");
    }

    #[test]
    fn test_missing_config_file() {
        let result = ClientConfig::from_source(source(&[(vars::CONFIG_FILE, "/nonexistent/cos.json")]));
        assert!(matches!(result, Err(ClientError::Io(_))));
    }
}
