use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::canonicalize::CanonicalizeOptions;
use crate::endpoint::{Scheme, UnsupportedScheme};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid fallback_scheme: {0}")]
    InvalidScheme(#[from] UnsupportedScheme),
}

/// Client configuration, loaded from a JSON file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Raw endpoint strings; canonicalized before use
    #[serde(default = "default_urls")]
    pub urls: Vec<String>,

    /// Scheme for endpoints found through the `host:port` DNS fallback
    #[serde(default = "default_fallback_scheme")]
    pub fallback_scheme: String,

    #[serde(default = "default_dns_timeout_ms")]
    pub dns_timeout_ms: Option<u64>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_urls() -> Vec<String> {
    vec!["http://127.0.0.1:9200".to_string()]
}

fn default_fallback_scheme() -> String {
    "http".to_string()
}

fn default_dns_timeout_ms() -> Option<u64> {
    Some(2_000)
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            fallback_scheme: default_fallback_scheme(),
            dns_timeout_ms: default_dns_timeout_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        // Reject a bad scheme at load time rather than at first use
        config.canonicalize_options()?;
        Ok(config)
    }

    pub fn canonicalize_options(&self) -> Result<CanonicalizeOptions, ConfigError> {
        let scheme: Scheme = self.fallback_scheme.parse()?;
        let mut options = CanonicalizeOptions::default().with_fallback_scheme(scheme);
        if let Some(ms) = self.dns_timeout_ms {
            options = options.with_dns_timeout(Duration::from_millis(ms));
        }
        Ok(options)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.urls, vec!["http://127.0.0.1:9200"]);
        let options = config.canonicalize_options().unwrap();
        assert_eq!(options.fallback_scheme, Scheme::Http);
        assert_eq!(options.dns_timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"urls": ["es1:9200", "https://es2:9243/"], "fallback_scheme": "https", "dns_timeout_ms": null}}"#
        )
        .unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.urls.len(), 2);
        assert_eq!(config.request_timeout_secs, 30);

        let options = config.canonicalize_options().unwrap();
        assert_eq!(options.fallback_scheme, Scheme::Https);
        assert_eq!(options.dns_timeout, None);
    }

    #[test]
    fn test_load_rejects_bad_scheme() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"fallback_scheme": "ftp"}}"#).unwrap();

        assert!(matches!(
            ClientConfig::load(file.path()),
            Err(ConfigError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ClientConfig::load("/nonexistent/elastickit.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
