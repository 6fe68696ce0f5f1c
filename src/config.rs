//! Exporter configuration.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

/// Settings for the collectors and the cluster info retriever.
///
/// Every field is optional when deserializing and falls back to the value of
/// [`ExporterConfig::default`].
///
/// ```
/// # use elasticsearch_exporter::config::ExporterConfig;
/// let config: ExporterConfig =
///     serde_json::from_str(r#"{"uri": "http://es:9200", "indices": ["logs"]}"#).unwrap();
/// assert_eq!("elasticsearch", config.namespace);
/// assert_eq!(vec!["logs".to_string()], config.indices);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExporterConfig {
    /// Base URL of the Elasticsearch HTTP API.
    pub uri: Url,
    /// Prefix of every exported metric name.
    pub namespace: String,
    /// Indices to report on. Empty reports on all of them.
    pub indices: Vec<String>,
    /// Timeout of a single request, in seconds.
    pub timeout_secs: u64,
    /// Interval between cluster info retrievals, in seconds.
    pub cluster_info_interval_secs: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            uri: Url::parse("http://localhost:9200").expect("static URL to be valid"),
            namespace: "elasticsearch".to_string(),
            indices: Vec::new(),
            timeout_secs: 5,
            cluster_info_interval_secs: 300,
        }
    }
}

impl ExporterConfig {
    /// Timeout of a single request.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Interval between cluster info retrievals.
    pub fn cluster_info_interval(&self) -> Duration {
        Duration::from_secs(self.cluster_info_interval_secs)
    }

    /// Client used by the scrape-time collectors.
    ///
    /// Must not be created or dropped from within an async context.
    pub fn blocking_client(&self) -> Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(self.timeout())
            .build()
            .map_err(Error::Client)
    }

    /// Client used by the cluster info retriever.
    pub fn async_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout())
            .build()
            .map_err(Error::Client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config: ExporterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(ExporterConfig::default(), config);
        assert_eq!(Duration::from_secs(5), config.timeout());
        assert_eq!(Duration::from_secs(300), config.cluster_info_interval());
    }

    #[test]
    fn durations_are_read_in_seconds() {
        let config: ExporterConfig = serde_json::from_str(
            r#"{"timeout_secs": 2, "cluster_info_interval_secs": 30}"#,
        )
        .unwrap();
        assert_eq!(Duration::from_secs(2), config.timeout());
        assert_eq!(Duration::from_secs(30), config.cluster_info_interval());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<ExporterConfig>(r#"{"url": "http://es"}"#).is_err());
    }

    #[test]
    fn invalid_uri_is_rejected() {
        assert!(serde_json::from_str::<ExporterConfig>(r#"{"uri": "not a url"}"#).is_err());
    }

    #[test]
    fn builds_clients() {
        let config = ExporterConfig::default();
        config.blocking_client().unwrap();
        config.async_client().unwrap();
    }
}
