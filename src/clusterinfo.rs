//! Periodic retrieval of the cluster identity from `GET /`.
//!
//! The [`Retriever`] is the producer feeding
//! [`ClusterLabelSynchronizer`](crate::cluster_label::ClusterLabelSynchronizer)s.
//! It polls on its own schedule so that scrapes never wait for it.

use std::sync::atomic::AtomicU64;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::cluster_label::ClusterLabelUpdates;
use crate::descriptor::fq_name;
use crate::error::{Error, Result};
use crate::fetch::{decode, endpoint};

/// Response of `GET /`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClusterInfo {
    /// Name of the node that answered.
    pub name: String,
    /// Name of the cluster.
    pub cluster_name: String,
    /// UUID of the cluster.
    pub cluster_uuid: String,
    /// Version details.
    pub version: VersionInfo,
    /// The famous tagline.
    pub tagline: String,
}

/// The `version` object of [`ClusterInfo`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VersionInfo {
    /// Release number, e.g. `8.11.1`.
    pub number: String,
    /// Commit hash of the build.
    pub build_hash: String,
    /// Build timestamp.
    pub build_date: String,
    /// Bundled Lucene version.
    pub lucene_version: String,
}

/// Polls the cluster identity and fans it out to registered consumers.
#[derive(Debug)]
pub struct Retriever {
    namespace: String,
    client: reqwest::Client,
    url: Url,
    interval: Duration,
    consumers: Vec<ClusterLabelUpdates>,
    up: Gauge,
    last_success: Gauge<f64, AtomicU64>,
}

impl Retriever {
    /// Creates a new [`Retriever`] polling `url` every `interval`.
    ///
    /// Intervals below one second are raised to one second.
    pub fn new(
        namespace: impl Into<String>,
        client: reqwest::Client,
        url: Url,
        interval: Duration,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            client,
            url,
            interval: interval.max(Duration::from_secs(1)),
            consumers: Vec::new(),
            up: Gauge::default(),
            last_success: Gauge::default(),
        }
    }

    /// Adds a consumer receiving every successfully retrieved [`ClusterInfo`].
    pub fn register_consumer(&mut self, consumer: ClusterLabelUpdates) {
        self.consumers.push(consumer);
    }

    /// Registers the retriever's health metrics under
    /// `{namespace}_clusterinfo_`.
    pub fn register(&self, registry: &mut Registry) {
        let prefix = fq_name(&self.namespace, "clusterinfo", "");
        let registry = registry.sub_registry_with_prefix(prefix);
        registry.register(
            "up",
            "Whether the last cluster info retrieval succeeded",
            self.up.clone(),
        );
        registry.register(
            "last_retrieval_success_ts",
            "Timestamp of the last successful cluster info retrieval",
            self.last_success.clone(),
        );
    }

    /// Fetches and decodes `GET /` once.
    pub async fn fetch(&self) -> Result<ClusterInfo> {
        let url = endpoint(&self.url, "/", &[]);

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(source) => return Err(Error::Transport { url, source }),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { url, status });
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(source) => return Err(Error::Transport { url, source }),
        };

        decode(&body)
    }

    async fn update(&self) {
        let info = match self.fetch().await {
            Ok(info) => info,
            Err(err) => {
                self.up.set(0);
                warn!(error = %err, "failed to retrieve cluster info");
                return;
            }
        };

        self.up.set(1);
        self.last_success.set(unix_now());
        debug!(cluster = %info.cluster_name, "retrieved cluster info");

        for consumer in &self.consumers {
            if let Err(err) = consumer.send(info.clone()) {
                warn!(error = %err, "failed to deliver cluster info");
            }
        }
    }

    /// Retrieves once immediately, then once per interval, until `shutdown`
    /// is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        debug!(url = %self.url, interval = ?self.interval, "starting cluster info retriever");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.update().await,
            }
        }
        debug!("exiting cluster info retriever");
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_secs_f64())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster_label::ClusterLabelSynchronizer;
    use httpmock::{Method::GET, MockServer};
    use prometheus_client::encoding::text::encode;

    const ROOT: &str = r#"{
        "name": "node-1",
        "cluster_name": "prod",
        "cluster_uuid": "abc",
        "version": {"number": "8.11.1", "lucene_version": "9.8.0"},
        "tagline": "You Know, for Search"
    }"#;

    fn retriever(server: &MockServer) -> Retriever {
        Retriever::new(
            "elasticsearch",
            reqwest::Client::new(),
            Url::parse(&server.base_url()).unwrap(),
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn fetch_decodes_root_document() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).body(ROOT);
            })
            .await;

        let info = retriever(&server).fetch().await.unwrap();

        assert_eq!("prod", info.cluster_name);
        assert_eq!("node-1", info.name);
        assert_eq!("8.11.1", info.version.number);
    }

    #[tokio::test]
    async fn failed_retrieval_marks_down() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(500);
            })
            .await;

        let retriever = retriever(&server);
        retriever.up.set(1);
        retriever.update().await;

        assert_eq!(0, retriever.up.get());
        assert_eq!(0.0, retriever.last_success.get());
    }

    #[tokio::test]
    async fn run_feeds_consumers() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(200).body(ROOT);
            })
            .await;

        let synchronizer = ClusterLabelSynchronizer::new();
        let label = synchronizer.label();
        let mut retriever = retriever(&server);
        retriever.register_consumer(synchronizer.updates());
        let up = retriever.up.clone();

        let shutdown = CancellationToken::new();
        let sync_task = tokio::spawn(synchronizer.run(shutdown.clone()));
        let retriever_task = tokio::spawn(retriever.run(shutdown.clone()));

        tokio::time::timeout(Duration::from_secs(5), async {
            while &*label.get() != "prod" {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(1, up.get());

        shutdown.cancel();
        sync_task.await.unwrap();
        retriever_task.await.unwrap();
    }

    #[test]
    fn registers_namespaced_metrics() {
        let retriever = Retriever::new(
            "elasticsearch",
            reqwest::Client::new(),
            Url::parse("http://localhost:9200").unwrap(),
            Duration::from_secs(60),
        );
        let mut registry = Registry::default();
        retriever.register(&mut registry);

        let mut buffer = String::new();
        encode(&mut buffer, &registry).unwrap();

        assert!(buffer.contains("# TYPE elasticsearch_clusterinfo_up gauge\n"));
        assert!(buffer.contains("elasticsearch_clusterinfo_up 0\n"));
        assert!(buffer.contains("elasticsearch_clusterinfo_last_retrieval_success_ts"));
    }
}
