//! Wiring of collectors, the cluster label synchronizer and the cluster info
//! retriever.

use prometheus_client::registry::Registry;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cluster_label::ClusterLabelSynchronizer;
use crate::clusterinfo::Retriever;
use crate::collector::{DocsCount, IncludedIndices, IndicesSettings};
use crate::config::ExporterConfig;
use crate::error::Result;
use crate::fetch::Fetcher;

/// All parts of the exporter, built from one [`ExporterConfig`].
#[derive(Debug)]
pub struct Exporter {
    indices_settings: IndicesSettings,
    docs_count: DocsCount,
    retriever: Retriever,
    synchronizer: ClusterLabelSynchronizer,
}

impl Exporter {
    /// Builds the collectors and connects the retriever to the docs count
    /// collector's cluster label.
    ///
    /// Creates a blocking HTTP client, so it must not be called from within
    /// an async context.
    pub fn new(config: &ExporterConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config.blocking_client()?, config.uri.clone());
        let included: IncludedIndices = config.indices.iter().cloned().collect();

        let synchronizer = ClusterLabelSynchronizer::new();
        let mut retriever = Retriever::new(
            config.namespace.clone(),
            config.async_client()?,
            config.uri.clone(),
            config.cluster_info_interval(),
        );
        retriever.register_consumer(synchronizer.updates());

        Ok(Self {
            indices_settings: IndicesSettings::new(
                fetcher.clone(),
                &config.namespace,
                included.clone(),
            ),
            docs_count: DocsCount::new(fetcher, &config.namespace, included, synchronizer.label()),
            retriever,
            synchronizer,
        })
    }

    /// Registers every metric with `registry` and hands back the background
    /// tasks that keep the cluster label current.
    ///
    /// # Panics
    ///
    /// Encoding `registry` afterwards panics when done on an async worker
    /// thread, as both collectors issue blocking HTTP requests. Encode from a
    /// plain thread or from [`tokio::task::spawn_blocking`].
    pub fn register(self, registry: &mut Registry) -> BackgroundTasks {
        let Self {
            indices_settings,
            docs_count,
            retriever,
            synchronizer,
        } = self;

        registry.register_collector(Box::new(indices_settings));
        registry.register_collector(Box::new(docs_count));
        retriever.register(registry);

        BackgroundTasks {
            retriever,
            synchronizer,
        }
    }
}

/// The long-running halves of an [`Exporter`].
#[derive(Debug)]
pub struct BackgroundTasks {
    retriever: Retriever,
    synchronizer: ClusterLabelSynchronizer,
}

impl BackgroundTasks {
    /// Runs the retriever and the synchronizer until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!("starting background tasks");
        tokio::join!(
            self.synchronizer.run(shutdown.clone()),
            self.retriever.run(shutdown),
        );
        info!("background tasks stopped");
    }
}
