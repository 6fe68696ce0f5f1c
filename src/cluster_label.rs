//! Propagation of the cluster name into per-scrape labels.
//!
//! [`ClusterLabelSynchronizer::run`] is the only writer of the shared
//! [`ClusterLabel`] cell. Producers push [`ClusterInfo`] values through
//! [`ClusterLabelUpdates`]; collectors read the cell on the hot path without
//! waiting for the task. An update that lands mid-scrape may or may not be
//! visible to that scrape.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::clusterinfo::ClusterInfo;
use crate::error::{Error, Result};

/// Cluster name reported before the first update arrives.
pub const UNKNOWN_CLUSTER: &str = "unknown_cluster";

/// Read handle on the most recently observed cluster name.
#[derive(Clone, Debug)]
pub struct ClusterLabel {
    current: Arc<RwLock<Arc<str>>>,
}

impl Default for ClusterLabel {
    fn default() -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::from(UNKNOWN_CLUSTER))),
        }
    }
}

impl ClusterLabel {
    /// The current cluster name.
    pub fn get(&self) -> Arc<str> {
        self.current.read().clone()
    }

    fn set(&self, name: &str) {
        *self.current.write() = Arc::from(name);
    }
}

/// Sending side of the update channel, handed to cluster info producers.
#[derive(Clone, Debug)]
pub struct ClusterLabelUpdates {
    tx: mpsc::UnboundedSender<ClusterInfo>,
}

impl ClusterLabelUpdates {
    /// Queues an update without waiting for it to be applied.
    pub fn send(&self, info: ClusterInfo) -> Result<()> {
        self.tx.send(info).map_err(|_| Error::SynchronizerClosed)
    }
}

/// Background task keeping a [`ClusterLabel`] in line with the updates it
/// receives.
#[derive(Debug)]
pub struct ClusterLabelSynchronizer {
    label: ClusterLabel,
    tx: mpsc::UnboundedSender<ClusterInfo>,
    rx: mpsc::UnboundedReceiver<ClusterInfo>,
}

impl Default for ClusterLabelSynchronizer {
    fn default() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            label: ClusterLabel::default(),
            tx,
            rx,
        }
    }
}

impl ClusterLabelSynchronizer {
    /// Creates a new [`ClusterLabelSynchronizer`] with the label set to
    /// [`UNKNOWN_CLUSTER`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Read handle on the cell this synchronizer writes.
    pub fn label(&self) -> ClusterLabel {
        self.label.clone()
    }

    /// A new sender feeding this synchronizer.
    pub fn updates(&self) -> ClusterLabelUpdates {
        ClusterLabelUpdates {
            tx: self.tx.clone(),
        }
    }

    /// Applies updates until `shutdown` is cancelled or every
    /// [`ClusterLabelUpdates`] handle has been dropped.
    ///
    /// Updates with an empty cluster name are ignored. Otherwise the last
    /// write wins.
    pub async fn run(self, shutdown: CancellationToken) {
        let Self { label, tx, mut rx } = self;
        drop(tx);

        debug!("starting cluster info receive loop");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                update = rx.recv() => match update {
                    Some(info) if !info.cluster_name.is_empty() => {
                        debug!(cluster = %info.cluster_name, "received cluster info update");
                        label.set(&info.cluster_name);
                    }
                    Some(_) => {}
                    None => break,
                },
            }
        }
        debug!("exiting cluster info receive loop");
    }
}
