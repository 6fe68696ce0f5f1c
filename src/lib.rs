#![deny(dead_code)]
#![deny(missing_docs)]
#![deny(unused)]
#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

//! Exports Elasticsearch index settings and per-index document counts as
//! [Open Metrics](https://github.com/OpenObservability/OpenMetrics), on top of
//! [`prometheus_client`].
//!
//! Every collector implements [`prometheus_client::collector::Collector`]:
//! on each scrape it fetches one document from the Elasticsearch admin API,
//! decodes it and writes constant samples. A failing or misbehaving cluster
//! never fails the scrape. Failures are logged through [`tracing`] and yield
//! fewer samples, a zeroed gauge, or an incremented parse failure counter.
//!
//! The `cluster` label of the document count metric comes from a
//! [`ClusterLabel`](cluster_label::ClusterLabel) cell. A background
//! [`Retriever`](clusterinfo::Retriever) polls `GET /` and a
//! [`ClusterLabelSynchronizer`](cluster_label::ClusterLabelSynchronizer)
//! applies what it finds, so scrapes never wait on that request.
//!
//! # Examples
//!
//! ```no_run
//! use elasticsearch_exporter::{ExporterConfig, Exporter};
//! use prometheus_client::encoding::text::encode;
//! use prometheus_client::registry::Registry;
//!
//! let config = ExporterConfig::default();
//! let mut registry = Registry::default();
//! let _tasks = Exporter::new(&config)?.register(&mut registry);
//!
//! // Run `_tasks` on a tokio runtime to keep the `cluster` label current.
//!
//! let mut buffer = String::new();
//! encode(&mut buffer, &registry)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cluster_label;
pub mod clusterinfo;
pub mod collector;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod exporter;
pub mod fetch;
pub mod response;

pub use config::ExporterConfig;
pub use error::{Error, Result};
pub use exporter::{BackgroundTasks, Exporter};
