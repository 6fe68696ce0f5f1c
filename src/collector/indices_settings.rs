//! Per-index settings from `GET /_all/_settings`.

use prometheus_client::collector::Collector;
use prometheus_client::encoding::DescriptorEncoder;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use tracing::warn;

use crate::collector::{IncludedIndices, Scrape};
use crate::descriptor::{fq_name, Descriptor, ScrapeResult, ValueKind};
use crate::fetch::Fetcher;
use crate::response::{IndexInfo, IndicesSettingsResponse};

const SETTINGS_PATH: &str = "/_all/_settings";
const INDEX_LABELS: &[&str] = &["index"];

/// Elasticsearch's built-in `index.mapping.total_fields.limit`.
pub const DEFAULT_TOTAL_FIELDS: f64 = 1000.0;

/// Reported for replicas when `number_of_replicas` does not parse.
///
/// Same value as [`DEFAULT_TOTAL_FIELDS`]. Kept for compatibility with
/// existing dashboards even though it is no meaningful replica count.
pub const DEFAULT_REPLICAS: f64 = DEFAULT_TOTAL_FIELDS;

/// Reported for the creation timestamp when `creation_date` does not parse.
pub const DEFAULT_CREATION_DATE: f64 = 0.0;

fn parse_or(field: Option<&str>, default: f64) -> f64 {
    field.and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// `index.mapping.total_fields.limit`, or [`DEFAULT_TOTAL_FIELDS`].
pub fn total_fields(info: &IndexInfo) -> f64 {
    parse_or(
        info.mapping.total_fields.limit.as_deref(),
        DEFAULT_TOTAL_FIELDS,
    )
}

/// `index.number_of_replicas`, or [`DEFAULT_REPLICAS`].
pub fn replicas(info: &IndexInfo) -> f64 {
    parse_or(info.number_of_replicas.as_deref(), DEFAULT_REPLICAS)
}

/// `index.creation_date` in epoch seconds, or [`DEFAULT_CREATION_DATE`].
pub fn creation_timestamp_seconds(info: &IndexInfo) -> f64 {
    match info.creation_date.as_deref().map(str::parse::<f64>) {
        Some(Ok(millis)) => millis / 1000.0,
        _ => DEFAULT_CREATION_DATE,
    }
}

/// Whether `index.blocks.read_only` is the literal `"true"`.
pub fn is_read_only(info: &IndexInfo) -> bool {
    info.blocks.read_only.as_deref() == Some("true")
}

struct SettingsMetric {
    descriptor: Descriptor,
    value: fn(&IndexInfo) -> f64,
}

impl std::fmt::Debug for SettingsMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsMetric")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Collector for index settings and the number of read only indices.
///
/// # Panics
///
/// Encoding issues a blocking HTTP request and panics when run on an async
/// worker thread. Encode the registry from a plain thread or from
/// [`tokio::task::spawn_blocking`].
#[derive(Debug)]
pub struct IndicesSettings {
    fetcher: Fetcher,
    included: IncludedIndices,

    read_only_indices: Gauge,
    read_only_indices_desc: Descriptor,
    json_parse_failures: Counter,
    json_parse_failures_desc: Descriptor,

    metrics: Vec<SettingsMetric>,
}

impl IndicesSettings {
    /// Creates a new [`IndicesSettings`] collector.
    pub fn new(fetcher: Fetcher, namespace: &str, included: IncludedIndices) -> Self {
        let settings = |name: &str, help: &'static str, value: fn(&IndexInfo) -> f64| {
            SettingsMetric {
                descriptor: Descriptor::new(
                    fq_name(namespace, "indices_settings", name),
                    help,
                    INDEX_LABELS,
                    ValueKind::Gauge,
                ),
                value,
            }
        };

        Self {
            fetcher,
            included,

            read_only_indices: Gauge::default(),
            read_only_indices_desc: Descriptor::new(
                fq_name(namespace, "indices_settings_stats", "read_only_indices"),
                "Current number of read only indices within cluster",
                &[],
                ValueKind::Gauge,
            ),
            json_parse_failures: Counter::default(),
            json_parse_failures_desc: Descriptor::new(
                fq_name(namespace, "indices_settings", "json_parse_failures"),
                "Number of errors while parsing JSON",
                &[],
                ValueKind::Counter,
            ),

            metrics: vec![
                settings(
                    "total_fields",
                    "index mapping setting for total_fields",
                    total_fields,
                ),
                settings(
                    "replicas",
                    "index setting number_of_replicas",
                    replicas,
                ),
                settings(
                    "creation_timestamp_seconds",
                    "index setting creation_date",
                    creation_timestamp_seconds,
                ),
            ],
        }
    }

    /// Current value of the read only indices gauge.
    pub fn read_only_indices(&self) -> i64 {
        self.read_only_indices.get()
    }

    /// Number of settings documents that failed to decode so far.
    pub fn json_parse_failures(&self) -> u64 {
        self.json_parse_failures.get()
    }

    /// Extracts samples from an already decoded response and updates the read
    /// only indices gauge.
    pub fn extract<'a>(
        &'a self,
        response: &IndicesSettingsResponse,
        result: &mut ScrapeResult<'a>,
    ) {
        let mut read_only = 0;

        for (index, settings) in response {
            // Read only indices are counted across the whole response.
            let info = &settings.settings.index;
            if is_read_only(info) {
                read_only += 1;
            }

            if !self.included.includes(index) {
                continue;
            }

            for metric in &self.metrics {
                result.push(
                    metric
                        .descriptor
                        .sample((metric.value)(info), vec![index.clone()]),
                );
            }
        }

        self.read_only_indices.set(read_only);
        result.push(self.read_only_indices_desc.sample(read_only as f64, Vec::new()));
    }
}

impl Scrape for IndicesSettings {
    fn describe(&self) -> Vec<&Descriptor> {
        let mut descriptors = vec![&self.read_only_indices_desc];
        descriptors.extend(self.metrics.iter().map(|metric| &metric.descriptor));
        descriptors.push(&self.json_parse_failures_desc);
        descriptors
    }

    fn collect(&self) -> ScrapeResult<'_> {
        let mut result = ScrapeResult::default();

        match self
            .fetcher
            .get_json::<IndicesSettingsResponse>(SETTINGS_PATH, &[])
        {
            Ok(response) => self.extract(&response, &mut result),
            Err(err) => {
                if err.is_decode() {
                    self.json_parse_failures.inc();
                }
                self.read_only_indices.set(0);
                warn!(error = %err, "failed to fetch and decode indices settings");
            }
        }

        result.push(
            self.json_parse_failures_desc
                .sample(self.json_parse_failures.get() as f64, Vec::new()),
        );
        result
    }
}

impl Collector for IndicesSettings {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        self.collect().encode(&self.describe(), &mut encoder)
    }
}
