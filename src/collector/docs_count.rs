//! Per-index document counts from `GET /_cat/indices`.

use prometheus_client::collector::Collector;
use prometheus_client::encoding::DescriptorEncoder;
use prometheus_client::metrics::counter::Counter;
use tracing::warn;

use crate::cluster_label::ClusterLabel;
use crate::collector::{IncludedIndices, Scrape};
use crate::descriptor::{fq_name, Descriptor, ScrapeResult, ValueKind};
use crate::fetch::Fetcher;
use crate::response::IndexDocs;

const CAT_INDICES_PATH: &str = "/_cat/indices";
const CAT_INDICES_QUERY: &[(&str, &str)] = &[("format", "json"), ("h", "index,docs.count")];

/// Document count of a row. `None` if it does not parse, in which case the
/// row is not reported at all.
pub fn docs_count(row: &IndexDocs) -> Option<f64> {
    row.count.as_deref()?.parse().ok()
}

/// Collector for the number of documents per index, labelled with the
/// current cluster name.
///
/// # Panics
///
/// Encoding issues a blocking HTTP request and panics when run on an async
/// worker thread. Encode the registry from a plain thread or from
/// [`tokio::task::spawn_blocking`].
#[derive(Debug)]
pub struct DocsCount {
    fetcher: Fetcher,
    included: IncludedIndices,
    cluster: ClusterLabel,

    docs_count: Descriptor,
    json_parse_failures: Counter,
    json_parse_failures_desc: Descriptor,
}

impl DocsCount {
    /// Creates a new [`DocsCount`] collector reading cluster names from
    /// `cluster`.
    pub fn new(
        fetcher: Fetcher,
        namespace: &str,
        included: IncludedIndices,
        cluster: ClusterLabel,
    ) -> Self {
        Self {
            fetcher,
            included,
            cluster,

            docs_count: Descriptor::new(
                fq_name(namespace, "index", "docs_count"),
                "Number of documents per index.",
                &["index", "cluster"],
                ValueKind::Gauge,
            ),
            json_parse_failures: Counter::default(),
            json_parse_failures_desc: Descriptor::new(
                fq_name(namespace, "index", "json_parse_failures"),
                "Number of JSON parse failures while collecting docs count.",
                &[],
                ValueKind::Counter,
            ),
        }
    }

    /// Number of responses that failed to decode so far.
    pub fn json_parse_failures(&self) -> u64 {
        self.json_parse_failures.get()
    }

    /// Extracts samples from already decoded rows.
    pub fn extract<'a>(&'a self, rows: &[IndexDocs], result: &mut ScrapeResult<'a>) {
        let cluster = self.cluster.get();

        for row in rows {
            if !self.included.includes(&row.index) {
                continue;
            }
            let Some(count) = docs_count(row) else {
                continue;
            };
            result.push(
                self.docs_count
                    .sample(count, vec![row.index.clone(), cluster.to_string()]),
            );
        }
    }
}

impl Scrape for DocsCount {
    fn describe(&self) -> Vec<&Descriptor> {
        vec![&self.docs_count, &self.json_parse_failures_desc]
    }

    fn collect(&self) -> ScrapeResult<'_> {
        let mut result = ScrapeResult::default();

        match self
            .fetcher
            .get_json::<Vec<IndexDocs>>(CAT_INDICES_PATH, CAT_INDICES_QUERY)
        {
            Ok(rows) => self.extract(&rows, &mut result),
            Err(err) if err.is_decode() => {
                self.json_parse_failures.inc();
                warn!(error = %err, "failed to parse JSON");
            }
            Err(err) => warn!(error = %err, "failed to fetch index stats"),
        }

        result.push(
            self.json_parse_failures_desc
                .sample(self.json_parse_failures.get() as f64, Vec::new()),
        );
        result
    }
}

impl Collector for DocsCount {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        self.collect().encode(&self.describe(), &mut encoder)
    }
}
