//! Metric identities and the samples a single scrape produces.
//!
//! A [`Descriptor`] is fixed at collector construction. Every scrape builds a
//! fresh [`ScrapeResult`] out of [`Sample`]s that point back at those
//! descriptors, which is then written through a
//! [`DescriptorEncoder`](prometheus_client::encoding::DescriptorEncoder).

use prometheus_client::encoding::{DescriptorEncoder, EncodeMetric, MetricEncoder};
use prometheus_client::metrics::counter::ConstCounter;
use prometheus_client::metrics::gauge::ConstGauge;
use prometheus_client::metrics::MetricType;

/// Builds a fully qualified metric name, joining the non-empty parts with `_`.
///
/// ```
/// # use elasticsearch_exporter::descriptor::fq_name;
/// assert_eq!("elasticsearch_index_docs_count", fq_name("elasticsearch", "index", "docs_count"));
/// assert_eq!("index_docs_count", fq_name("", "index", "docs_count"));
/// ```
pub fn fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Value kind of an exported time series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// Arbitrary up and down.
    Gauge,
    /// Monotonically increasing.
    Counter,
}

impl ValueKind {
    /// The Open Metrics type written next to the descriptor.
    pub fn metric_type(&self) -> MetricType {
        match self {
            ValueKind::Gauge => MetricType::Gauge,
            ValueKind::Counter => MetricType::Counter,
        }
    }
}

/// Identity of one exported time series family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    name: String,
    help: &'static str,
    labels: &'static [&'static str],
    kind: ValueKind,
}

impl Descriptor {
    /// Creates a new [`Descriptor`].
    pub fn new(
        name: impl Into<String>,
        help: &'static str,
        labels: &'static [&'static str],
        kind: ValueKind,
    ) -> Self {
        Self {
            name: name.into(),
            help,
            labels,
            kind,
        }
    }

    /// Fully qualified metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Help text.
    pub fn help(&self) -> &str {
        self.help
    }

    /// Label names, in emission order.
    pub fn labels(&self) -> &[&'static str] {
        self.labels
    }

    /// Value kind.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Creates a sample of this descriptor.
    ///
    /// `label_values` must match [`Descriptor::labels`] in arity and order.
    pub fn sample(&self, value: f64, label_values: Vec<String>) -> Sample<'_> {
        debug_assert_eq!(
            self.labels.len(),
            label_values.len(),
            "label arity mismatch for {}",
            self.name
        );

        Sample {
            descriptor: self,
            value,
            labels: self.labels.iter().copied().zip(label_values).collect(),
        }
    }
}

/// One value of one time series, produced during a single scrape.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample<'a> {
    descriptor: &'a Descriptor,
    value: f64,
    labels: Vec<(&'static str, String)>,
}

impl Sample<'_> {
    /// The descriptor this sample belongs to.
    pub fn descriptor(&self) -> &Descriptor {
        self.descriptor
    }

    /// The sample value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Label name and value pairs.
    pub fn labels(&self) -> &[(&'static str, String)] {
        &self.labels
    }

    /// Value of the label called `name`, if any.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Ordered samples of one collect call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScrapeResult<'a> {
    samples: Vec<Sample<'a>>,
}

impl<'a> ScrapeResult<'a> {
    /// Appends a sample.
    pub fn push(&mut self, sample: Sample<'a>) {
        self.samples.push(sample);
    }

    /// All samples in emission order.
    pub fn samples(&self) -> &[Sample<'a>] {
        &self.samples
    }

    /// Samples belonging to the metric called `name`.
    pub fn samples_of<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s Sample<'a>> + 's {
        self.samples
            .iter()
            .filter(move |sample| sample.descriptor.name() == name)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample was produced.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Writes the samples grouped by descriptor, in `descriptors` order.
    ///
    /// Descriptors without any sample in this result are skipped entirely.
    pub fn encode(
        &self,
        descriptors: &[&Descriptor],
        encoder: &mut DescriptorEncoder,
    ) -> Result<(), std::fmt::Error> {
        for descriptor in descriptors {
            let mut samples = self.samples_of(descriptor.name()).peekable();
            if samples.peek().is_none() {
                continue;
            }

            let mut metric_encoder = encoder.encode_descriptor(
                descriptor.name(),
                descriptor.help(),
                None,
                descriptor.kind().metric_type(),
            )?;

            if descriptor.labels().is_empty() {
                // An unlabeled family has a single series.
                if let Some(sample) = samples.next() {
                    encode_value(descriptor.kind(), sample.value, metric_encoder)?;
                }
                continue;
            }

            for sample in samples {
                let family_encoder = metric_encoder.encode_family(&sample.labels)?;
                encode_value(descriptor.kind(), sample.value, family_encoder)?;
            }
        }

        Ok(())
    }
}

fn encode_value(
    kind: ValueKind,
    value: f64,
    encoder: MetricEncoder,
) -> Result<(), std::fmt::Error> {
    match kind {
        ValueKind::Gauge => ConstGauge::new(value).encode(encoder),
        ValueKind::Counter => ConstCounter::new(value).encode(encoder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus_client::collector::Collector;
    use prometheus_client::encoding::text::encode;
    use prometheus_client::registry::Registry;

    #[derive(Debug)]
    struct Fixed {
        per_index: Descriptor,
        total: Descriptor,
        unused: Descriptor,
    }

    impl Fixed {
        fn new() -> Self {
            Self {
                per_index: Descriptor::new(
                    "test_per_index",
                    "per index",
                    &["index"],
                    ValueKind::Gauge,
                ),
                total: Descriptor::new("test_total_events", "events", &[], ValueKind::Counter),
                unused: Descriptor::new("test_unused", "never sampled", &[], ValueKind::Gauge),
            }
        }
    }

    impl Collector for Fixed {
        fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
            let mut result = ScrapeResult::default();
            result.push(self.per_index.sample(1.5, vec!["a".to_string()]));
            result.push(self.total.sample(3.0, Vec::new()));
            result.push(self.per_index.sample(2.5, vec!["b".to_string()]));
            result.encode(&[&self.per_index, &self.total, &self.unused], &mut encoder)
        }
    }

    #[test]
    fn fq_name_skips_empty_parts() {
        assert_eq!("ns_sub_name", fq_name("ns", "sub", "name"));
        assert_eq!("ns_name", fq_name("ns", "", "name"));
    }

    #[test]
    fn sample_pairs_labels_in_order() {
        let descriptor = Descriptor::new("d", "h", &["index", "cluster"], ValueKind::Gauge);
        let sample = descriptor.sample(1.0, vec!["idx".to_string(), "prod".to_string()]);

        assert_eq!(
            &[("index", "idx".to_string()), ("cluster", "prod".to_string())],
            sample.labels()
        );
        assert_eq!(Some("prod"), sample.label("cluster"));
        assert_eq!(None, sample.label("node"));
    }

    #[test]
    fn samples_of_filters_by_name() {
        let a = Descriptor::new("a", "h", &[], ValueKind::Gauge);
        let b = Descriptor::new("b", "h", &[], ValueKind::Gauge);
        let mut result = ScrapeResult::default();
        result.push(a.sample(1.0, Vec::new()));
        result.push(b.sample(2.0, Vec::new()));

        let values: Vec<f64> = result.samples_of("b").map(Sample::value).collect();
        assert_eq!(vec![2.0], values);
        assert_eq!(2, result.len());
    }

    #[test]
    fn encode_groups_samples_by_descriptor() {
        let mut registry = Registry::default();
        registry.register_collector(Box::new(Fixed::new()));

        let mut buffer = String::new();
        encode(&mut buffer, &registry).unwrap();

        assert!(buffer.contains("# TYPE test_per_index gauge\n"));
        assert!(buffer.contains("test_per_index{index=\"a\"} 1.5\n"));
        assert!(buffer.contains("test_per_index{index=\"b\"} 2.5\n"));
        assert!(buffer.contains("# TYPE test_total_events counter\n"));
        assert!(!buffer.contains("test_unused"));
        assert_eq!(1, buffer.matches("# TYPE test_per_index").count());
    }
}
