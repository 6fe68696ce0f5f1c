//! Scrape-time collectors.
//!
//! Each collector fetches one document per scrape, extracts samples from it
//! and writes them through the [`Collector`] contract. Remote failures never
//! fail the scrape: they are logged, counted where applicable, and yield a
//! reduced sample set.

use std::collections::HashSet;

use prometheus_client::collector::Collector;

use crate::descriptor::{Descriptor, ScrapeResult};

pub mod docs_count;
pub mod indices_settings;

pub use docs_count::DocsCount;
pub use indices_settings::IndicesSettings;

/// The describe/collect contract shared by the collectors of this crate.
pub trait Scrape: Collector {
    /// Every descriptor [`Scrape::collect`] can ever emit.
    fn describe(&self) -> Vec<&Descriptor>;

    /// Fetches, decodes and extracts one batch of samples.
    fn collect(&self) -> ScrapeResult<'_>;
}

/// Allow-list of index names. Empty means every index is included.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncludedIndices(HashSet<String>);

impl IncludedIndices {
    /// Whether samples of `index` should be emitted.
    pub fn includes(&self, index: &str) -> bool {
        self.0.is_empty() || self.0.contains(index)
    }
}

impl<S: Into<String>> FromIterator<S> for IncludedIndices {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
