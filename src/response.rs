//! Shapes of the JSON documents returned by the Elasticsearch admin API.
//!
//! Elasticsearch reports most numeric settings as strings. Leaf fields are
//! kept as optional strings and parsed by the extractors, so a missing or
//! `null` field falls back the same way an unparsable one does.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Response of `GET /_all/_settings`, keyed by index name.
pub type IndicesSettingsResponse = BTreeMap<String, IndexSettings>;

/// Settings envelope of a single index.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// The `settings` object.
    pub settings: Settings,
}

/// The `settings` object of an index.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Index scoped settings.
    pub index: IndexInfo,
}

/// Index scoped settings.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexInfo {
    /// Write blocks.
    pub blocks: Blocks,
    /// Mapping limits.
    pub mapping: Mapping,
    /// Number of replicas, as a string.
    pub number_of_replicas: Option<String>,
    /// Creation time in epoch milliseconds, as a string.
    pub creation_date: Option<String>,
}

/// Write blocks of an index.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Blocks {
    /// `"true"` when the index is read only.
    pub read_only: Option<String>,
}

/// Mapping limits of an index.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Mapping {
    /// Limit on the total number of fields.
    pub total_fields: TotalFields,
}

/// `index.mapping.total_fields`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TotalFields {
    /// The configured limit, as a string.
    pub limit: Option<String>,
}

/// One row of `GET /_cat/indices?format=json&h=index,docs.count`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IndexDocs {
    /// Index name.
    pub index: String,
    /// Document count, as a string. `null` for closed indices.
    #[serde(rename = "docs.count")]
    pub count: Option<String>,
}
