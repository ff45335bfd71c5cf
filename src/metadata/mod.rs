//! Per-table metadata
//!
//! Metadata is a set of opaque key/value records scoped to a table. Each
//! set carries a revision id that changes if and only if its entries
//! changed, which lets clients validate a cached copy without transferring
//! the entries again.

mod cache;

pub use cache::{CacheStats, MetadataCache, MetadataSource};

use serde::{Deserialize, Serialize};

use crate::protocol::Token;

/// One metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub table_id: String,
    pub partition: String,
    pub aspect: String,
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: String,
}

impl MetadataEntry {
    /// Create a metadata entry.
    pub fn new(
        table_id: impl Into<String>,
        partition: impl Into<String>,
        aspect: impl Into<String>,
        key: impl Into<String>,
        value_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            table_id: table_id.into(),
            partition: partition.into(),
            aspect: aspect.into(),
            key: key.into(),
            value_type: value_type.into(),
            value: value.into(),
        }
    }

    /// Whether this entry sits at the same (partition, aspect, key) slot.
    pub fn same_slot(&self, partition: &str, aspect: &str, key: &str) -> bool {
        self.partition == partition && self.aspect == aspect && self.key == key
    }
}

/// All metadata of one table at one revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSet {
    pub table_id: String,
    pub revision_id: Option<Token>,
    pub entries: Vec<MetadataEntry>,
}

impl MetadataSet {
    /// Create a metadata set.
    pub fn new(
        table_id: impl Into<String>,
        revision_id: Option<Token>,
        entries: Vec<MetadataEntry>,
    ) -> Self {
        Self {
            table_id: table_id.into(),
            revision_id,
            entries,
        }
    }

    /// An empty set with no revision.
    pub fn empty(table_id: impl Into<String>) -> Self {
        Self::new(table_id, None, Vec::new())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fresh copy holding only entries matching `filter`.
    ///
    /// When nothing matches the result has no revision.
    pub fn filtered(&self, filter: &MetadataFilter) -> MetadataSet {
        let entries: Vec<MetadataEntry> = self
            .entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();

        if entries.is_empty() {
            MetadataSet::empty(self.table_id.clone())
        } else {
            MetadataSet::new(self.table_id.clone(), self.revision_id, entries)
        }
    }
}

/// Optional (partition, aspect, key) filter
///
/// Every supplied field must match; absent fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub partition: Option<String>,
    pub aspect: Option<String>,
    pub key: Option<String>,
}

impl MetadataFilter {
    /// Filter matching everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Require a partition.
    pub fn partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    /// Require an aspect.
    pub fn aspect(mut self, aspect: impl Into<String>) -> Self {
        self.aspect = Some(aspect.into());
        self
    }

    /// Require a key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Whether `entry` satisfies every supplied field.
    pub fn matches(&self, entry: &MetadataEntry) -> bool {
        fn field_matches(wanted: &Option<String>, actual: &str) -> bool {
            wanted.as_deref().map_or(true, |w| w == actual)
        }

        field_matches(&self.partition, &entry.partition)
            && field_matches(&self.aspect, &entry.aspect)
            && field_matches(&self.key, &entry.key)
    }
}
