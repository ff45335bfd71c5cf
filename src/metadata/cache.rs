//! Client-side metadata cache
//!
//! One cache line per table id, living as long as the owning session:
//!
//! ```text
//! Absent --first get--> Populated --changed revision--> Populated (replaced)
//! ```
//!
//! There is no eviction and no explicit invalidation. Every `get` on a
//! populated line performs a conditional fetch with the cached revision id;
//! the cached set is replaced only when the returned revision differs by
//! value. The whole get/refresh sequence runs under one lock.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{MetadataFilter, MetadataSet};
use crate::observability::{log_event_with_fields, Event};
use crate::protocol::{Token, TransportError, TransportResult};

/// Remote side of the cache
pub trait MetadataSource {
    /// Fetch the complete metadata set of a table.
    fn fetch_metadata(&self, table_id: &str) -> TransportResult<MetadataSet>;

    /// Fetch the metadata set of a table, telling the remote side which
    /// revision the caller already holds.
    ///
    /// When the revision is unchanged the returned set carries the same
    /// revision id and its entries are not used. A held copy without a
    /// revision is compared the same way: `None` equals `None`.
    fn fetch_metadata_if_changed(
        &self,
        table_id: &str,
        known_revision_id: Option<Token>,
    ) -> TransportResult<MetadataSet>;
}

/// Cache statistics
///
/// Passive only: they never influence caching.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that populated an absent line
    pub misses: u64,
    /// Conditional fetches that found the line current
    pub hits: u64,
    /// Conditional fetches that replaced the line
    pub refreshes: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    lines: HashMap<String, MetadataSet>,
    stats: CacheStats,
}

/// Per-session metadata cache
#[derive(Debug, Default)]
pub struct MetadataCache {
    state: Mutex<CacheState>,
}

impl MetadataCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the metadata of `table_id`, filtered by `filter`.
    ///
    /// Never returns an absent result: when nothing matches, the set is
    /// empty and has no revision. The returned set is a fresh copy.
    pub fn get<S>(
        &self,
        source: &S,
        table_id: &str,
        filter: &MetadataFilter,
    ) -> TransportResult<MetadataSet>
    where
        S: MetadataSource + ?Sized,
    {
        let mut state = self
            .state
            .lock()
            .map_err(|_| TransportError::internal("Lock poisoned"))?;

        let cached_revision = state.lines.get(table_id).map(|line| line.revision_id);

        match cached_revision {
            None => {
                log_event_with_fields(Event::MetadataCacheMiss, &[("table_id", table_id)]);
                let fetched = source.fetch_metadata(table_id)?;
                state.stats.misses += 1;
                state.lines.insert(table_id.to_string(), fetched);
            }
            Some(known) => {
                let fetched = source.fetch_metadata_if_changed(table_id, known)?;
                if fetched.revision_id == known {
                    state.stats.hits += 1;
                } else {
                    log_event_with_fields(
                        Event::MetadataCacheRefresh,
                        &[("table_id", table_id)],
                    );
                    state.stats.refreshes += 1;
                    state.lines.insert(table_id.to_string(), fetched);
                }
            }
        }

        Ok(state
            .lines
            .get(table_id)
            .map(|line| line.filtered(filter))
            .unwrap_or_else(|| MetadataSet::empty(table_id)))
    }

    /// Revision currently cached for `table_id`.
    pub fn cached_revision(&self, table_id: &str) -> Option<Token> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.lines.get(table_id).and_then(|line| line.revision_id))
    }

    /// Number of populated cache lines.
    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.lines.len()).unwrap_or(0)
    }

    /// Whether no line is populated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.state
            .lock()
            .map(|state| state.stats.clone())
            .unwrap_or_default()
    }
}
