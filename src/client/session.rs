//! Client session
//!
//! A session owns one remote client and one metadata cache. Cache lines
//! live as long as the session; two sessions never share a cache.

use std::sync::Arc;

use super::remote::RemoteClient;
use crate::channel::Channel;
use crate::config::RemoteConfig;
use crate::metadata::{CacheStats, MetadataCache, MetadataEntry, MetadataFilter, MetadataSet};
use crate::observability::{log_event_with_fields, Event, MetricsSnapshot};
use crate::protocol::{QueryRequest, QueryResult, Row, TableInfo, TransportResult};

/// Session over one channel
pub struct ClientSession {
    client: RemoteClient,
    cache: MetadataCache,
}

impl ClientSession {
    /// Open a session over `channel`.
    pub fn new(channel: Arc<dyn Channel>, config: RemoteConfig) -> Self {
        log_event_with_fields(
            Event::SessionOpen,
            &[
                ("max_chunk_size", &config.max_chunk_size.to_string()),
                (
                    "principal",
                    config.principal.as_deref().unwrap_or("<none>"),
                ),
            ],
        );
        Self {
            client: RemoteClient::new(channel, config),
            cache: MetadataCache::new(),
        }
    }

    /// Underlying remote client.
    pub fn client(&self) -> &RemoteClient {
        &self.client
    }

    /// Open a table.
    pub fn open(&self, table_id: &str) -> TransportResult<TableInfo> {
        self.client.open(table_id)
    }

    /// Close a table.
    pub fn close(&self, table_id: &str) -> TransportResult<()> {
        self.client.close(table_id)
    }

    /// Run a query against an open table.
    pub fn query(&self, request: &QueryRequest) -> TransportResult<QueryResult> {
        self.client.query(request)
    }

    /// Look up one row. `None` when the row does not exist.
    pub fn get_row(&self, table_id: &str, row_id: &str) -> TransportResult<Option<Row>> {
        self.client.get_row(table_id, row_id)
    }

    /// Metadata of `table_id` restricted to `filter`, served through the
    /// session cache.
    pub fn metadata(
        &self,
        table_id: &str,
        filter: &MetadataFilter,
    ) -> TransportResult<MetadataSet> {
        self.cache.get(&self.client, table_id, filter)
    }

    /// Metadata lookup with optional partition, aspect and key filters.
    pub fn get_metadata(
        &self,
        table_id: &str,
        partition: Option<&str>,
        aspect: Option<&str>,
        key: Option<&str>,
    ) -> TransportResult<MetadataSet> {
        let filter = MetadataFilter {
            partition: partition.map(str::to_string),
            aspect: aspect.map(str::to_string),
            key: key.map(str::to_string),
        };
        self.metadata(table_id, &filter)
    }

    /// Write a metadata entry. The cached line for its table is
    /// refreshed on the next read.
    pub fn put_metadata(&self, entry: MetadataEntry) -> TransportResult<()> {
        self.client.put_metadata(entry)
    }

    /// Delete a metadata entry as the configured principal.
    pub fn delete_metadata(
        &self,
        table_id: &str,
        partition: &str,
        aspect: &str,
        key: &str,
    ) -> TransportResult<()> {
        self.client.delete_metadata(table_id, partition, aspect, key)
    }

    /// Number of tables with a cache line.
    pub fn cached_tables(&self) -> usize {
        self.cache.len()
    }

    /// Cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Call metrics of this session.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.client.metrics().snapshot()
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        log_event_with_fields(
            Event::SessionClose,
            &[("cached_tables", &self.cached_tables().to_string())],
        );
    }
}
