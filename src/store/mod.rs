//! Backing store interface
//!
//! The store is the external engine behind the serving side of the
//! channel. It owns the real tables, rows and metadata; this crate only
//! transports its answers.

mod memory;

pub use memory::MemoryStore;

use crate::metadata::{MetadataEntry, MetadataSet};
use crate::protocol::{QueryRequest, QueryResult, Row, TableInfo, TransportResult};

/// Operations the serving side dispatches to
pub trait Store: Send + Sync {
    /// Open a table for reading.
    fn open_table(&self, table_id: &str) -> TransportResult<TableInfo>;

    /// Close a previously opened table.
    fn close_table(&self, table_id: &str) -> TransportResult<()>;

    /// Run a query against an open table.
    fn query(&self, request: &QueryRequest) -> TransportResult<QueryResult>;

    /// Look up one row of an open table.
    fn get_row(&self, table_id: &str, row_id: &str) -> TransportResult<Option<Row>>;

    /// Current metadata of a table, with its revision id.
    fn metadata(&self, table_id: &str) -> TransportResult<MetadataSet>;

    /// Insert or replace the entry at its (partition, aspect, key) slot.
    fn put_metadata(&self, principal: Option<&str>, entry: MetadataEntry) -> TransportResult<()>;

    /// Remove the entry at a (partition, aspect, key) slot.
    fn delete_metadata(
        &self,
        principal: Option<&str>,
        table_id: &str,
        partition: &str,
        aspect: &str,
        key: &str,
    ) -> TransportResult<()>;
}
