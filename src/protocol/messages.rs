//! Request arguments and result payloads
//!
//! Arguments travel as JSON values on `invoke`. Results larger than a
//! single message travel as chunk chains whose concatenated bytes are the
//! JSON encoding of one of the payload types below, identified by a
//! `PayloadTag`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::token::Token;
use crate::metadata::MetadataEntry;

/// Explicit type descriptor for a chunked payload
///
/// The receiving call site names the tag it expects; a mismatch is a
/// protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadTag {
    /// `TableInfo`
    TableInfo,
    /// `QueryResult`
    QueryResult,
    /// `Row`
    Row,
    /// `MetadataSet`
    MetadataSet,
}

impl PayloadTag {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadTag::TableInfo => "TABLE_INFO",
            PayloadTag::QueryResult => "QUERY_RESULT",
            PayloadTag::Row => "ROW",
            PayloadTag::MetadataSet => "METADATA_SET",
        }
    }
}

impl fmt::Display for PayloadTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Description of an opened table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub table_id: String,
    pub columns: Vec<String>,
    pub row_count: u64,
}

/// A single row, keyed by column name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub row_id: String,
    pub values: BTreeMap<String, Value>,
}

impl Row {
    /// Create an empty row.
    pub fn new(row_id: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder-style column assignment.
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.values.insert(column.into(), value);
        self
    }
}

/// Column equality predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    pub equals: Value,
}

/// Query request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub table_id: String,
    #[serde(default)]
    pub filter: Option<ColumnFilter>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl QueryRequest {
    /// Select every row of a table.
    pub fn all(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            filter: None,
            limit: None,
        }
    }

    /// Restrict to rows whose `column` equals `value`.
    pub fn filter(mut self, column: impl Into<String>, value: Value) -> Self {
        self.filter = Some(ColumnFilter {
            column: column.into(),
            equals: value,
        });
        self
    }

    /// Restrict the number of rows returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Query result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub table_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Arguments naming a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableArgs {
    pub table_id: String,
}

/// Arguments for a single-row lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowArgs {
    pub table_id: String,
    pub row_id: String,
}

/// Arguments for a conditional metadata fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalMetadataArgs {
    pub table_id: String,
    /// Revision held by the caller; none when its copy carried no revision
    #[serde(default)]
    pub known_revision_id: Option<Token>,
}

/// Arguments for a metadata write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutMetadataArgs {
    #[serde(default)]
    pub principal: Option<String>,
    pub entry: MetadataEntry,
}

/// Arguments for a metadata delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMetadataArgs {
    #[serde(default)]
    pub principal: Option<String>,
    pub table_id: String,
    pub partition: String,
    pub aspect: String,
    pub key: String,
}

/// Arguments for retrieving the next chunk of a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchChunkArgs {
    pub id: Token,
}

/// Arguments for abandoning a chunk chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseChainArgs {
    /// Id of the chain's first chunk
    pub chain_id: Token,
}
