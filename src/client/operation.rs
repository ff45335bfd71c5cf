//! Operation table
//!
//! The single place that knows, for each remote method, which error policy
//! applies, which payload type it returns, and whether its result may be
//! absent.

use std::fmt;

use crate::protocol::PayloadTag;
use crate::tunnel::CallPolicy;

/// Remote operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Open a table
    Open,
    /// Close a table
    Close,
    /// Query rows
    Query,
    /// Look up one row; may be absent
    GetRow,
    /// Unconditional metadata fetch
    GetMetadata,
    /// Conditional metadata fetch by revision
    GetMetadataIfChanged,
    /// Write a metadata entry (privileged)
    PutMetadata,
    /// Delete a metadata entry (privileged)
    DeleteMetadata,
    /// Pull the next chunk of a chain
    FetchChunk,
    /// Drop what is still parked for an abandoned chain
    ReleaseChain,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Operation; 10] = [
        Operation::Open,
        Operation::Close,
        Operation::Query,
        Operation::GetRow,
        Operation::GetMetadata,
        Operation::GetMetadataIfChanged,
        Operation::PutMetadata,
        Operation::DeleteMetadata,
        Operation::FetchChunk,
        Operation::ReleaseChain,
    ];

    /// Method name on the wire.
    pub fn method_name(&self) -> &'static str {
        match self {
            Operation::Open => "open",
            Operation::Close => "close",
            Operation::Query => "query",
            Operation::GetRow => "get_row",
            Operation::GetMetadata => "get_metadata",
            Operation::GetMetadataIfChanged => "get_metadata_if_changed",
            Operation::PutMetadata => "put_metadata",
            Operation::DeleteMetadata => "delete_metadata",
            Operation::FetchChunk => "fetch_chunk",
            Operation::ReleaseChain => "release_chain",
        }
    }

    /// Resolve a wire method name.
    pub fn from_method_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.method_name() == name)
    }

    /// Error policy of this call site.
    pub fn policy(&self) -> CallPolicy {
        match self {
            Operation::PutMetadata | Operation::DeleteMetadata => CallPolicy::PRIVILEGED,
            _ => CallPolicy::ALWAYS_ALLOWED,
        }
    }

    /// Payload type of a successful result, if any.
    pub fn result_tag(&self) -> Option<PayloadTag> {
        match self {
            Operation::Open => Some(PayloadTag::TableInfo),
            Operation::Query => Some(PayloadTag::QueryResult),
            Operation::GetRow => Some(PayloadTag::Row),
            Operation::GetMetadata | Operation::GetMetadataIfChanged => {
                Some(PayloadTag::MetadataSet)
            }
            Operation::Close
            | Operation::PutMetadata
            | Operation::DeleteMetadata
            | Operation::FetchChunk
            | Operation::ReleaseChain => None,
        }
    }

    /// Whether a successful result may be absent.
    pub fn is_nullable(&self) -> bool {
        matches!(self, Operation::GetRow)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method_name())
    }
}
