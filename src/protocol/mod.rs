//! Shared protocol types
//!
//! Types used on both sides of the call channel: the transport error
//! taxonomy, opaque tokens, and the request/result payloads.

mod errors;
mod messages;
mod token;

pub use errors::{ErrorKind, ErrorSeverity, TransportError, TransportResult};
pub use messages::{
    ColumnFilter, ConditionalMetadataArgs, DeleteMetadataArgs, FetchChunkArgs, PayloadTag,
    PutMetadataArgs, QueryRequest, QueryResult, ReleaseChainArgs, Row, RowArgs, TableArgs,
    TableInfo,
};
pub use token::{Token, TOKEN_SIZE};
