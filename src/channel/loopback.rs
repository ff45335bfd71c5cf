//! In-process serving side
//!
//! `LoopbackChannel` plays the remote process: it dispatches method names
//! to a `Store`, serializes results, splits them into chunk chains through
//! a `ChunkRegistry`, and tunnels every store error through the generic
//! failure signal. A disconnected loopback answers every call with a
//! platform failure, the way a dead peer would.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{Channel, ChannelFailure, Reply};
use crate::chunk::{encode_frame, ChunkRegistry};
use crate::client::Operation;
use crate::metadata::MetadataSet;
use crate::observability::{log_event_with_fields, Event};
use crate::protocol::{
    ConditionalMetadataArgs, DeleteMetadataArgs, FetchChunkArgs, PayloadTag, PutMetadataArgs,
    QueryRequest, ReleaseChainArgs, RowArgs, TableArgs, TransportError, TransportResult,
};
use crate::store::Store;
use crate::tunnel;

/// Channel whose peer lives in the same process
pub struct LoopbackChannel {
    store: Arc<dyn Store>,
    registry: ChunkRegistry,
    connected: AtomicBool,
    invocations: AtomicU64,
}

impl LoopbackChannel {
    /// Serve `store`, splitting replies at `max_chunk_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `max_chunk_size` is zero.
    pub fn new(store: Arc<dyn Store>, max_chunk_size: usize) -> Self {
        Self {
            store,
            registry: ChunkRegistry::new(max_chunk_size),
            connected: AtomicBool::new(true),
            invocations: AtomicU64::new(0),
        }
    }

    /// Simulate the peer process dying. Parked chunks are dropped.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.registry.clear();
        log_event_with_fields(Event::LoopbackDisconnected, &[]);
    }

    /// Bring the peer back.
    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Whether the peer is reachable.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of invocations received, chunk fetches included.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Chunks served out of band and not yet pulled.
    pub fn pending_chunks(&self) -> usize {
        self.registry.pending_count()
    }

    fn dispatch(&self, operation: Operation, args: &Value) -> TransportResult<Reply> {
        match operation {
            Operation::Open => {
                let args: TableArgs = parse_args(args)?;
                self.chunked(PayloadTag::TableInfo, &self.store.open_table(&args.table_id)?)
            }
            Operation::Close => {
                let args: TableArgs = parse_args(args)?;
                self.store.close_table(&args.table_id)?;
                Ok(Reply::Unit)
            }
            Operation::Query => {
                let request: QueryRequest = parse_args(args)?;
                self.chunked(PayloadTag::QueryResult, &self.store.query(&request)?)
            }
            Operation::GetRow => {
                let args: RowArgs = parse_args(args)?;
                match self.store.get_row(&args.table_id, &args.row_id)? {
                    Some(row) => self.chunked(PayloadTag::Row, &row),
                    None => Ok(Reply::Absent(PayloadTag::Row)),
                }
            }
            Operation::GetMetadata => {
                let args: TableArgs = parse_args(args)?;
                self.chunked(PayloadTag::MetadataSet, &self.store.metadata(&args.table_id)?)
            }
            Operation::GetMetadataIfChanged => {
                let args: ConditionalMetadataArgs = parse_args(args)?;
                let current = self.store.metadata(&args.table_id)?;
                let reply = if current.revision_id == args.known_revision_id {
                    MetadataSet::new(args.table_id, current.revision_id, Vec::new())
                } else {
                    current
                };
                self.chunked(PayloadTag::MetadataSet, &reply)
            }
            Operation::PutMetadata => {
                let args: PutMetadataArgs = parse_args(args)?;
                self.store
                    .put_metadata(args.principal.as_deref(), args.entry)?;
                Ok(Reply::Unit)
            }
            Operation::DeleteMetadata => {
                let args: DeleteMetadataArgs = parse_args(args)?;
                self.store.delete_metadata(
                    args.principal.as_deref(),
                    &args.table_id,
                    &args.partition,
                    &args.aspect,
                    &args.key,
                )?;
                Ok(Reply::Unit)
            }
            Operation::FetchChunk => {
                let args: FetchChunkArgs = parse_args(args)?;
                let chunk = self.registry.take(&args.id)?.ok_or_else(|| {
                    TransportError::argument_error(format!("unknown chunk id: {}", args.id))
                })?;
                Ok(Reply::Fragment(encode_frame(&chunk)))
            }
            Operation::ReleaseChain => {
                let args: ReleaseChainArgs = parse_args(args)?;
                self.registry.release_chain(&args.chain_id)?;
                Ok(Reply::Unit)
            }
        }
    }

    fn chunked<T: Serialize>(&self, tag: PayloadTag, value: &T) -> TransportResult<Reply> {
        let bytes = serde_json::to_vec(value).map_err(|e| {
            TransportError::internal(format!("failed to serialize {}: {}", tag, e))
        })?;
        let first = self.registry.register(&bytes)?;
        Ok(Reply::Chunked {
            tag,
            first: encode_frame(&first),
        })
    }
}

fn parse_args<T: DeserializeOwned>(args: &Value) -> TransportResult<T> {
    T::deserialize(args)
        .map_err(|e| TransportError::argument_error(format!("invalid arguments: {}", e)))
}

impl Channel for LoopbackChannel {
    fn invoke(&self, method: &str, args: &Value) -> Result<Reply, ChannelFailure> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        if !self.is_connected() {
            return Err(ChannelFailure::platform("remote process is not reachable"));
        }

        log_event_with_fields(Event::LoopbackDispatch, &[("method", method)]);

        let operation = Operation::from_method_name(method).ok_or_else(|| {
            tunnel::encode(&TransportError::argument_error(format!(
                "unknown method: {}",
                method
            )))
        })?;

        self.dispatch(operation, args)
            .map_err(|err| tunnel::encode(&err))
    }
}
