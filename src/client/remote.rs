//! Remote call client
//!
//! Runs one logical remote operation end to end:
//!
//! 1. Invoke the channel
//! 2. On success, reassemble the chunk chain (or accept an absent value for
//!    nullable operations) and deserialize the expected payload type
//! 3. On failure, decode the generic failure under the operation's policy
//!
//! Every exit path yields a typed value or a `TransportError`; the raw
//! channel failure never reaches the caller. Nothing is retried.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::operation::Operation;
use crate::channel::{Channel, ChannelFailure, Reply};
use crate::chunk::{self, Chunk};
use crate::config::RemoteConfig;
use crate::metadata::{MetadataEntry, MetadataSet, MetadataSource};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::protocol::{
    ConditionalMetadataArgs, DeleteMetadataArgs, ErrorKind, FetchChunkArgs, PutMetadataArgs,
    QueryRequest, QueryResult, ReleaseChainArgs, Row, RowArgs, TableArgs, TableInfo, Token,
    TransportError, TransportResult,
};
use crate::tunnel;

/// Typed client over a call channel
pub struct RemoteClient {
    channel: Arc<dyn Channel>,
    config: RemoteConfig,
    metrics: Arc<MetricsRegistry>,
}

impl RemoteClient {
    /// Create a client with its own metrics registry.
    pub fn new(channel: Arc<dyn Channel>, config: RemoteConfig) -> Self {
        Self::with_metrics(channel, config, Arc::new(MetricsRegistry::new()))
    }

    /// Create a client recording into `metrics`.
    pub fn with_metrics(
        channel: Arc<dyn Channel>,
        config: RemoteConfig,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            channel,
            config,
            metrics,
        }
    }

    /// Client configuration.
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Metrics registry this client records into.
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Open a table.
    pub fn open(&self, table_id: &str) -> TransportResult<TableInfo> {
        self.call(
            Operation::Open,
            &TableArgs {
                table_id: table_id.to_string(),
            },
        )
    }

    /// Close a table.
    pub fn close(&self, table_id: &str) -> TransportResult<()> {
        self.call_unit(
            Operation::Close,
            &TableArgs {
                table_id: table_id.to_string(),
            },
        )
    }

    /// Run a query.
    pub fn query(&self, request: &QueryRequest) -> TransportResult<QueryResult> {
        self.call(Operation::Query, request)
    }

    /// Look up one row. `None` when the row does not exist.
    pub fn get_row(&self, table_id: &str, row_id: &str) -> TransportResult<Option<Row>> {
        self.call_nullable(
            Operation::GetRow,
            &RowArgs {
                table_id: table_id.to_string(),
                row_id: row_id.to_string(),
            },
        )
    }

    /// Fetch the complete metadata set of a table.
    pub fn get_metadata(&self, table_id: &str) -> TransportResult<MetadataSet> {
        self.call(
            Operation::GetMetadata,
            &TableArgs {
                table_id: table_id.to_string(),
            },
        )
    }

    /// Fetch the metadata set of a table given the revision already held.
    pub fn get_metadata_if_changed(
        &self,
        table_id: &str,
        known_revision_id: Option<Token>,
    ) -> TransportResult<MetadataSet> {
        self.call(
            Operation::GetMetadataIfChanged,
            &ConditionalMetadataArgs {
                table_id: table_id.to_string(),
                known_revision_id,
            },
        )
    }

    /// Write a metadata entry as the configured principal.
    pub fn put_metadata(&self, entry: MetadataEntry) -> TransportResult<()> {
        self.call_unit(
            Operation::PutMetadata,
            &PutMetadataArgs {
                principal: self.config.principal.clone(),
                entry,
            },
        )
    }

    /// Delete a metadata entry as the configured principal.
    pub fn delete_metadata(
        &self,
        table_id: &str,
        partition: &str,
        aspect: &str,
        key: &str,
    ) -> TransportResult<()> {
        self.call_unit(
            Operation::DeleteMetadata,
            &DeleteMetadataArgs {
                principal: self.config.principal.clone(),
                table_id: table_id.to_string(),
                partition: partition.to_string(),
                aspect: aspect.to_string(),
                key: key.to_string(),
            },
        )
    }

    fn call<A, T>(&self, operation: Operation, args: &A) -> TransportResult<T>
    where
        A: Serialize,
        T: DeserializeOwned,
    {
        self.observe(operation, || {
            self.request(operation, args)?.ok_or_else(|| {
                TransportError::internal(format!("{} returned no value", operation))
            })
        })
    }

    fn call_nullable<A, T>(&self, operation: Operation, args: &A) -> TransportResult<Option<T>>
    where
        A: Serialize,
        T: DeserializeOwned,
    {
        self.observe(operation, || self.request(operation, args))
    }

    fn call_unit<A: Serialize>(&self, operation: Operation, args: &A) -> TransportResult<()> {
        self.observe(operation, || match self.invoke(operation, to_args(args)?)? {
            Reply::Unit => Ok(()),
            other => Err(unexpected_reply(operation, &other)),
        })
    }

    fn request<A, T>(&self, operation: Operation, args: &A) -> TransportResult<Option<T>>
    where
        A: Serialize,
        T: DeserializeOwned,
    {
        let reply = self.invoke(operation, to_args(args)?)?;
        self.read_value(operation, reply)
    }

    /// Record the outcome of one logical operation, chunk fetches included.
    fn observe<T>(
        &self,
        operation: Operation,
        run: impl FnOnce() -> TransportResult<T>,
    ) -> TransportResult<T> {
        let result = run();
        if let Err(err) = &result {
            self.metrics.increment_calls_failed();
            let method = operation.method_name();
            if err.requires_reconnect() {
                self.metrics.increment_service_unavailable();
                log_event_with_fields(
                    Event::RemoteUnavailable,
                    &[("method", method), ("message", &err.message)],
                );
            } else {
                log_event_with_fields(
                    Event::RemoteCallFailed,
                    &[
                        ("method", method),
                        ("code", err.code()),
                        ("message", &err.message),
                    ],
                );
            }
        }
        result
    }

    fn invoke(&self, operation: Operation, args: Value) -> TransportResult<Reply> {
        let method = operation.method_name();
        self.metrics.increment_calls_issued();
        log_event_with_fields(Event::RemoteCallStart, &[("method", method)]);

        match self.channel.invoke(method, &args) {
            Ok(reply) => {
                log_event_with_fields(
                    Event::RemoteCallComplete,
                    &[("method", method), ("reply", reply.shape())],
                );
                Ok(reply)
            }
            Err(failure) => Err(self.decode_failure(operation, &failure)),
        }
    }

    fn decode_failure(&self, operation: Operation, failure: &ChannelFailure) -> TransportError {
        let policy = operation.policy();
        let err = tunnel::decode(failure, &policy);

        if err.kind == ErrorKind::Internal {
            self.metrics.increment_tunnel_collapses();
            log_event_with_fields(
                Event::TunnelCollapsed,
                &[
                    ("method", operation.method_name()),
                    ("policy", policy.name()),
                    ("raw", &failure.to_string()),
                ],
            );
        }
        err
    }

    fn read_value<T: DeserializeOwned>(
        &self,
        operation: Operation,
        reply: Reply,
    ) -> TransportResult<Option<T>> {
        let expected = operation
            .result_tag()
            .ok_or_else(|| unexpected_reply(operation, &reply))?;

        let first = match reply {
            Reply::Chunked { tag, first } if tag == expected => Some(self.decode_frame(&first)?),
            Reply::Absent(tag) if tag == expected && operation.is_nullable() => None,
            other => return Err(unexpected_reply(operation, &other)),
        };

        let chain_id = first.as_ref().map(|chunk| chunk.id);
        let bytes = match chunk::decode_allow_absent(first, |id| self.fetch_chunk(id)) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(err) => {
                if let Some(chain_id) = chain_id {
                    self.release_chain(&chain_id);
                }
                return Err(err);
            }
        };

        self.metrics.add_payload_bytes(bytes.len() as u64);
        log_event_with_fields(
            Event::ChunkChainComplete,
            &[
                ("method", operation.method_name()),
                ("bytes", &bytes.len().to_string()),
            ],
        );

        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            TransportError::internal(format!("failed to decode {} payload: {}", expected, e))
        })
    }

    fn fetch_chunk(&self, id: &Token) -> TransportResult<Chunk> {
        let id_str = id.to_string();
        log_event_with_fields(Event::ChunkFetch, &[("id", &id_str)]);

        let reply = self.invoke(Operation::FetchChunk, to_args(&FetchChunkArgs { id: *id })?)?;
        match reply {
            Reply::Fragment(frame) => {
                let chunk = self.decode_frame(&frame)?;
                self.metrics.increment_chunks_fetched();
                Ok(chunk)
            }
            other => Err(unexpected_reply(Operation::FetchChunk, &other)),
        }
    }

    /// Ask the peer to drop the rest of an abandoned chain. Failure is
    /// ignored: a dead peer has already dropped it.
    fn release_chain(&self, chain_id: &Token) {
        let released = to_args(&ReleaseChainArgs {
            chain_id: *chain_id,
        })
        .and_then(|args| self.invoke(Operation::ReleaseChain, args));
        if let Err(err) = released {
            log_event_with_fields(
                Event::RemoteCallFailed,
                &[
                    ("method", Operation::ReleaseChain.method_name()),
                    ("code", err.code()),
                    ("message", &err.message),
                ],
            );
        }
    }

    fn decode_frame(&self, frame: &[u8]) -> TransportResult<Chunk> {
        chunk::decode_frame(frame, self.config.verify_chunk_checksums).map_err(|e| {
            log_event_with_fields(Event::ChunkFrameRejected, &[("error", &e.to_string())]);
            TransportError::from(e)
        })
    }
}

impl MetadataSource for RemoteClient {
    fn fetch_metadata(&self, table_id: &str) -> TransportResult<MetadataSet> {
        self.get_metadata(table_id)
    }

    fn fetch_metadata_if_changed(
        &self,
        table_id: &str,
        known_revision_id: Option<Token>,
    ) -> TransportResult<MetadataSet> {
        self.get_metadata_if_changed(table_id, known_revision_id)
    }
}

fn to_args<A: Serialize>(args: &A) -> TransportResult<Value> {
    serde_json::to_value(args)
        .map_err(|e| TransportError::internal(format!("failed to encode arguments: {}", e)))
}

fn unexpected_reply(operation: Operation, reply: &Reply) -> TransportError {
    TransportError::internal(format!(
        "unexpected {} reply to {}",
        reply.shape(),
        operation
    ))
}
