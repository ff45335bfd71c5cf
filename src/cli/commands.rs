//! CLI command implementations
//!
//! Each command builds its JSON result without touching stdout so it can be
//! tested directly; `run_command` prints the result.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::channel::LoopbackChannel;
use crate::chunk;
use crate::client::ClientSession;
use crate::config::RemoteConfig;
use crate::metadata::{MetadataEntry, MetadataFilter};
use crate::observability::Logger;
use crate::protocol::{ErrorKind, QueryRequest, Row, TransportError};
use crate::store::MemoryStore;
use crate::tunnel::{self, CallPolicy};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;

const DEMO_TABLE: &str = "demo";
const DEMO_PRINCIPAL: &str = "demo-admin";
const DEMO_ROWS: usize = 200;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let data = match cmd {
        Command::EncodeError { kind, message } => encode_error(&kind, &message)?,
        Command::DecodeError { policy, message } => decode_error(&policy, message.as_deref())?,
        Command::Chunk { size, bytes } => chunk_plan(size, bytes)?,
        Command::Demo { config } => demo(config.as_deref())?,
    };
    write_response(data)
}

/// Tunneled wire message for a typed error.
pub fn encode_error(kind: &str, message: &str) -> CliResult<Value> {
    let kind = ErrorKind::from_name(kind)
        .ok_or_else(|| CliError::invalid_argument(format!("unknown error kind '{}'", kind)))?;
    let err = TransportError::new(kind, message);
    Ok(json!({ "wire": tunnel::encode_message(&err) }))
}

/// Decode a raw failure message under a call policy.
pub fn decode_error(policy: &str, message: Option<&str>) -> CliResult<Value> {
    let policy = CallPolicy::from_name(policy)
        .ok_or_else(|| CliError::invalid_argument(format!("unknown policy '{}'", policy)))?;
    let err = tunnel::decode_message(message, &policy);
    Ok(json!({
        "policy": policy.name(),
        "kind": err.kind.name(),
        "code": err.code(),
        "message": err.message,
    }))
}

/// Chunk sizes for a payload of `bytes` bytes split at `size`.
pub fn chunk_plan(size: usize, bytes: usize) -> CliResult<Value> {
    if size == 0 {
        return Err(CliError::invalid_argument("chunk size must be greater than zero"));
    }
    let chunks = chunk::encode(&vec![0u8; bytes], size);
    let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
    Ok(json!({
        "max_chunk_size": size,
        "payload_bytes": bytes,
        "chunk_count": chunks.len(),
        "chunk_sizes": sizes,
    }))
}

/// Run a scripted session over the loopback channel.
///
/// Opens a table, queries it across many chunks, writes metadata, reads it
/// twice through the cache, and reports the session's metrics.
pub fn demo(config_path: Option<&Path>) -> CliResult<Value> {
    let config = match config_path {
        Some(path) => RemoteConfig::load(path)?,
        None => RemoteConfig::default(),
    };
    Logger::set_min_severity(config.severity()?);
    let config = config.with_principal(DEMO_PRINCIPAL);

    let store = Arc::new(MemoryStore::new());
    seed_store(&store)?;
    let channel = Arc::new(LoopbackChannel::new(store, config.max_chunk_size));
    let session = ClientSession::new(channel, config);

    let info = session.open(DEMO_TABLE)?;
    let result = session.query(&QueryRequest::all(DEMO_TABLE))?;
    let missing = session.get_row(DEMO_TABLE, "no-such-row")?;

    session.put_metadata(MetadataEntry::new(
        DEMO_TABLE, "default", "display", "title", "string", "Demo table",
    ))?;
    let first = session.metadata(DEMO_TABLE, &MetadataFilter::all())?;
    let second = session.metadata(DEMO_TABLE, &MetadataFilter::all().aspect("display"))?;
    session.close(DEMO_TABLE)?;

    let stats = session.cache_stats();
    Ok(json!({
        "table": info.table_id,
        "rows_returned": result.rows.len(),
        "missing_row_absent": missing.is_none(),
        "metadata_entries": first.len(),
        "metadata_revision_stable": first.revision_id == second.revision_id,
        "metrics": session.metrics(),
        "cache": {
            "misses": stats.misses,
            "hits": stats.hits,
            "refreshes": stats.refreshes,
        },
    }))
}

fn seed_store(store: &MemoryStore) -> CliResult<()> {
    store.create_table(DEMO_TABLE, &["name", "score"])?;
    for i in 0..DEMO_ROWS {
        store.insert_row(
            DEMO_TABLE,
            Row::new(i.to_string())
                .with("name", json!(format!("row-{}", i)))
                .with("score", json!(i * 7 % 100)),
        )?;
    }
    store.grant_write(DEMO_PRINCIPAL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_encode_error_wire_form() {
        let data = encode_error("StorageError", "disk full").unwrap();
        assert_eq!(data["wire"], "aeroremote.transport|StorageError: disk full");
    }

    #[test]
    fn test_encode_error_unknown_kind() {
        let err = encode_error("Boom", "x").unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::InvalidArgument);
    }

    #[test]
    fn test_decode_error_respects_policy() {
        let wire = "aeroremote.transport|NotAuthorized: nope";

        let always = decode_error("always", Some(wire)).unwrap();
        assert_eq!(always["kind"], "Internal");

        let privileged = decode_error("privileged", Some(wire)).unwrap();
        assert_eq!(privileged["kind"], "NotAuthorized");
        assert_eq!(privileged["message"], "nope");
    }

    #[test]
    fn test_decode_error_without_message() {
        let data = decode_error("always", None).unwrap();
        assert_eq!(data["kind"], "ServiceUnavailable");
    }

    #[test]
    fn test_chunk_plan() {
        let data = chunk_plan(4096, 10_000).unwrap();
        assert_eq!(data["chunk_count"], 3);
        assert_eq!(data["chunk_sizes"], json!([4096, 4096, 1808]));

        let empty = chunk_plan(4096, 0).unwrap();
        assert_eq!(empty["chunk_count"], 1);

        assert!(chunk_plan(0, 10).is_err());
    }

    #[test]
    fn test_demo_with_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("aeroremote.json");
        fs::write(
            &config_path,
            json!({"max_chunk_size": 256, "log_level": "error"}).to_string(),
        )
        .unwrap();

        let data = demo(Some(&config_path)).unwrap();
        assert_eq!(data["rows_returned"], DEMO_ROWS);
        assert_eq!(data["missing_row_absent"], true);
        assert_eq!(data["metadata_entries"], 1);
        assert_eq!(data["metadata_revision_stable"], true);
        assert_eq!(data["cache"]["misses"], 1);
        assert_eq!(data["cache"]["hits"], 1);
        assert!(data["metrics"]["chunks_fetched"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_demo_rejects_bad_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("aeroremote.json");
        fs::write(&config_path, json!({"max_chunk_size": 0}).to_string()).unwrap();

        let err = demo(Some(&config_path)).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }
}
