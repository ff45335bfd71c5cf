//! Remote Client Tests
//!
//! Covers:
//! - Typed operations over the loopback channel
//! - Nullable results
//! - Privileged call sites and NotAuthorized
//! - Dead peers surface as ServiceUnavailable, including mid-chain
//! - Raw channel failures never reach the caller

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aeroremote::channel::{Channel, ChannelFailure, LoopbackChannel, Reply};
use aeroremote::client::{ClientSession, RemoteClient};
use aeroremote::config::RemoteConfig;
use aeroremote::metadata::{MetadataEntry, MetadataFilter};
use aeroremote::protocol::{ErrorKind, QueryRequest, Row, TransportError};
use aeroremote::store::MemoryStore;
use aeroremote::tunnel;
use serde_json::{json, Value};

// =============================================================================
// Test Utilities
// =============================================================================

const ADMIN: &str = "admin";

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.create_table("users", &["name", "role"]).unwrap();
    let people = [("1", "ada", "admin"), ("2", "bob", "user"), ("3", "cy", "user")];
    for (id, name, role) in people {
        store
            .insert_row(
                "users",
                Row::new(id).with("name", json!(name)).with("role", json!(role)),
            )
            .unwrap();
    }
    store.grant_write(ADMIN).unwrap();
    store
}

fn client(store: Arc<MemoryStore>, config: RemoteConfig) -> (Arc<LoopbackChannel>, RemoteClient) {
    let channel = Arc::new(LoopbackChannel::new(store, config.max_chunk_size));
    let client = RemoteClient::new(channel.clone(), config);
    (channel, client)
}

/// Answers every call with the same tunneled error.
struct FailingChannel {
    failure: ChannelFailure,
}

impl Channel for FailingChannel {
    fn invoke(&self, _method: &str, _args: &Value) -> Result<Reply, ChannelFailure> {
        Err(self.failure.clone())
    }
}

/// Kills the peer right after the first chunk of a reply has been sent.
struct DyingChannel {
    inner: Arc<LoopbackChannel>,
    armed: AtomicBool,
}

impl Channel for DyingChannel {
    fn invoke(&self, method: &str, args: &Value) -> Result<Reply, ChannelFailure> {
        let reply = self.inner.invoke(method, args)?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.inner.disconnect();
        }
        Ok(reply)
    }
}

// =============================================================================
// Typed operations
// =============================================================================

#[test]
fn test_open_query_close() {
    let (_channel, client) = client(seeded_store(), RemoteConfig::default());

    let info = client.open("users").unwrap();
    assert_eq!(info.row_count, 3);
    assert_eq!(info.columns, vec!["name".to_string(), "role".to_string()]);

    let users = client
        .query(&QueryRequest::all("users").filter("role", json!("user")))
        .unwrap();
    let ids: Vec<&str> = users.rows.iter().map(|r| r.row_id.as_str()).collect();
    assert_eq!(ids, vec!["2", "3"]);

    client.close("users").unwrap();
    let err = client.close("users").unwrap_err();
    assert_eq!(err.kind, ErrorKind::StorageError);
}

#[test]
fn test_get_row_nullable() {
    let (_channel, client) = client(seeded_store(), RemoteConfig::default());
    client.open("users").unwrap();

    let row = client.get_row("users", "1").unwrap().unwrap();
    assert_eq!(row.values["name"], json!("ada"));

    assert_eq!(client.get_row("users", "404").unwrap(), None);
}

#[test]
fn test_small_chunks_same_answer() {
    let store = seeded_store();
    let (_a, small) = client(store.clone(), RemoteConfig::default().with_max_chunk_size(5));
    let (_b, large) = client(store, RemoteConfig::default());

    small.open("users").unwrap();
    let from_small = small.query(&QueryRequest::all("users")).unwrap();
    let from_large = large.query(&QueryRequest::all("users")).unwrap();
    assert_eq!(from_small, from_large);
}

// =============================================================================
// Privileged calls
// =============================================================================

#[test]
fn test_put_metadata_requires_principal() {
    let store = seeded_store();
    let (_channel, anonymous) = client(store.clone(), RemoteConfig::default());
    let entry = MetadataEntry::new("users", "p", "display", "color", "string", "red");

    let err = anonymous.put_metadata(entry.clone()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthorized);

    let (_channel, intruder) = client(store.clone(), RemoteConfig::default().with_principal("eve"));
    let err = intruder
        .delete_metadata("users", "p", "display", "color")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotAuthorized);

    let (_channel, admin) = client(store, RemoteConfig::default().with_principal(ADMIN));
    admin.put_metadata(entry).unwrap();
    assert_eq!(admin.get_metadata("users").unwrap().len(), 1);
    admin
        .delete_metadata("users", "p", "display", "color")
        .unwrap();
    assert!(admin.get_metadata("users").unwrap().is_empty());
}

#[test]
fn test_not_authorized_at_ordinary_site_is_internal() {
    let failure = tunnel::encode(&TransportError::not_authorized("denied"));
    let client = RemoteClient::new(Arc::new(FailingChannel { failure }), RemoteConfig::default());

    let err = client.query(&QueryRequest::all("users")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Internal);
    assert!(err.is_fatal());

    let err = client.put_metadata(MetadataEntry::new("users", "p", "a", "k", "t", "v"));
    assert_eq!(err.unwrap_err(), TransportError::not_authorized("denied"));
}

// =============================================================================
// Dead peers
// =============================================================================

#[test]
fn test_disconnected_peer_is_service_unavailable() {
    let (channel, client) = client(seeded_store(), RemoteConfig::default());
    client.open("users").unwrap();

    channel.disconnect();
    let err = client.query(&QueryRequest::all("users")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    assert!(err.requires_reconnect());
    assert_eq!(client.metrics().snapshot().service_unavailable, 1);
}

#[test]
fn test_peer_dies_mid_chain() {
    let loopback = Arc::new(LoopbackChannel::new(seeded_store(), 8));
    let dying = Arc::new(DyingChannel {
        inner: loopback.clone(),
        armed: AtomicBool::new(true),
    });
    let client = RemoteClient::new(dying, RemoteConfig::default());

    let err = client.open("users").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    assert!(!loopback.is_connected());

    let metrics = client.metrics().snapshot();
    assert_eq!(metrics.calls_failed, 1);
    assert_eq!(metrics.service_unavailable, 1);
}

#[test]
fn test_failure_without_message() {
    let failure = ChannelFailure::Generic { message: None };
    let client = RemoteClient::new(Arc::new(FailingChannel { failure }), RemoteConfig::default());
    assert_eq!(
        client.open("users").unwrap_err().kind,
        ErrorKind::ServiceUnavailable
    );
}

// =============================================================================
// Session
// =============================================================================

#[test]
fn test_session_round_trip() {
    let store = seeded_store();
    let channel = Arc::new(LoopbackChannel::new(store, 16));
    let session = ClientSession::new(channel, RemoteConfig::default().with_principal(ADMIN));

    session.open("users").unwrap();
    session
        .put_metadata(MetadataEntry::new("users", "p", "display", "color", "string", "red"))
        .unwrap();

    let set = session
        .metadata("users", &MetadataFilter::all().aspect("display"))
        .unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.entries[0].value, "red");

    let metrics = session.metrics();
    assert!(metrics.calls_issued > 3);
    assert_eq!(metrics.calls_failed, 0);
}
