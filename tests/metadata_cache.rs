//! Metadata Cache Tests
//!
//! Covers:
//! - First get performs one unconditional fetch
//! - Repeat get performs one conditional fetch and keeps the revision
//! - A server-side change is picked up and replaces the cache line
//! - Filtering and copy semantics
//! - Sessions never share cache lines

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use aeroremote::channel::{Channel, ChannelFailure, LoopbackChannel, Reply};
use aeroremote::client::ClientSession;
use aeroremote::config::RemoteConfig;
use aeroremote::metadata::{MetadataEntry, MetadataFilter};
use aeroremote::protocol::ErrorKind;
use aeroremote::store::{MemoryStore, Store};
use serde_json::Value;

// =============================================================================
// Test Utilities
// =============================================================================

const WRITER: &str = "writer";

/// Records how often each method was invoked.
struct CountingChannel {
    inner: LoopbackChannel,
    calls: Mutex<HashMap<String, u64>>,
}

impl CountingChannel {
    fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            inner: LoopbackChannel::new(store, 64),
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn count(&self, method: &str) -> u64 {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }
}

impl Channel for CountingChannel {
    fn invoke(&self, method: &str, args: &Value) -> Result<Reply, ChannelFailure> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_insert(0) += 1;
        self.inner.invoke(method, args)
    }
}

fn entry(partition: &str, key: &str, value: &str) -> MetadataEntry {
    MetadataEntry::new("T", partition, "schema", key, "string", value)
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.create_table("T", &["c"]).unwrap();
    store.grant_write(WRITER).unwrap();
    for (partition, key, value) in [("p", "a", "1"), ("p", "b", "2"), ("q", "a", "3")] {
        store
            .put_metadata(Some(WRITER), entry(partition, key, value))
            .unwrap();
    }
    store
}

fn counting_session(store: Arc<MemoryStore>) -> (Arc<CountingChannel>, ClientSession) {
    let channel = Arc::new(CountingChannel::new(store));
    let session = ClientSession::new(channel.clone(), RemoteConfig::default());
    (channel, session)
}

// =============================================================================
// Fetch behavior
// =============================================================================

#[test]
fn test_first_get_is_one_unconditional_fetch() {
    let (channel, session) = counting_session(seeded_store());

    let set = session.metadata("T", &MetadataFilter::all()).unwrap();
    assert_eq!(set.len(), 3);
    assert_eq!(channel.count("get_metadata"), 1);
    assert_eq!(channel.count("get_metadata_if_changed"), 0);
}

#[test]
fn test_repeat_get_is_one_conditional_fetch() {
    let store = seeded_store();
    let (channel, session) = counting_session(store.clone());

    let first = session.metadata("T", &MetadataFilter::all()).unwrap();
    let second = session.metadata("T", &MetadataFilter::all()).unwrap();

    assert_eq!(channel.count("get_metadata"), 1);
    assert_eq!(channel.count("get_metadata_if_changed"), 1);
    assert_eq!(first.revision_id, second.revision_id);
    assert_eq!(first.entries, second.entries);
    assert_eq!(session.cache_stats().hits, 1);
}

#[test]
fn test_server_change_replaces_cache_line() {
    let store = seeded_store();
    let (channel, session) = counting_session(store.clone());

    let before = session.metadata("T", &MetadataFilter::all()).unwrap();

    store
        .put_metadata(Some(WRITER), entry("p", "a", "changed"))
        .unwrap();
    let server_revision = store.metadata("T").unwrap().revision_id;
    assert_ne!(server_revision, before.revision_id);

    let after = session.metadata("T", &MetadataFilter::all()).unwrap();
    assert_eq!(after.revision_id, server_revision);
    assert!(after.entries.iter().any(|e| e.value == "changed"));
    assert_eq!(session.cache_stats().refreshes, 1);

    // The refreshed line is now current
    let again = session.metadata("T", &MetadataFilter::all()).unwrap();
    assert_eq!(again.revision_id, server_revision);
    assert_eq!(channel.count("get_metadata"), 1);
    assert_eq!(channel.count("get_metadata_if_changed"), 2);
}

#[test]
fn test_rewriting_same_value_keeps_revision() {
    let store = seeded_store();
    let (_channel, session) = counting_session(store.clone());

    let before = session.metadata("T", &MetadataFilter::all()).unwrap();
    store.put_metadata(Some(WRITER), entry("p", "a", "1")).unwrap();
    let after = session.metadata("T", &MetadataFilter::all()).unwrap();

    assert_eq!(before.revision_id, after.revision_id);
    assert_eq!(session.cache_stats().refreshes, 0);
}

#[test]
fn test_fetch_failure_surfaces_and_keeps_line() {
    let store = seeded_store();
    let channel = Arc::new(LoopbackChannel::new(store, 64));
    let session = ClientSession::new(channel.clone(), RemoteConfig::default());

    let cached = session.metadata("T", &MetadataFilter::all()).unwrap();
    channel.disconnect();

    let err = session.metadata("T", &MetadataFilter::all()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    assert_eq!(session.cached_tables(), 1);

    channel.reconnect();
    let again = session.metadata("T", &MetadataFilter::all()).unwrap();
    assert_eq!(again.revision_id, cached.revision_id);
}

// =============================================================================
// Filtering
// =============================================================================

#[test]
fn test_partition_filter_only_returns_matches() {
    let (_channel, session) = counting_session(seeded_store());

    let set = session.get_metadata("T", Some("p"), None, None).unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.entries.iter().all(|e| e.partition == "p"));

    let keyed = session.get_metadata("T", Some("p"), None, Some("b")).unwrap();
    assert_eq!(keyed.len(), 1);
    assert_eq!(keyed.entries[0].value, "2");
}

#[test]
fn test_no_match_is_empty_without_revision() {
    let (_channel, session) = counting_session(seeded_store());

    let set = session.get_metadata("T", Some("nowhere"), None, None).unwrap();
    assert_eq!(set.table_id, "T");
    assert!(set.is_empty());
    assert!(set.revision_id.is_none());
}

#[test]
fn test_mutating_result_does_not_touch_cache() {
    let (_channel, session) = counting_session(seeded_store());

    let mut set = session.get_metadata("T", Some("p"), None, None).unwrap();
    set.entries.clear();
    set.entries.push(entry("p", "zzz", "injected"));

    let fresh = session.get_metadata("T", Some("p"), None, None).unwrap();
    assert_eq!(fresh.len(), 2);
    assert!(fresh.entries.iter().all(|e| e.key != "zzz"));
}

// =============================================================================
// Session lifetime
// =============================================================================

#[test]
fn test_sessions_have_independent_caches() {
    let store = seeded_store();
    let (channel_a, session_a) = counting_session(store.clone());
    let (channel_b, session_b) = counting_session(store);

    session_a.metadata("T", &MetadataFilter::all()).unwrap();
    assert_eq!(session_a.cached_tables(), 1);
    assert_eq!(session_b.cached_tables(), 0);

    session_b.metadata("T", &MetadataFilter::all()).unwrap();
    assert_eq!(channel_a.count("get_metadata"), 1);
    assert_eq!(channel_b.count("get_metadata"), 1);
}

#[test]
fn test_dropping_session_drops_cache() {
    let store = seeded_store();
    let (channel, session) = counting_session(store.clone());
    session.metadata("T", &MetadataFilter::all()).unwrap();
    drop(session);

    let session = ClientSession::new(channel.clone(), RemoteConfig::default());
    session.metadata("T", &MetadataFilter::all()).unwrap();
    assert_eq!(channel.count("get_metadata"), 2);
}
