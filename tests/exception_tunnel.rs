//! Exception Tunnel Tests
//!
//! Covers:
//! - Typed errors survive the generic failure channel under their policy
//! - NotAuthorized collapses to Internal at ordinary call sites
//! - Messages without the namespace marker decode to ServiceUnavailable
//! - Store errors travel end to end through the loopback channel

use std::sync::Arc;

use aeroremote::channel::{ChannelFailure, LoopbackChannel};
use aeroremote::client::RemoteClient;
use aeroremote::config::RemoteConfig;
use aeroremote::protocol::{ErrorKind, QueryRequest, TransportError};
use aeroremote::store::MemoryStore;
use aeroremote::tunnel::{self, CallPolicy, NAMESPACE_MARKER};

const POLICIES: [CallPolicy; 2] = [CallPolicy::ALWAYS_ALLOWED, CallPolicy::PRIVILEGED];

// =============================================================================
// Policy behavior
// =============================================================================

#[test]
fn test_not_authorized_privileged_vs_always() {
    let wire = tunnel::encode(&TransportError::not_authorized("x"));

    let privileged = tunnel::decode(&wire, &CallPolicy::PRIVILEGED);
    assert_eq!(privileged, TransportError::not_authorized("x"));

    let always = tunnel::decode(&wire, &CallPolicy::ALWAYS_ALLOWED);
    assert_eq!(always.kind, ErrorKind::Internal);
}

#[test]
fn test_always_allowed_kinds_survive_every_policy() {
    let errors = [
        TransportError::argument_error("bad row id"),
        TransportError::storage_error("table locked"),
        TransportError::service_unavailable("store shutting down"),
    ];
    for err in errors {
        for policy in POLICIES {
            let decoded = tunnel::decode(&tunnel::encode(&err), &policy);
            assert_eq!(decoded, err, "policy {}", policy);
        }
    }
}

#[test]
fn test_internal_is_never_reconstructed() {
    let wire = tunnel::encode(&TransportError::internal("boom"));
    for policy in POLICIES {
        assert_eq!(tunnel::decode(&wire, &policy).kind, ErrorKind::Internal);
    }
}

#[test]
fn test_detail_with_colons_kept_intact() {
    let err = TransportError::argument_error("bad filter: column: age");
    let decoded = tunnel::decode(&tunnel::encode(&err), &CallPolicy::ALWAYS_ALLOWED);
    assert_eq!(decoded.message, "bad filter: column: age");
}

// =============================================================================
// Malformed and foreign failures
// =============================================================================

#[test]
fn test_message_without_marker_is_service_unavailable() {
    let messages = [
        "",
        "NullPointerException",
        "ArgumentError: looks typed but is not",
        "aeroremote.transportArgumentError: missing separator",
        "other.namespace|ArgumentError: x",
    ];
    for message in messages {
        for policy in POLICIES {
            let decoded = tunnel::decode(&ChannelFailure::generic(message), &policy);
            assert_eq!(
                decoded.kind,
                ErrorKind::ServiceUnavailable,
                "message {:?} under {}",
                message,
                policy
            );
        }
    }
}

#[test]
fn test_null_message_is_service_unavailable() {
    let failure = ChannelFailure::Generic { message: None };
    for policy in POLICIES {
        assert_eq!(
            tunnel::decode(&failure, &policy).kind,
            ErrorKind::ServiceUnavailable
        );
    }
}

#[test]
fn test_platform_failure_is_service_unavailable() {
    let failure = ChannelFailure::platform("peer died");
    let decoded = tunnel::decode(&failure, &CallPolicy::PRIVILEGED);
    assert_eq!(decoded.kind, ErrorKind::ServiceUnavailable);
    assert!(decoded.requires_reconnect());
}

#[test]
fn test_marker_with_garbage_never_panics() {
    let garbage = [
        format!("{}|", NAMESPACE_MARKER),
        format!("{}|:", NAMESPACE_MARKER),
        format!("{}|NoColonHere", NAMESPACE_MARKER),
        format!("{}|Nonsense: detail", NAMESPACE_MARKER),
        format!("{}|\u{1F4A5}: \u{0}", NAMESPACE_MARKER),
    ];
    for message in &garbage {
        for policy in POLICIES {
            let decoded = tunnel::decode_message(Some(message), &policy);
            assert_eq!(decoded.kind, ErrorKind::Internal, "message {:?}", message);
        }
    }
}

// =============================================================================
// End to end
// =============================================================================

fn client_over(store: Arc<MemoryStore>) -> RemoteClient {
    let channel = Arc::new(LoopbackChannel::new(store, 1024));
    RemoteClient::new(channel, RemoteConfig::default())
}

#[test]
fn test_store_errors_reach_caller_typed() {
    let store = Arc::new(MemoryStore::new());
    store.create_table("t", &["v"]).unwrap();
    let client = client_over(store);

    let err = client.open("missing").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ArgumentError);
    assert!(err.message.contains("missing"));

    // Query before open: the store rejects it
    let err = client.query(&QueryRequest::all("t")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::StorageError);

    let metrics = client.metrics().snapshot();
    assert_eq!(metrics.calls_failed, 2);
    assert_eq!(metrics.tunnel_collapses, 0);
}
