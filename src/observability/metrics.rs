//! Protocol metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only when the registry is created

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for one client session
///
/// All counters use Relaxed atomics; values are exact once calls have
/// returned.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Remote calls issued (chunk fetches included)
    calls_issued: AtomicU64,
    /// Logical operations that ended in a typed error
    calls_failed: AtomicU64,
    /// Chunks pulled after the first one
    chunks_fetched: AtomicU64,
    /// Reassembled payload bytes
    payload_bytes: AtomicU64,
    /// Tunneled errors collapsed to Internal
    tunnel_collapses: AtomicU64,
    /// Logical operations that ended in ServiceUnavailable
    service_unavailable: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment calls issued
    pub fn increment_calls_issued(&self) {
        self.calls_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment calls failed
    pub fn increment_calls_failed(&self) {
        self.calls_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment chunks fetched
    pub fn increment_chunks_fetched(&self) {
        self.chunks_fetched.fetch_add(1, Ordering::Relaxed);
    }

    /// Add reassembled payload bytes
    pub fn add_payload_bytes(&self, bytes: u64) {
        self.payload_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Increment tunnel collapses
    pub fn increment_tunnel_collapses(&self) {
        self.tunnel_collapses.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment service-unavailable outcomes
    pub fn increment_service_unavailable(&self) {
        self.service_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls_issued: self.calls_issued.load(Ordering::Relaxed),
            calls_failed: self.calls_failed.load(Ordering::Relaxed),
            chunks_fetched: self.chunks_fetched.load(Ordering::Relaxed),
            payload_bytes: self.payload_bytes.load(Ordering::Relaxed),
            tunnel_collapses: self.tunnel_collapses.load(Ordering::Relaxed),
            service_unavailable: self.service_unavailable.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub calls_issued: u64,
    pub calls_failed: u64,
    pub chunks_fetched: u64,
    pub payload_bytes: u64,
    pub tunnel_collapses: u64,
    pub service_unavailable: u64,
}

impl MetricsSnapshot {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_at_zero() {
        let metrics = MetricsRegistry::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_metrics_increment() {
        let metrics = MetricsRegistry::new();
        metrics.increment_calls_issued();
        metrics.increment_calls_issued();
        metrics.increment_chunks_fetched();
        metrics.add_payload_bytes(4096);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.calls_issued, 2);
        assert_eq!(snapshot.chunks_fetched, 1);
        assert_eq!(snapshot.payload_bytes, 4096);
    }

    #[test]
    fn test_snapshot_json() {
        let metrics = MetricsRegistry::new();
        metrics.increment_tunnel_collapses();
        let parsed: serde_json::Value =
            serde_json::from_str(&metrics.snapshot().to_json()).unwrap();
        assert_eq!(parsed["tunnel_collapses"], 1);
    }
}
