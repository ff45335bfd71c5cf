//! Observable protocol events
//!
//! Events are explicit and typed; each carries its own severity.

use std::fmt;

use super::logger::Severity;

/// Observable events of the remote access layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Session lifecycle
    /// Client session created
    SessionOpen,
    /// Client session dropped
    SessionClose,
    /// Configuration loaded
    ConfigLoaded,

    // Remote calls
    /// Remote call issued
    RemoteCallStart,
    /// Remote call returned a value
    RemoteCallComplete,
    /// Remote call returned a typed error
    RemoteCallFailed,
    /// Remote handle is unusable, caller must reconnect
    RemoteUnavailable,

    // Chunk transfer
    /// Next chunk pulled by id
    ChunkFetch,
    /// Chunk chain fully reassembled
    ChunkChainComplete,
    /// Chunk frame rejected
    ChunkFrameRejected,

    // Exception tunnel
    /// Tunneled kind outside the call site's policy collapsed to Internal
    TunnelCollapsed,

    // Metadata cache
    /// Cache line populated by an unconditional fetch
    MetadataCacheMiss,
    /// Cache line replaced after a revision change
    MetadataCacheRefresh,

    // Serving side
    /// Loopback dispatched a method
    LoopbackDispatch,
    /// Loopback peer disconnected
    LoopbackDisconnected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SessionOpen => "SESSION_OPEN",
            Event::SessionClose => "SESSION_CLOSE",
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::RemoteCallStart => "REMOTE_CALL_START",
            Event::RemoteCallComplete => "REMOTE_CALL_COMPLETE",
            Event::RemoteCallFailed => "REMOTE_CALL_FAILED",
            Event::RemoteUnavailable => "REMOTE_UNAVAILABLE",

            Event::ChunkFetch => "CHUNK_FETCH",
            Event::ChunkChainComplete => "CHUNK_CHAIN_COMPLETE",
            Event::ChunkFrameRejected => "CHUNK_FRAME_REJECTED",

            Event::TunnelCollapsed => "TUNNEL_DECODE_COLLAPSED",

            Event::MetadataCacheMiss => "METADATA_CACHE_MISS",
            Event::MetadataCacheRefresh => "METADATA_CACHE_REFRESH",

            Event::LoopbackDispatch => "LOOPBACK_DISPATCH",
            Event::LoopbackDisconnected => "LOOPBACK_DISCONNECTED",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::RemoteCallStart
            | Event::RemoteCallComplete
            | Event::ChunkFetch
            | Event::ChunkChainComplete
            | Event::LoopbackDispatch => Severity::Trace,

            Event::SessionOpen
            | Event::SessionClose
            | Event::ConfigLoaded
            | Event::MetadataCacheMiss
            | Event::MetadataCacheRefresh => Severity::Info,

            Event::RemoteCallFailed | Event::TunnelCollapsed | Event::LoopbackDisconnected => {
                Severity::Warn
            }

            Event::RemoteUnavailable | Event::ChunkFrameRejected => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
