//! Call channel abstraction
//!
//! The channel is a synchronous request/response primitive with two
//! constraints: a single message is bounded in size, and the only failure
//! that crosses the boundary is one generic, untyped signal carrying a
//! message string. Platform-level failures (dead peer, disconnect) arrive
//! as a separate, unrelated failure family.

mod loopback;

pub use loopback::LoopbackChannel;

use std::fmt;

use serde_json::Value;

use crate::protocol::PayloadTag;

/// Successful channel reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Operation completed with no value
    Unit,
    /// Value present; `first` is the encoded frame of the first chunk
    Chunked {
        /// Payload type
        tag: PayloadTag,
        /// First chunk frame
        first: Vec<u8>,
    },
    /// Nullable operation returned no value
    Absent(PayloadTag),
    /// Answer to a chunk fetch: one encoded frame
    Fragment(Vec<u8>),
}

impl Reply {
    /// Short name for logging
    pub fn shape(&self) -> &'static str {
        match self {
            Reply::Unit => "unit",
            Reply::Chunked { .. } => "chunked",
            Reply::Absent(_) => "absent",
            Reply::Fragment(_) => "fragment",
        }
    }
}

/// Failure raised by the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelFailure {
    /// The one generic failure that crosses the boundary
    Generic {
        /// Failure message, possibly absent
        message: Option<String>,
    },
    /// Failure of the channel itself, unrelated to the protocol
    Platform {
        /// Raw description of the failure
        description: String,
    },
}

impl ChannelFailure {
    /// Create a generic failure with a message.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: Some(message.into()),
        }
    }

    /// Create a platform failure.
    pub fn platform(description: impl Into<String>) -> Self {
        Self::Platform {
            description: description.into(),
        }
    }
}

impl fmt::Display for ChannelFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic { message: Some(m) } => write!(f, "generic failure: {}", m),
            Self::Generic { message: None } => write!(f, "generic failure (no message)"),
            Self::Platform { description } => write!(f, "platform failure: {}", description),
        }
    }
}

/// Synchronous request/response primitive
///
/// Calls block the invoking thread until the peer answers or the channel
/// itself fails.
pub trait Channel: Send + Sync {
    /// Invoke `method` with JSON `args`.
    fn invoke(&self, method: &str, args: &Value) -> Result<Reply, ChannelFailure>;
}
