//! Transport exception tunnel
//!
//! The call channel carries exactly one generic failure signal with a
//! message string. Typed errors ride inside that message as
//!
//! ```text
//! aeroremote.transport|<ErrorKind>: <detail>
//! ```
//!
//! The marker proves the message came from this protocol rather than from
//! the platform (a crashed peer, a dropped connection).
//!
//! # Decode rules
//!
//! 1. Not a generic failure, or no message → `ServiceUnavailable`
//! 2. Message without `marker|` prefix → `ServiceUnavailable`
//! 3. Kind name outside the call site's policy → `Internal`
//! 4. Otherwise the typed error is reconstructed as sent

mod policy;

pub use policy::CallPolicy;

use crate::channel::ChannelFailure;
use crate::protocol::{ErrorKind, TransportError};

/// Prefix identifying messages produced by `encode`
pub const NAMESPACE_MARKER: &str = "aeroremote.transport";

const SEPARATOR: char = '|';

/// Build the wire message for a typed error.
///
/// Line breaks in the detail are flattened to spaces so the message stays
/// on one line.
pub fn encode_message(err: &TransportError) -> String {
    let detail: String = err
        .message
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!(
        "{}{}{}: {}",
        NAMESPACE_MARKER,
        SEPARATOR,
        err.kind.name(),
        detail
    )
}

/// Wrap a typed error in the generic failure signal.
pub fn encode(err: &TransportError) -> ChannelFailure {
    ChannelFailure::generic(encode_message(err))
}

/// Decode a channel failure under `policy`.
pub fn decode(failure: &ChannelFailure, policy: &CallPolicy) -> TransportError {
    match failure {
        ChannelFailure::Generic { message } => decode_message(message.as_deref(), policy),
        ChannelFailure::Platform { description } => TransportError::service_unavailable(
            format!("channel failure: {}", description),
        ),
    }
}

/// Decode a generic failure message under `policy`.
pub fn decode_message(message: Option<&str>, policy: &CallPolicy) -> TransportError {
    let message = match message {
        Some(message) => message,
        None => {
            return TransportError::service_unavailable("generic failure without a message");
        }
    };

    let body = match message
        .strip_prefix(NAMESPACE_MARKER)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
    {
        Some(body) => body,
        None => {
            return TransportError::service_unavailable(format!(
                "unrecognized remote failure: {}",
                message
            ));
        }
    };

    let (kind_name, detail) = match body.split_once(':') {
        Some((kind_name, detail)) => (kind_name, detail.strip_prefix(' ').unwrap_or(detail)),
        None => {
            return TransportError::internal(format!("malformed remote failure: {}", message));
        }
    };

    match ErrorKind::from_name(kind_name) {
        Some(kind) if policy.allows(kind) => TransportError::new(kind, detail),
        _ => TransportError::internal(format!(
            "{} not permitted under {} policy: {}",
            kind_name, policy, detail
        )),
    }
}
