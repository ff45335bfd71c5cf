//! Chunk wire frames
//!
//! Frame layout (all integers little-endian):
//! - Payload Length (u32)
//! - Id (16 bytes)
//! - Has Next (u8): 0 or 1
//! - Next Id (16 bytes, present only when Has Next is 1)
//! - Payload (variable)
//! - Checksum (u32): CRC32 over every preceding byte of the frame
//!
//! Any checksum mismatch is corruption and rejects the frame.

use std::fmt;

use crc32fast::Hasher;

use super::Chunk;
use crate::protocol::{Token, TransportError, TOKEN_SIZE};

const LEN_SIZE: usize = 4;
const FLAG_SIZE: usize = 1;
const CHECKSUM_SIZE: usize = 4;

/// Smallest possible frame: a last chunk with an empty payload
pub const MIN_FRAME_SIZE: usize = LEN_SIZE + TOKEN_SIZE + FLAG_SIZE + CHECKSUM_SIZE;

/// Largest per-frame overhead on top of the payload
pub const MAX_FRAME_OVERHEAD: usize = MIN_FRAME_SIZE + TOKEN_SIZE;

/// Largest payload the 32-bit length field can describe
pub const MAX_FRAME_PAYLOAD: usize = u32::MAX as usize;

/// Wire error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireErrorKind {
    /// Frame ended before a declared field
    Truncated,
    /// Has-next flag was neither 0 nor 1
    InvalidFlag,
    /// Checksum did not match the frame contents
    ChecksumMismatch,
    /// Bytes remained after the checksum
    TrailingBytes,
}

impl WireErrorKind {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            WireErrorKind::Truncated => "AERO_REMOTE_FRAME_TRUNCATED",
            WireErrorKind::InvalidFlag => "AERO_REMOTE_FRAME_INVALID_FLAG",
            WireErrorKind::ChecksumMismatch => "AERO_REMOTE_FRAME_CHECKSUM_MISMATCH",
            WireErrorKind::TrailingBytes => "AERO_REMOTE_FRAME_TRAILING_BYTES",
        }
    }
}

/// Malformed chunk frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireError {
    /// Error kind
    pub kind: WireErrorKind,
    /// Error message
    pub message: String,
}

impl WireError {
    /// Create a new wire error.
    pub fn new(kind: WireErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a truncation error.
    pub fn truncated(message: impl Into<String>) -> Self {
        Self::new(WireErrorKind::Truncated, message)
    }

    /// Create an invalid flag error.
    pub fn invalid_flag(flag: u8) -> Self {
        Self::new(
            WireErrorKind::InvalidFlag,
            format!("has_next flag must be 0 or 1, got {}", flag),
        )
    }

    /// Create a checksum mismatch error.
    pub fn checksum_mismatch(expected: u32, actual: u32) -> Self {
        Self::new(
            WireErrorKind::ChecksumMismatch,
            format!(
                "checksum mismatch: expected {:08x}, computed {:08x}",
                expected, actual
            ),
        )
    }

    /// Create a trailing bytes error.
    pub fn trailing_bytes(count: usize) -> Self {
        Self::new(
            WireErrorKind::TrailingBytes,
            format!("{} unexpected bytes after checksum", count),
        )
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.message)
    }
}

impl std::error::Error for WireError {}

impl From<WireError> for TransportError {
    fn from(err: WireError) -> Self {
        TransportError::internal(err.to_string())
    }
}

/// Result type for frame decoding
pub type WireResult<T> = Result<T, WireError>;

fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Serialize a chunk into one frame.
///
/// # Panics
///
/// Panics if the payload is longer than `MAX_FRAME_PAYLOAD`. Chunk sizes
/// are bounded well below that by `ChunkRegistry` and `RemoteConfig`.
pub fn encode_frame(chunk: &Chunk) -> Vec<u8> {
    let payload_len = u32::try_from(chunk.payload.len())
        .unwrap_or_else(|_| panic!("chunk payload exceeds {} bytes", MAX_FRAME_PAYLOAD));
    let mut frame = Vec::with_capacity(MAX_FRAME_OVERHEAD + chunk.payload.len());

    frame.extend_from_slice(&payload_len.to_le_bytes());
    frame.extend_from_slice(chunk.id.as_bytes());
    match &chunk.next_id {
        Some(next_id) => {
            frame.push(1);
            frame.extend_from_slice(next_id.as_bytes());
        }
        None => frame.push(0),
    }
    frame.extend_from_slice(&chunk.payload);

    let checksum = compute_checksum(&frame);
    frame.extend_from_slice(&checksum.to_le_bytes());
    frame
}

/// Deserialize one frame into a chunk.
///
/// With `verify_checksum` false the checksum field must still be present
/// but its value is ignored.
pub fn decode_frame(frame: &[u8], verify_checksum: bool) -> WireResult<Chunk> {
    let mut cursor = FrameCursor::new(frame);

    let payload_len = u32::from_le_bytes(cursor.array("payload length")?) as usize;
    let id = Token::from_bytes(cursor.array("id")?);
    let next_id = match cursor.array::<FLAG_SIZE>("has_next flag")?[0] {
        0 => None,
        1 => Some(Token::from_bytes(cursor.array("next id")?)),
        flag => return Err(WireError::invalid_flag(flag)),
    };
    let payload = cursor.take(payload_len, "payload")?.to_vec();

    let body_len = cursor.position();
    let expected = u32::from_le_bytes(cursor.array("checksum")?);
    if cursor.remaining() > 0 {
        return Err(WireError::trailing_bytes(cursor.remaining()));
    }

    if verify_checksum {
        let actual = compute_checksum(&frame[..body_len]);
        if actual != expected {
            return Err(WireError::checksum_mismatch(expected, actual));
        }
    }

    Ok(Chunk::new(payload, id, next_id))
}

struct FrameCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FrameCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize, field: &str) -> WireResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(WireError::truncated(format!(
                "frame too short for {}: need {} bytes at offset {}, have {}",
                field,
                len,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, field: &str) -> WireResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }
}
