//! Chunked payload transfer
//!
//! A payload larger than one message is split into a linked chain of
//! bounded-size chunks. The first chunk travels with the reply; each
//! following chunk is pulled by id, strictly in order, because its id is
//! only known once the previous chunk has been read.
//!
//! # Invariants
//!
//! 1. The chain formed by `next_id` is finite and acyclic
//! 2. Only the final chunk has no `next_id`
//! 3. The payload is the concatenation of chunk payloads in chain order

mod codec;
mod registry;
mod stream;
pub mod wire;

pub use codec::{chunk_count, decode, decode_allow_absent, encode};
pub use registry::ChunkRegistry;
pub use stream::ChunkStream;
pub use wire::{
    decode_frame, encode_frame, WireError, WireErrorKind, WireResult, MAX_FRAME_PAYLOAD,
};

use crate::protocol::Token;

/// A bounded-size fragment of a larger payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Payload bytes carried by this fragment
    pub payload: Vec<u8>,
    /// Identity of this fragment
    pub id: Token,
    /// Identity of the following fragment, absent on the last one
    pub next_id: Option<Token>,
}

impl Chunk {
    /// Create a chunk.
    pub fn new(payload: Vec<u8>, id: Token, next_id: Option<Token>) -> Self {
        Self {
            payload,
            id,
            next_id,
        }
    }

    /// Whether another chunk follows this one.
    pub fn has_next(&self) -> bool {
        self.next_id.is_some()
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
