//! Server-side registry of chunks awaiting retrieval
//!
//! When a reply is too large for one message, the serving side encodes it
//! into a chain, hands the first chunk back with the reply and parks the
//! rest here until the client pulls them by id. Each parked chunk is
//! served exactly once. A chain is identified by the id of its first chunk;
//! a client that abandons a chain releases whatever is still parked for it.

use std::collections::HashMap;
use std::sync::Mutex;

use super::codec::encode;
use super::wire::MAX_FRAME_PAYLOAD;
use super::Chunk;
use crate::protocol::{Token, TransportError, TransportResult};

#[derive(Debug)]
struct Parked {
    chain_id: Token,
    chunk: Chunk,
}

/// Pending chunks keyed by id
#[derive(Debug)]
pub struct ChunkRegistry {
    max_chunk_size: usize,
    pending: Mutex<HashMap<Token, Parked>>,
}

impl ChunkRegistry {
    /// Create a registry that splits payloads at `max_chunk_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `max_chunk_size` is zero or larger than
    /// `MAX_FRAME_PAYLOAD`.
    pub fn new(max_chunk_size: usize) -> Self {
        assert!(max_chunk_size > 0, "max_chunk_size must be positive");
        assert!(
            max_chunk_size <= MAX_FRAME_PAYLOAD,
            "max_chunk_size must fit a frame length"
        );
        Self {
            max_chunk_size,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Maximum payload bytes per chunk.
    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Encode `payload`, park every chunk after the first, and return the
    /// first chunk.
    pub fn register(&self, payload: &[u8]) -> TransportResult<Chunk> {
        let mut chunks = encode(payload, self.max_chunk_size).into_iter();
        let first = chunks
            .next()
            .ok_or_else(|| TransportError::internal("encoder produced no chunks"))?;

        let mut pending = self
            .pending
            .lock()
            .map_err(|_| TransportError::internal("Lock poisoned"))?;
        let chain_id = first.id;
        pending.extend(chunks.map(|chunk| (chunk.id, Parked { chain_id, chunk })));

        Ok(first)
    }

    /// Remove and return the parked chunk with `id`.
    pub fn take(&self, id: &Token) -> TransportResult<Option<Chunk>> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| TransportError::internal("Lock poisoned"))?;
        Ok(pending.remove(id).map(|parked| parked.chunk))
    }

    /// Drop every chunk still parked for the chain starting at `chain_id`.
    /// Returns how many were dropped.
    pub fn release_chain(&self, chain_id: &Token) -> TransportResult<usize> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| TransportError::internal("Lock poisoned"))?;
        let before = pending.len();
        pending.retain(|_, parked| parked.chain_id != *chain_id);
        Ok(before - pending.len())
    }

    /// Number of chunks still parked.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    /// Drop every parked chunk.
    ///
    /// Used when the serving side loses its client and abandoned chains
    /// would otherwise never be pulled.
    pub fn clear(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.clear();
        }
    }
}
