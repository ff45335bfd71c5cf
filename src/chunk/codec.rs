//! Chunk chain encoding and total decoding

use super::stream::ChunkStream;
use super::Chunk;
use crate::protocol::{Token, TransportResult};

/// Number of chunks `encode` produces for a payload of `len` bytes.
///
/// An empty payload still produces one (empty) chunk so that a present
/// empty value stays distinguishable from an absent one.
pub fn chunk_count(len: usize, max_chunk_size: usize) -> usize {
    assert!(max_chunk_size > 0, "max_chunk_size must be positive");
    if len == 0 {
        1
    } else {
        len.div_ceil(max_chunk_size)
    }
}

/// Split `payload` into a linked chain of chunks of at most
/// `max_chunk_size` bytes each.
///
/// # Panics
///
/// Panics if `max_chunk_size` is zero.
pub fn encode(payload: &[u8], max_chunk_size: usize) -> Vec<Chunk> {
    let count = chunk_count(payload.len(), max_chunk_size);
    let ids: Vec<Token> = (0..count).map(|_| Token::generate()).collect();

    let mut pieces = payload.chunks(max_chunk_size);
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            let bytes = pieces.next().map(<[u8]>::to_vec).unwrap_or_default();
            Chunk::new(bytes, *id, ids.get(i + 1).copied())
        })
        .collect()
}

/// Reassemble a payload from its first chunk, pulling each following chunk
/// through `fetch_next`.
///
/// A failing `fetch_next` fails the whole decode with `ServiceUnavailable`.
/// There is no retry and no iteration cap.
pub fn decode<F>(first: Chunk, fetch_next: F) -> TransportResult<Vec<u8>>
where
    F: FnMut(&Token) -> TransportResult<Chunk>,
{
    let mut payload = Vec::with_capacity(first.len());
    for piece in ChunkStream::new(first, fetch_next) {
        payload.extend_from_slice(&piece?);
    }
    Ok(payload)
}

/// Like `decode`, but an absent first chunk yields `None` without any
/// remote call.
pub fn decode_allow_absent<F>(
    first: Option<Chunk>,
    fetch_next: F,
) -> TransportResult<Option<Vec<u8>>>
where
    F: FnMut(&Token) -> TransportResult<Chunk>,
{
    match first {
        None => Ok(None),
        Some(first) => decode(first, fetch_next).map(Some),
    }
}
