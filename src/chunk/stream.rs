//! Lazy, single-pass chunk retrieval

use super::Chunk;
use crate::protocol::{Token, TransportError, TransportResult};

/// Iterator over the payload pieces of a chunk chain.
///
/// The next chunk is fetched only when the previous piece has been
/// consumed, so a caller can start processing a large result before the
/// rest of it has been transferred. After the first error the stream is
/// exhausted.
pub struct ChunkStream<F> {
    first: Option<Chunk>,
    next_id: Option<Token>,
    fetch_next: F,
    fetched: u64,
    failed: bool,
}

impl<F> ChunkStream<F>
where
    F: FnMut(&Token) -> TransportResult<Chunk>,
{
    /// Create a stream starting at `first`.
    pub fn new(first: Chunk, fetch_next: F) -> Self {
        Self {
            first: Some(first),
            next_id: None,
            fetch_next,
            fetched: 0,
            failed: false,
        }
    }

    /// Number of chunks pulled through `fetch_next` so far.
    pub fn fetched(&self) -> u64 {
        self.fetched
    }

    fn pull(&mut self, id: Token) -> TransportResult<Chunk> {
        let chunk = (self.fetch_next)(&id).map_err(|e| {
            TransportError::service_unavailable(format!(
                "failed to fetch chunk {}: {}",
                id, e.message
            ))
        })?;
        self.fetched += 1;

        if chunk.id != id {
            return Err(TransportError::internal(format!(
                "chunk chain broken: requested {}, received {}",
                id, chunk.id
            )));
        }
        Ok(chunk)
    }
}

impl<F> Iterator for ChunkStream<F>
where
    F: FnMut(&Token) -> TransportResult<Chunk>,
{
    type Item = TransportResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if let Some(first) = self.first.take() {
            self.next_id = first.next_id;
            return Some(Ok(first.payload));
        }

        let id = self.next_id.take()?;
        match self.pull(id) {
            Ok(chunk) => {
                self.next_id = chunk.next_id;
                Some(Ok(chunk.payload))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
