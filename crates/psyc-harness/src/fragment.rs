//! Deterministic stream fragmentation.
//!
//! Networks deliver streams in arbitrary chunks. A [`Fragmenter`] reproduces
//! that from a seed, so a failing split is replayed by rerunning the seed.

use rand::{Rng as _, SeedableRng as _};
use rand_chacha::ChaCha8Rng;

/// Splits byte streams into random chunks.
#[derive(Debug, Clone)]
pub struct Fragmenter {
    rng: ChaCha8Rng,
    max_chunk: usize,
}

impl Fragmenter {
    /// Create a fragmenter producing chunks of 1 to `max_chunk` bytes.
    ///
    /// A `max_chunk` of zero is treated as one.
    pub fn new(seed: u64, max_chunk: usize) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), max_chunk: max_chunk.max(1) }
    }

    /// Split `stream` into consecutive non-empty chunks covering all of it.
    pub fn split<'s>(&mut self, stream: &'s [u8]) -> Vec<&'s [u8]> {
        let mut chunks = Vec::new();
        let mut rest = stream;
        while !rest.is_empty() {
            let len = self.rng.gen_range(1..=self.max_chunk).min(rest.len());
            let (chunk, tail) = rest.split_at(len);
            chunks.push(chunk);
            rest = tail;
        }
        chunks
    }
}
