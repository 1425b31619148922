use sha2::{Digest, Sha256};

use crate::TransferError;
use crate::types::Chunk;

// ---------------------------------------------------------------------------
// Checksum helpers
// ---------------------------------------------------------------------------

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Chunker
// ---------------------------------------------------------------------------

/// Splits a byte buffer into fixed-size, densely indexed chunks.
///
/// Splitting is pure: calling [`split`](Self::split) again on the same bytes
/// yields the same sequence, which is how a transfer is restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
}

impl Chunker {
    /// Creates a chunker. A zero `chunk_size` is rejected.
    pub fn new(chunk_size: usize) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::InvalidConfig(
                "chunk size must be positive".into(),
            ));
        }
        Ok(Self { chunk_size })
    }

    /// Payload size of every chunk but the last.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns `ceil(len / chunk_size)`; zero for an empty file.
    pub fn total_chunks(&self, len: usize) -> Result<u32, TransferError> {
        u32::try_from(len.div_ceil(self.chunk_size)).map_err(|_| {
            TransferError::InvalidConfig(format!(
                "{len} bytes need more than {} chunks of {} bytes",
                u32::MAX,
                self.chunk_size
            ))
        })
    }

    /// Splits `data` into chunks in ascending index order.
    pub fn split<'a>(&self, data: &'a [u8]) -> Result<Chunks<'a>, TransferError> {
        let total = self.total_chunks(data.len())?;
        Ok(Chunks {
            inner: data.chunks(self.chunk_size),
            next_index: 0,
            total,
        })
    }
}

/// Iterator over the chunks of one file.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    inner: std::slice::Chunks<'a, u8>,
    next_index: u32,
    total: u32,
}

impl Chunks<'_> {
    /// Total chunk count of the file, independent of iteration progress.
    pub fn total(&self) -> u32 {
        self.total
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let payload = self.inner.next()?;
        let chunk = Chunk {
            index: self.next_index,
            total: self.total,
            payload,
        };
        self.next_index += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Chunks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn checksum_bytes_deterministic() {
        let c1 = checksum_bytes(b"hello world");
        let c2 = checksum_bytes(b"hello world");
        assert_eq!(c1, c2);
        assert_eq!(c1.len(), 64); // SHA-256 = 64 hex chars.
        assert_ne!(c1, checksum_bytes(b"hello worle"));
    }

    #[test]
    fn zero_chunk_size_rejected() {
        assert!(matches!(
            Chunker::new(0),
            Err(TransferError::InvalidConfig(_))
        ));
    }

    #[test]
    fn forty_thousand_bytes_in_three_chunks() {
        let data = pattern(40_000);
        let chunker = Chunker::new(16_384).unwrap();
        let chunks: Vec<_> = chunker.split(&data).unwrap().collect();

        assert_eq!(chunks.len(), 3);
        let lens: Vec<usize> = chunks.iter().map(|c| c.payload.len()).collect();
        assert_eq!(lens, vec![16_384, 16_384, 7_232]);
        assert!(chunks.iter().all(|c| c.total == 3));
        let indices: Vec<u32> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn exact_multiple_has_full_last_chunk() {
        let data = pattern(30);
        let chunks: Vec<_> = Chunker::new(10).unwrap().split(&data).unwrap().collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].payload.len(), 10);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunker = Chunker::new(16).unwrap();
        let mut chunks = chunker.split(&[]).unwrap();
        assert_eq!(chunks.total(), 0);
        assert!(chunks.next().is_none());
    }

    #[test]
    fn single_byte_file() {
        let chunks: Vec<_> = Chunker::new(4096).unwrap().split(b"x").unwrap().collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].payload, b"x");
        assert_eq!(chunks[0].total, 1);
    }

    #[test]
    fn chunk_lengths_follow_formula() {
        for size in [1usize, 3, 7, 64] {
            let chunker = Chunker::new(size).unwrap();
            for len in [1usize, size, size + 1, size * 5 + 2, size * 300 + 1] {
                let data = pattern(len);
                let total = chunker.total_chunks(len).unwrap() as usize;
                assert_eq!(total, len.div_ceil(size));

                let chunks: Vec<_> = chunker.split(&data).unwrap().collect();
                assert_eq!(chunks.len(), total);
                for c in &chunks[..total - 1] {
                    assert_eq!(c.payload.len(), size);
                }
                assert_eq!(
                    chunks[total - 1].payload.len(),
                    len - size * (total - 1)
                );
            }
        }
    }

    #[test]
    fn concatenation_restores_input() {
        let chunker = Chunker::new(7).unwrap();
        for len in [0usize, 1, 6, 7, 8, 700, 2_101] {
            let data = pattern(len);
            let joined: Vec<u8> = chunker
                .split(&data)
                .unwrap()
                .flat_map(|c| c.payload.iter().copied())
                .collect();
            assert_eq!(joined, data);
        }
    }

    #[test]
    fn split_is_restartable() {
        let data = pattern(100);
        let chunker = Chunker::new(9).unwrap();
        let first: Vec<_> = chunker.split(&data).unwrap().collect();
        let second: Vec<_> = chunker.split(&data).unwrap().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn exact_size_iterator() {
        let data = pattern(50);
        let mut chunks = Chunker::new(20).unwrap().split(&data).unwrap();
        assert_eq!(chunks.len(), 3);
        chunks.next();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.total(), 3);
    }
}
