//! Chunked file transfer between two peers.
//!
//! The sender reads a file once, splits it with a [`Chunker`] and streams the
//! chunks through a [`Transmitter`]. The receiver feeds incoming messages to a
//! [`Reassembler`], which writes each chunk into its slot and hands the
//! finished file to a [`FileSink`] once every slot is filled.

mod chunked;
mod completion;
mod pacing;
mod progress;
mod reassembly;
mod receiver;
mod sender;
mod sink;
mod source;
mod types;
mod validation;

use std::time::Duration;

pub use chunked::{Chunker, Chunks, checksum_bytes};
pub use completion::{CompletedFile, CompletionDetector, FileSummary};
pub use pacing::{FixedDelay, Pacer, Unpaced};
pub use progress::{NoProgress, ProgressCounter, ProgressSink, ThroughputMeter};
pub use reassembly::{ReassemblyBuffer, SlotWrite};
pub use receiver::{ChunkOutcome, Reassembler, Receiver, ReceiverState};
pub use sender::{SendReport, Transmitter};
pub use sink::{DirectorySink, FileSink, MemorySink};
pub use source::{FileSource, guess_file_type};
pub use types::{Chunk, FileMeta};
pub use validation::validate_file_name;

pub use peershare_protocol::constants::{DEFAULT_CHUNK_INTERVAL, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("transfer aborted: {0}")]
    Aborted(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Tunables shared by both sides of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Payload size of every chunk but the last.
    pub chunk_size: usize,
    /// Delay between two chunk sends.
    pub chunk_interval: Duration,
    /// Largest chunk payload the receiver accepts.
    pub max_chunk_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_interval: DEFAULT_CHUNK_INTERVAL,
            max_chunk_size: MAX_CHUNK_SIZE,
        }
    }
}

impl TransferConfig {
    /// Checks that the sizes are usable.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.chunk_size == 0 {
            return Err(TransferError::InvalidConfig("chunk size must be positive".into()));
        }
        if self.chunk_size > self.max_chunk_size {
            return Err(TransferError::InvalidConfig(format!(
                "chunk size {} exceeds maximum {}",
                self.chunk_size, self.max_chunk_size
            )));
        }
        Ok(())
    }

    /// Builds the chunker for this configuration.
    pub fn chunker(&self) -> Result<Chunker, TransferError> {
        self.validate()?;
        Chunker::new(self.chunk_size)
    }

    /// Builds the pacer for this configuration.
    pub fn pacer(&self) -> FixedDelay {
        FixedDelay::new(self.chunk_interval)
    }
}
