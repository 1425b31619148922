//! Receiving side: chunk reassembly and the receive loop.

use peershare_channel::ChannelReceiver;
use peershare_protocol::{
    CancelTransfer, ChunkMessage, Message, MessageType, TransferProgress, TransferStatus,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::TransferError;
use crate::completion::{CompletedFile, CompletionDetector, FileSummary};
use crate::progress::{ProgressSink, percentage};
use crate::reassembly::{ReassemblyBuffer, SlotWrite};
use crate::sink::FileSink;
use crate::types::FileMeta;

/// Where the current transfer stands on the receiving side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    AwaitingFirstChunk,
    Receiving,
    Complete,
}

/// What [`Reassembler::accept`] did with a chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    /// Stored; the transfer is still incomplete.
    Accepted { index: u32, progress: f64 },
    /// The slot was already filled. Nothing changed.
    Duplicate { index: u32 },
    /// The transfer already completed. Nothing changed.
    Late { index: u32 },
    /// Stored, and it was the last missing chunk.
    Completed(CompletedFile),
}

struct ActiveTransfer {
    meta: FileMeta,
    buffer: ReassemblyBuffer,
    completion: CompletionDetector,
}

/// Places incoming chunks into their slots and detects completion.
///
/// One reassembler follows one transfer at a time. A chunk announcing a
/// different `total` starts a new transfer and drops the old buffer.
pub struct Reassembler {
    state: ReceiverState,
    current: Option<ActiveTransfer>,
    max_chunk_size: usize,
}

impl Reassembler {
    /// Creates a reassembler rejecting payloads above `max_chunk_size`.
    pub fn new(max_chunk_size: usize) -> Self {
        Self {
            state: ReceiverState::AwaitingFirstChunk,
            current: None,
            max_chunk_size,
        }
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Receive progress of the current transfer, if there is one.
    pub fn progress(&self) -> Option<f64> {
        self.snapshot().map(|s| s.percentage())
    }

    /// Snapshot of the current transfer.
    pub fn snapshot(&self) -> Option<TransferProgress> {
        let t = self.current.as_ref()?;
        let status = match self.state {
            ReceiverState::Complete => TransferStatus::Completed,
            _ => TransferStatus::InProgress,
        };
        Some(TransferProgress {
            file_name: t.meta.file_name.clone(),
            status,
            total_chunks: t.buffer.total(),
            done_chunks: t.buffer.filled(),
        })
    }

    /// Drops the current transfer, if any, and waits for a new one.
    ///
    /// Returns `true` if an unfinished transfer was discarded.
    pub fn reset(&mut self) -> bool {
        let discarded = self.state == ReceiverState::Receiving;
        if let Some(t) = self.current.as_ref().filter(|_| discarded) {
            info!(
                file = %t.meta.file_name,
                filled = t.buffer.filled(),
                total = t.buffer.total(),
                "discarding unfinished transfer"
            );
        }
        self.current = None;
        self.state = ReceiverState::AwaitingFirstChunk;
        discarded
    }

    /// Handles one chunk message.
    ///
    /// An invalid message yields [`TransferError::Protocol`] and leaves all
    /// state untouched.
    pub fn accept(&mut self, msg: ChunkMessage) -> Result<ChunkOutcome, TransferError> {
        if msg.chunk.len() > self.max_chunk_size {
            return Err(TransferError::Protocol(format!(
                "chunk {} carries {} bytes, limit is {}",
                msg.index,
                msg.chunk.len(),
                self.max_chunk_size
            )));
        }
        if msg.is_empty_file() {
            if msg.index != 0 || !msg.chunk.is_empty() {
                return Err(TransferError::Protocol(format!(
                    "empty-file announcement with index {} and {} bytes",
                    msg.index,
                    msg.chunk.len()
                )));
            }
        } else if msg.index >= msg.total {
            return Err(TransferError::Protocol(format!(
                "chunk index {} out of range for {} chunks",
                msg.index, msg.total
            )));
        }

        let starts_new = match &self.current {
            None => true,
            Some(t) if t.buffer.total() != msg.total => true,
            Some(_) if self.state == ReceiverState::Complete && !self.current_matches(&msg) => true,
            Some(t) if !t.meta.matches(&msg) => {
                return Err(TransferError::Protocol(format!(
                    "file changed from {:?} to {:?} without a new chunk count",
                    t.meta.file_name, msg.file_name
                )));
            }
            Some(_) => false,
        };
        if starts_new {
            self.begin(&msg);
        } else if self.state == ReceiverState::Complete {
            debug!(index = msg.index, "late chunk after completion ignored");
            return Ok(ChunkOutcome::Late { index: msg.index });
        }

        let ChunkMessage { index, chunk, .. } = msg;
        let Some(t) = self.current.as_mut() else {
            return Err(TransferError::Protocol("no active transfer".into()));
        };

        // A zero-chunk transfer has no slot to write.
        if t.buffer.total() > 0 && t.buffer.insert(index, chunk)? == SlotWrite::Duplicate {
            debug!(index, "duplicate chunk ignored");
            return Ok(ChunkOutcome::Duplicate { index });
        }

        if let Some(file) = t.completion.check(&mut t.buffer, &t.meta) {
            self.state = ReceiverState::Complete;
            return Ok(ChunkOutcome::Completed(file));
        }

        self.state = ReceiverState::Receiving;
        let progress = percentage(t.buffer.filled(), t.buffer.total());
        debug!(
            index,
            filled = t.buffer.filled(),
            total = t.buffer.total(),
            held_bytes = t.buffer.bytes(),
            "chunk stored"
        );
        Ok(ChunkOutcome::Accepted { index, progress })
    }

    fn current_matches(&self, msg: &ChunkMessage) -> bool {
        self.current.as_ref().is_some_and(|t| t.meta.matches(msg))
    }

    fn begin(&mut self, msg: &ChunkMessage) {
        if self.reset() {
            info!(file = %msg.file_name, total = msg.total, "new transfer replaces unfinished one");
        } else {
            info!(file = %msg.file_name, total = msg.total, "receiving file");
        }
        self.current = Some(ActiveTransfer {
            meta: FileMeta::new(msg.file_name.clone(), msg.file_type.clone()),
            buffer: ReassemblyBuffer::new(msg.total),
            completion: CompletionDetector::new(),
        });
    }
}

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// Drives a [`Reassembler`] from channel messages and delivers the result.
pub struct Receiver<S> {
    reassembler: Reassembler,
    sink: S,
}

impl<S: FileSink> Receiver<S> {
    pub fn new(max_chunk_size: usize, sink: S) -> Self {
        Self {
            reassembler: Reassembler::new(max_chunk_size),
            sink,
        }
    }

    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// Receives one file.
    ///
    /// Runs until a transfer completes and its file is delivered to the sink.
    /// Malformed or out-of-range messages are logged and dropped. Channel
    /// close, a peer `cancel` or `cancel` being triggered abort the transfer
    /// and discard its partial buffer.
    pub async fn receive<C: ChannelReceiver>(
        &mut self,
        channel: &mut C,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<FileSummary, TransferError> {
        self.next_file(channel, progress, cancel)
            .await?
            .ok_or_else(|| TransferError::Aborted("channel closed".into()))
    }

    /// Receives files until the peer closes the channel between two files.
    ///
    /// A close in the middle of a transfer is still an abort.
    pub async fn receive_all<C: ChannelReceiver>(
        &mut self,
        channel: &mut C,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Vec<FileSummary>, TransferError> {
        let mut files = Vec::new();
        loop {
            match self.next_file(channel, progress, cancel).await {
                Ok(Some(summary)) => files.push(summary),
                Ok(None) => return Ok(files),
                Err(e) => {
                    if !files.is_empty() {
                        let names: Vec<&str> =
                            files.iter().map(|f| f.file_name.as_str()).collect();
                        warn!(
                            delivered = files.len(),
                            ?names,
                            error = %e,
                            "receive stopped after delivering files"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Runs until one file is delivered, or `None` if the channel closes
    /// while no transfer is in progress.
    async fn next_file<C: ChannelReceiver>(
        &mut self,
        channel: &mut C,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Option<FileSummary>, TransferError> {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.reassembler.reset();
                    return Err(TransferError::Aborted("cancelled".into()));
                }
                next = channel.recv() => next,
            };

            let msg = match next {
                Some(Ok(msg)) => msg,
                Some(Err(e)) if e.is_recoverable() => {
                    warn!(error = %e, "dropping malformed message");
                    continue;
                }
                Some(Err(e)) => {
                    self.reassembler.reset();
                    return Err(TransferError::Aborted(format!("channel error: {e}")));
                }
                None if self.reassembler.state() != ReceiverState::Receiving => {
                    debug!("channel closed between files");
                    return Ok(None);
                }
                None => {
                    self.reassembler.reset();
                    return Err(TransferError::Aborted(
                        "channel closed mid-transfer".into(),
                    ));
                }
            };

            if let Some(file) = self.handle(msg, progress)? {
                let summary = file.summary();
                self.sink.deliver(file).await?;
                return Ok(Some(summary));
            }
        }
    }

    /// Applies one message; returns the file when it completes a transfer.
    fn handle(
        &mut self,
        msg: Message,
        progress: &dyn ProgressSink,
    ) -> Result<Option<CompletedFile>, TransferError> {
        match msg.msg_type {
            MessageType::Chunk => {
                let chunk = match msg.parse_payload::<ChunkMessage>() {
                    Ok(Some(chunk)) => chunk,
                    Ok(None) => {
                        warn!("chunk message without payload dropped");
                        return Ok(None);
                    }
                    Err(e) => {
                        warn!(error = %e, "undecodable chunk dropped");
                        return Ok(None);
                    }
                };
                match self.reassembler.accept(chunk) {
                    Ok(ChunkOutcome::Accepted { progress: p, .. }) => progress.report(p),
                    Ok(ChunkOutcome::Duplicate { .. } | ChunkOutcome::Late { .. }) => {}
                    Ok(ChunkOutcome::Completed(file)) => {
                        progress.report(100.0);
                        return Ok(Some(file));
                    }
                    Err(e) => warn!(error = %e, "chunk rejected"),
                }
                Ok(None)
            }
            MessageType::Cancel => {
                let reason = msg
                    .parse_payload::<CancelTransfer>()
                    .ok()
                    .flatten()
                    .map(|c| c.reason)
                    .unwrap_or_default();
                info!(%reason, "peer cancelled the transfer");
                self.reassembler.reset();
                Err(TransferError::Aborted(format!("peer cancelled: {reason}")))
            }
        }
    }
}
