//! Sending side: paced chunk transmission.

use std::time::Duration;

use peershare_channel::ChannelSender;
use peershare_protocol::{ChunkMessage, Message};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::TransferError;
use crate::chunked::Chunker;
use crate::pacing::Pacer;
use crate::progress::{ProgressCounter, ProgressSink, ThroughputMeter};
use crate::source::FileSource;

/// How long a best-effort cancel notice may wait for channel capacity.
const CANCEL_NOTICE_TIMEOUT: Duration = Duration::from_secs(1);

/// What a finished send did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    pub total_chunks: u32,
    pub bytes: u64,
    pub elapsed: Duration,
}

/// Streams a file's chunks to a peer in ascending index order.
///
/// Chunks are fire-and-forget: there is no acknowledgement and nothing is
/// retransmitted. The pacer runs between two chunks, never before the first.
pub struct Transmitter<P> {
    chunker: Chunker,
    pacer: P,
    name: String,
}

impl<P: Pacer> Transmitter<P> {
    pub fn new(chunker: Chunker, pacer: P) -> Self {
        Self {
            chunker,
            pacer,
            name: "sender".into(),
        }
    }

    /// Sets the peer name carried in cancel notices.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sends every chunk of `source` over `channel`.
    ///
    /// Progress is reported after each chunk is handed to the channel. An
    /// empty file is announced with a single zero-chunk message. A failed
    /// send or `cancel` firing aborts the transfer; on cancel the peer gets a
    /// `cancel` notice if the channel still accepts it. A chunk already being
    /// written when `cancel` fires is finished first so the peer never sees
    /// a torn message.
    pub async fn send<C: ChannelSender>(
        &mut self,
        channel: &mut C,
        source: &FileSource,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<SendReport, TransferError> {
        let started = Instant::now();
        let meta = source.meta();
        let chunks = self.chunker.split(source.bytes())?;
        let total = chunks.total();
        info!(
            file = %meta.file_name,
            size = source.len(),
            chunks = total,
            chunk_size = self.chunker.chunk_size(),
            "sending file"
        );

        if cancel.is_cancelled() {
            return Err(abort(channel, &self.name, 0, total).await);
        }

        if total == 0 {
            let announcement = ChunkMessage {
                index: 0,
                total: 0,
                file_name: meta.file_name.clone(),
                file_type: meta.file_type.clone(),
                chunk: Vec::new(),
            };
            transmit(channel, &announcement, cancel).await?;
            progress.report(100.0);
            return Ok(SendReport {
                total_chunks: 0,
                bytes: 0,
                elapsed: started.elapsed(),
            });
        }

        let mut counter = ProgressCounter::new(total);
        let mut meter = ThroughputMeter::new(None, None);
        let mut sent_bytes: u64 = 0;

        for chunk in chunks {
            if chunk.index > 0 {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Err(abort(channel, &self.name, chunk.index, total).await);
                    }
                    _ = self.pacer.pause() => {}
                }
            }

            let len = chunk.payload.len() as u64;
            transmit(channel, &chunk.to_message(meta), cancel).await?;

            sent_bytes += len;
            meter.add_sample(len);
            let percent = counter.advance();
            progress.report(percent);
            let remaining = source.len() as u64 - sent_bytes;
            debug!(
                index = chunk.index,
                total,
                percent,
                bytes_per_sec = meter.bytes_per_second() as u64,
                eta_ms = meter.eta(remaining).map(|d| d.as_millis() as u64),
                "chunk sent"
            );
        }

        let elapsed = started.elapsed();
        info!(
            file = %meta.file_name,
            chunks = total,
            bytes = sent_bytes,
            elapsed_ms = elapsed.as_millis() as u64,
            "file sent"
        );
        Ok(SendReport {
            total_chunks: total,
            bytes: sent_bytes,
            elapsed,
        })
    }
}

/// Hands one chunk to the channel.
///
/// If `cancel` fires while the send is in flight, the send gets
/// [`CANCEL_NOTICE_TIMEOUT`] to finish so the channel is left on a message
/// boundary. A send still stalled after that is dropped and no notice follows.
async fn transmit<C: ChannelSender>(
    channel: &mut C,
    chunk: &ChunkMessage,
    cancel: &CancellationToken,
) -> Result<(), TransferError> {
    let msg = Message::chunk(chunk)
        .map_err(|e| TransferError::Protocol(format!("cannot encode chunk {}: {e}", chunk.index)))?;

    let send = channel.send(msg);
    tokio::pin!(send);
    let result = tokio::select! {
        biased;
        result = &mut send => result,
        _ = cancel.cancelled() => {
            match tokio::time::timeout(CANCEL_NOTICE_TIMEOUT, &mut send).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(index = chunk.index, "chunk send stalled after cancel, dropped");
                    return Err(TransferError::Aborted(format!(
                        "cancelled while chunk {} was stalled",
                        chunk.index
                    )));
                }
            }
        }
    };
    result.map_err(|e| {
        warn!(index = chunk.index, error = %e, "chunk send failed");
        TransferError::Aborted(format!("send failed at chunk {}: {e}", chunk.index))
    })
}

/// Tells the peer the transfer stopped and builds the resulting error.
async fn abort<C: ChannelSender>(
    channel: &mut C,
    name: &str,
    next_index: u32,
    total: u32,
) -> TransferError {
    info!(next_index, total, "transfer cancelled");
    match Message::cancel(format!("cancelled by {name}")) {
        Ok(msg) => match tokio::time::timeout(CANCEL_NOTICE_TIMEOUT, channel.send(msg)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "cancel notice not delivered"),
            Err(_) => debug!("cancel notice timed out"),
        },
        Err(e) => debug!(error = %e, "cannot encode cancel notice"),
    }
    TransferError::Aborted(format!("cancelled after {next_index} of {total} chunks"))
}
