//! TCP channel: one connection, length-prefixed JSON frames.
//!
//! Either peer may dial; once the stream exists both sides are symmetric.

use std::net::SocketAddr;

use peershare_protocol::Message;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ChannelError;
use crate::wire::{read_frame, write_frame};
use crate::{ChannelReceiver, ChannelSender, TCP_BUFFER_SIZE, TCP_CONNECT_TIMEOUT};

/// Sending half of a TCP channel.
pub struct TcpSender {
    writer: BufWriter<OwnedWriteHalf>,
}

/// Receiving half of a TCP channel.
pub struct TcpReceiver {
    reader: BufReader<OwnedReadHalf>,
}

/// Connects to a listening peer.
pub async fn connect(
    addr: SocketAddr,
    cancel: &CancellationToken,
) -> Result<(TcpSender, TcpReceiver), ChannelError> {
    let stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            return Err(ChannelError::Cancelled);
        }
        result = tokio::time::timeout(TCP_CONNECT_TIMEOUT, TcpStream::connect(addr)) => {
            match result {
                Ok(Ok(s)) => {
                    info!(%addr, "channel connected");
                    s
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(ChannelError::Timeout),
            }
        }
    };

    from_stream(stream)
}

/// Accepts a single peer on `listener`.
pub async fn accept(
    listener: &TcpListener,
    cancel: &CancellationToken,
) -> Result<(TcpSender, TcpReceiver, SocketAddr), ChannelError> {
    let (stream, addr) = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            return Err(ChannelError::Cancelled);
        }
        result = listener.accept() => result?,
    };
    info!(%addr, "channel accepted");

    let (tx, rx) = from_stream(stream)?;
    Ok((tx, rx, addr))
}

/// Splits an established stream into channel halves.
pub fn from_stream(stream: TcpStream) -> Result<(TcpSender, TcpReceiver), ChannelError> {
    stream.set_nodelay(true)?;
    let (reader, writer) = stream.into_split();
    Ok((
        TcpSender {
            writer: BufWriter::with_capacity(TCP_BUFFER_SIZE, writer),
        },
        TcpReceiver {
            reader: BufReader::with_capacity(TCP_BUFFER_SIZE, reader),
        },
    ))
}

impl TcpSender {
    /// Flushes and shuts down the write side; the peer sees end of stream.
    pub async fn shutdown(mut self) -> Result<(), ChannelError> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        debug!("channel write side shut down");
        Ok(())
    }
}

impl ChannelSender for TcpSender {
    async fn send(&mut self, msg: Message) -> Result<(), ChannelError> {
        write_frame(&mut self.writer, &msg).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

impl ChannelReceiver for TcpReceiver {
    async fn recv(&mut self) -> Option<Result<Message, ChannelError>> {
        match read_frame(&mut self.reader).await {
            Ok(Some(msg)) => Some(Ok(msg)),
            Ok(None) => {
                debug!("channel stream ended");
                None
            }
            Err(e) => Some(Err(e)),
        }
    }
}
