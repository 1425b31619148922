//! In-process channel backed by tokio mpsc queues.

use peershare_protocol::Message;
use tokio::sync::mpsc;

use crate::error::ChannelError;
use crate::{ChannelReceiver, ChannelSender};

/// Sending half of an in-memory channel.
#[derive(Clone)]
pub struct MemorySender {
    tx: mpsc::Sender<Message>,
}

/// Receiving half of an in-memory channel.
pub struct MemoryReceiver {
    rx: mpsc::Receiver<Message>,
}

/// One side of a bidirectional in-memory channel.
pub struct MemoryEndpoint {
    pub sender: MemorySender,
    pub receiver: MemoryReceiver,
}

/// Creates a one-way channel holding at most `capacity` queued messages.
pub fn channel(capacity: usize) -> (MemorySender, MemoryReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (MemorySender { tx }, MemoryReceiver { rx })
}

/// Creates two connected endpoints.
pub fn pair(capacity: usize) -> (MemoryEndpoint, MemoryEndpoint) {
    let (a_tx, b_rx) = channel(capacity);
    let (b_tx, a_rx) = channel(capacity);
    (
        MemoryEndpoint {
            sender: a_tx,
            receiver: a_rx,
        },
        MemoryEndpoint {
            sender: b_tx,
            receiver: b_rx,
        },
    )
}

impl ChannelSender for MemorySender {
    async fn send(&mut self, msg: Message) -> Result<(), ChannelError> {
        self.tx.send(msg).await.map_err(|_| ChannelError::Closed)
    }
}

impl ChannelReceiver for MemoryReceiver {
    async fn recv(&mut self) -> Option<Result<Message, ChannelError>> {
        self.rx.recv().await.map(Ok)
    }
}
