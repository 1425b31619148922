//! Message channel between the two peers of a transfer.
//!
//! The transfer core only needs two things from a channel: a way to send one
//! [`Message`] and a way to await the next one. Both halves are traits so the
//! core runs unchanged over the in-memory [`memory`] channel (tests, same
//! process) and the framed [`tcp`] channel.
//!
//! # Wire format
//!
//! See [`wire`] for the TCP framing.

pub mod error;
pub mod memory;
pub mod tcp;
pub mod wire;

pub use error::ChannelError;

use std::future::Future;
use std::time::Duration;

use peershare_protocol::Message;

/// Largest frame accepted on a TCP channel (32 MiB).
pub const MAX_FRAME_SIZE: usize = 32 * 1024 * 1024;

/// TCP read/write buffer size (256 KB).
pub const TCP_BUFFER_SIZE: usize = 256 * 1024;

/// Timeout for the TCP connection attempt.
pub const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sending half of a channel.
pub trait ChannelSender: Send {
    /// Sends one message.
    ///
    /// Fails with [`ChannelError::Closed`] once the peer has gone away.
    fn send(&mut self, msg: Message) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// Receiving half of a channel.
pub trait ChannelReceiver: Send {
    /// Waits for the next message.
    ///
    /// Returns `None` when the channel is closed. An `Err` whose
    /// [`is_recoverable`](ChannelError::is_recoverable) is `true` concerns a
    /// single message; the channel itself is still usable.
    fn recv(&mut self) -> impl Future<Output = Option<Result<Message, ChannelError>>> + Send;
}
