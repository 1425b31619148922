//! Error types for the channel.

/// Errors produced by a channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("channel closed")]
    Closed,

    #[error("connection timed out")]
    Timeout,

    #[error("cancelled")]
    Cancelled,

    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("malformed message: {0}")]
    Codec(#[from] serde_json::Error),
}

impl ChannelError {
    /// Returns `true` when only the current message is lost.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ChannelError::Codec(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_codec_errors_are_recoverable() {
        let codec = serde_json::from_str::<u32>("x").unwrap_err();
        assert!(ChannelError::Codec(codec).is_recoverable());
        assert!(!ChannelError::Closed.is_recoverable());
        assert!(!ChannelError::FrameTooLarge(1).is_recoverable());
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert!(!ChannelError::Io(io).is_recoverable());
    }
}
