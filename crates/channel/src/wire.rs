//! TCP framing for channel messages.
//!
//! # Wire format
//!
//! ```text
//! PER MESSAGE:
//!   [4 bytes BE: frame_len]
//!   [frame_len bytes: message JSON, UTF-8]
//! ```
//!
//! A clean end of stream between two frames closes the channel. A frame
//! whose JSON does not decode is reported as a recoverable
//! [`ChannelError::Codec`]; the stream stays aligned on the next frame.

use std::io::ErrorKind;

use peershare_protocol::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::MAX_FRAME_SIZE;
use crate::error::ChannelError;

/// Writes one message frame. Does not flush.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    msg: &Message,
) -> Result<(), ChannelError> {
    let bytes = msg.to_bytes()?;
    if bytes.len() > MAX_FRAME_SIZE {
        return Err(ChannelError::FrameTooLarge(bytes.len()));
    }

    writer.write_u32(bytes.len() as u32).await?;
    writer.write_all(&bytes).await?;
    Ok(())
}

/// Reads one message frame.
///
/// Returns `None` if the stream ended before a new frame started.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Option<Message>, ChannelError> {
    let frame_len = match reader.read_u32().await {
        Ok(n) => n as usize,
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if frame_len > MAX_FRAME_SIZE {
        return Err(ChannelError::FrameTooLarge(frame_len));
    }

    let mut buf = vec![0u8; frame_len];
    reader.read_exact(&mut buf).await?;
    Ok(Some(Message::from_bytes(&buf)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use peershare_protocol::{ChunkMessage, MessageType};

    fn chunk(index: u32) -> Message {
        Message::chunk(&ChunkMessage {
            index,
            total: 2,
            file_name: "photo.jpg".into(),
            file_type: "image/jpeg".into(),
            chunk: vec![index as u8; 8],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn frames_in_sequence_then_eof() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &chunk(0)).await.unwrap();
        write_frame(&mut buf, &chunk(1)).await.unwrap();

        let mut cursor = &buf[..];
        for expected in 0..2u32 {
            let msg = read_frame(&mut cursor).await.unwrap().unwrap();
            assert_eq!(msg.msg_type, MessageType::Chunk);
            let parsed: ChunkMessage = msg.parse_payload().unwrap().unwrap();
            assert_eq!(parsed.index, expected);
        }
        assert!(read_frame(&mut cursor).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn length_prefix_is_big_endian() {
        let msg = Message::cancel("").unwrap();
        let mut buf = Vec::new();
        write_frame(&mut buf, &msg).await.unwrap();

        let body_len = buf.len() - 4;
        assert_eq!(&buf[..4], &(body_len as u32).to_be_bytes());
    }

    #[tokio::test]
    async fn oversized_frame_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&((MAX_FRAME_SIZE + 1) as u32).to_be_bytes());
        let mut cursor = &buf[..];
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ChannelError::FrameTooLarge(_)));
    }

    #[tokio::test]
    async fn malformed_frame_is_recoverable() {
        let mut buf = Vec::new();
        let junk = b"{not json";
        buf.extend_from_slice(&(junk.len() as u32).to_be_bytes());
        buf.extend_from_slice(junk);
        write_frame(&mut buf, &chunk(1)).await.unwrap();

        let mut cursor = &buf[..];
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(err.is_recoverable());

        // The next frame is still readable.
        let msg = read_frame(&mut cursor).await.unwrap().unwrap();
        assert_eq!(msg.msg_type, MessageType::Chunk);
    }

    #[tokio::test]
    async fn truncated_frame_is_io_error() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &chunk(0)).await.unwrap();
        buf.truncate(buf.len() - 3);

        let mut cursor = &buf[..];
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ChannelError::Io(_)));
    }
}
