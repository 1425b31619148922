use serde::{Deserialize, Serialize};

use crate::constants::MessageType;
use crate::messages::{CancelTransfer, ChunkMessage};

/// Envelope for every message exchanged over the channel.

///
/// The `payload` field uses `serde_json::value::RawValue` so the type tag can
/// be inspected before the payload is decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Box<serde_json::value::RawValue>>,
}

impl Message {
    /// Creates a new message with the given type and payload.
    pub fn new<T: Serialize>(
        msg_type: MessageType,
        payload: Option<&T>,
    ) -> Result<Self, serde_json::Error> {
        let raw = match payload {
            Some(p) => {
                let json = serde_json::to_string(p)?;
                Some(serde_json::value::RawValue::from_string(json)?)
            }
            None => None,
        };
        Ok(Self {
            msg_type,
            payload: raw,
        })
    }

    /// Wraps a chunk.
    pub fn chunk(chunk: &ChunkMessage) -> Result<Self, serde_json::Error> {
        Message::new(MessageType::Chunk, Some(chunk))
    }

    /// Creates a cancel notice.
    pub fn cancel(reason: impl Into<String>) -> Result<Self, serde_json::Error> {
        let payload = CancelTransfer {
            reason: reason.into(),
        };
        Message::new(MessageType::Cancel, Some(&payload))
    }

    /// Deserializes the payload into the given type.
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(
        &self,
    ) -> Result<Option<T>, serde_json::Error> {
        match &self.payload {
            Some(raw) => Ok(Some(serde_json::from_str(raw.get())?)),
            None => Ok(None),
        }
    }

    /// Encodes the message as JSON bytes for a framed transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes a message from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
