use serde::{Deserialize, Serialize};

/// One indexed chunk of a file, as sent over the channel.
///
/// The `chunk` field is base64-encoded in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMessage {
    /// 0-based position of this chunk.
    pub index: u32,
    /// Total chunk count for the transfer.
    pub total: u32,
    /// Original file name, used for output naming.
    pub file_name: String,
    /// Advisory content type.
    #[serde(default)]
    pub file_type: String,
    /// Raw payload.
    #[serde(with = "base64_bytes")]
    pub chunk: Vec<u8>,
}

impl ChunkMessage {
    /// Returns `true` for the announcement of a zero-length file.
    pub fn is_empty_file(&self) -> bool {
        self.total == 0
    }
}

/// Tells the receiver to drop the current transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelTransfer {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
