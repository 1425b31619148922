use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Size of a file chunk (16 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Delay between two consecutive chunk sends.
pub const DEFAULT_CHUNK_INTERVAL: Duration = Duration::from_millis(100);

/// Largest chunk payload a receiver accepts (16 MiB).
///
/// Chunk size is a sender-side choice; this bound only protects the
/// receiver from allocating absurd slots for a hostile message.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Content type used when the sender cannot tell what the file is.
pub const FALLBACK_FILE_TYPE: &str = "application/octet-stream";

/// Message type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// One indexed chunk of a file.
    #[serde(rename = "chunk")]
    Chunk,
    /// The sender gave up on the current transfer.
    #[serde(rename = "cancel")]
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&MessageType::Chunk).unwrap(),
            "\"chunk\""
        );
        assert_eq!(
            serde_json::to_string(&MessageType::Cancel).unwrap(),
            "\"cancel\""
        );
        let parsed: MessageType = serde_json::from_str("\"cancel\"").unwrap();
        assert_eq!(parsed, MessageType::Cancel);
    }

    #[test]
    fn unknown_message_type_rejected() {
        assert!(serde_json::from_str::<MessageType>("\"upload_chunk\"").is_err());
        assert!(serde_json::from_str::<MessageType>("\"error\"").is_err());
    }

    #[test]
    fn default_chunk_size_fits_receiver_bound() {
        assert!(DEFAULT_CHUNK_SIZE <= MAX_CHUNK_SIZE);
    }
}
