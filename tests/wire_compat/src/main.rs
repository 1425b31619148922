fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use peershare_protocol::{
        CancelTransfer, ChunkMessage, Message, MessageType, TransferProgress, TransferStatus,
    };

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (key order independent).
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  ours:    {reserialized}"
        );
        parsed
    }

    /// Envelopes hold a raw payload, so they must be parsed from text.
    fn envelope_roundtrip(name: &str) -> Message {
        let text = read_fixture(name);
        let msg = Message::from_bytes(text.as_bytes())
            .unwrap_or_else(|e| panic!("failed to decode envelope {name}: {e}"));
        let reserialized: serde_json::Value =
            serde_json::from_slice(&msg.to_bytes().unwrap()).unwrap();
        assert_eq!(load_fixture(name), reserialized, "envelope mismatch for {name}");
        msg
    }

    // --- Payloads ---

    #[test]
    fn fixture_chunk_message() {
        let chunk: ChunkMessage = roundtrip_test("chunk_message.json");
        assert_eq!(chunk.index, 1);
        assert_eq!(chunk.total, 3);
        assert_eq!(chunk.chunk, b"hello world");
    }

    #[test]
    fn fixture_empty_file_announcement() {
        let chunk: ChunkMessage = roundtrip_test("chunk_message_empty_file.json");
        assert!(chunk.is_empty_file());
        assert!(chunk.chunk.is_empty());
    }

    #[test]
    fn fixture_transfer_progress() {
        let progress: TransferProgress = roundtrip_test("transfer_progress.json");
        assert_eq!(progress.status, TransferStatus::InProgress);
        assert!((progress.percentage() - 66.67).abs() < 0.01);
    }

    // --- Envelopes ---

    #[test]
    fn fixture_chunk_envelope() {
        let msg = envelope_roundtrip("chunk_envelope.json");
        assert_eq!(msg.msg_type, MessageType::Chunk);
        let chunk: ChunkMessage = msg.parse_payload().unwrap().unwrap();
        assert_eq!(chunk.file_name, "notes.txt");
        assert_eq!(chunk.chunk, b"Hi");
    }

    #[test]
    fn fixture_cancel_envelope() {
        let msg = envelope_roundtrip("cancel_envelope.json");
        assert_eq!(msg.msg_type, MessageType::Cancel);
        let cancel: CancelTransfer = msg.parse_payload().unwrap().unwrap();
        assert_eq!(cancel.reason, "cancelled by sender");
    }

    #[test]
    fn constructors_match_fixtures() {
        let cancel = Message::cancel("cancelled by sender").unwrap();
        let encoded: serde_json::Value = serde_json::from_slice(&cancel.to_bytes().unwrap()).unwrap();
        assert_eq!(encoded, load_fixture("cancel_envelope.json"));
    }
}
