use tracing::info;

use crate::chunked::checksum_bytes;
use crate::reassembly::ReassemblyBuffer;
use crate::types::FileMeta;

/// A fully reassembled file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedFile {
    pub file_name: String,
    pub file_type: String,
    pub bytes: Vec<u8>,
    /// SHA-256 hex digest of `bytes`.
    pub sha256: String,
}

/// What the receiver reports about a delivered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub file_name: String,
    pub file_type: String,
    pub size: u64,
    pub sha256: String,
}

impl CompletedFile {
    pub fn new(meta: &FileMeta, bytes: Vec<u8>) -> Self {
        let sha256 = checksum_bytes(&bytes);
        Self {
            file_name: meta.file_name.clone(),
            file_type: meta.file_type.clone(),
            bytes,
            sha256,
        }
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            file_name: self.file_name.clone(),
            file_type: self.file_type.clone(),
            size: self.bytes.len() as u64,
            sha256: self.sha256.clone(),
        }
    }
}

/// Fires once per transfer, the first time every slot is filled.
#[derive(Debug, Clone, Default)]
pub struct CompletionDetector {
    fired: bool,
}

impl CompletionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the finished file if `buffer` just became complete.
    pub fn check(&mut self, buffer: &mut ReassemblyBuffer, meta: &FileMeta) -> Option<CompletedFile> {
        if self.fired || !buffer.is_full() {
            return None;
        }
        let bytes = buffer.take_assembled()?;
        self.fired = true;

        let file = CompletedFile::new(meta, bytes);
        info!(
            file = %file.file_name,
            size = file.bytes.len(),
            chunks = buffer.total(),
            sha256 = %file.sha256,
            "transfer complete"
        );
        Some(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> FileMeta {
        FileMeta::new("song.mp3", "audio/mpeg")
    }

    #[test]
    fn fires_exactly_once() {
        let mut buf = ReassemblyBuffer::new(2);
        let mut detector = CompletionDetector::new();

        buf.insert(1, b"world".to_vec()).unwrap();
        assert!(detector.check(&mut buf, &meta()).is_none());

        buf.insert(0, b"hello ".to_vec()).unwrap();
        let file = detector.check(&mut buf, &meta()).unwrap();
        assert_eq!(file.bytes, b"hello world");
        assert_eq!(file.file_name, "song.mp3");
        assert_eq!(file.file_type, "audio/mpeg");
        assert_eq!(file.sha256, checksum_bytes(b"hello world"));
        assert!(detector.fired);

        assert!(detector.check(&mut buf, &meta()).is_none());
    }

    #[test]
    fn empty_transfer_completes_immediately() {
        let mut buf = ReassemblyBuffer::new(0);
        let mut detector = CompletionDetector::new();
        let file = detector.check(&mut buf, &meta()).unwrap();
        assert!(file.bytes.is_empty());
    }

    #[test]
    fn summary_reports_size_and_digest() {
        let file = CompletedFile::new(&meta(), vec![1, 2, 3]);
        let summary = file.summary();
        assert_eq!(summary.size, 3);
        assert_eq!(summary.sha256, file.sha256);
        assert_eq!(summary.file_name, "song.mp3");
    }
}
