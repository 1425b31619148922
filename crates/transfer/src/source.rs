use std::path::Path;

use peershare_protocol::constants::FALLBACK_FILE_TYPE;
use tracing::debug;

use crate::TransferError;
use crate::types::FileMeta;

/// A file loaded into memory, ready to be chunked.
#[derive(Debug, Clone)]
pub struct FileSource {
    meta: FileMeta,
    bytes: Vec<u8>,
}

impl FileSource {
    /// Reads the whole file at `path`.
    ///
    /// The file is read to completion before any chunk exists, so an
    /// unreadable file fails here and nothing is ever sent.
    pub async fn from_path(path: &Path) -> Result<Self, TransferError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                TransferError::InvalidPath(format!("no file name in {}", path.display()))
            })?;
        let bytes = tokio::fs::read(path).await?;
        let file_type = guess_file_type(&file_name).to_string();
        debug!(path = %path.display(), size = bytes.len(), %file_type, "file loaded");

        Ok(Self {
            meta: FileMeta {
                file_name,
                file_type,
            },
            bytes,
        })
    }

    /// Wraps bytes that are already in memory.
    pub fn from_bytes(meta: FileMeta, bytes: Vec<u8>) -> Self {
        Self { meta, bytes }
    }

    pub fn meta(&self) -> &FileMeta {
        &self.meta
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// File length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Guesses a content type from the file extension.
pub fn guess_file_type(file_name: &str) -> &'static str {
    let ext = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return FALLBACK_FILE_TYPE,
    };
    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => FALLBACK_FILE_TYPE,
    }
}
