use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::TransferError;
use crate::completion::CompletedFile;
use crate::validation::validate_file_name;

/// Highest numeric suffix tried before giving up on a free file name.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Final destination of a received file.
pub trait FileSink: Send + Sync {
    fn deliver(&self, file: CompletedFile) -> impl Future<Output = Result<(), TransferError>> + Send;
}

// ---------------------------------------------------------------------------
// DirectorySink
// ---------------------------------------------------------------------------

/// Saves received files into a directory.
///
/// Existing files are never overwritten: `photo.jpg` becomes
/// `photo (1).jpg`, `photo (2).jpg`, and so on.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes `file` and returns the path it was saved under.
    ///
    /// The final name is reserved first, the bytes go to a hidden `.part`
    /// sibling, and the part file is renamed over the reservation. A failed
    /// write removes both, so no partial file is left behind.
    pub async fn save(&self, file: &CompletedFile) -> Result<PathBuf, TransferError> {
        validate_file_name(&file.file_name)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = numbered_name(&file.file_name, attempt);
            let path = self.dir.join(&name);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }

            let part = self.dir.join(format!(".{name}.part"));
            if let Err(e) = write_and_rename(&part, &path, &file.bytes).await {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "save failed, removing partial output"
                );
                let _ = tokio::fs::remove_file(&part).await;
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e.into());
            }

            info!(path = %path.display(), size = file.bytes.len(), "file saved");
            return Ok(path);
        }

        Err(TransferError::InvalidPath(format!(
            "no free name for {} in {}",
            file.file_name,
            self.dir.display()
        )))
    }
}

impl FileSink for DirectorySink {
    async fn deliver(&self, file: CompletedFile) -> Result<(), TransferError> {
        self.save(&file).await.map(|_| ())
    }
}

async fn write_and_rename(part: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut out = tokio::fs::File::create(part).await?;
    out.write_all(bytes).await?;
    out.flush().await?;
    out.sync_all().await?;
    drop(out);
    tokio::fs::rename(part, path).await
}

/// `name.ext` for attempt 0, `name (n).ext` afterwards.
fn numbered_name(file_name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({attempt}).{ext}"),
        _ => format!("{file_name} ({attempt})"),
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Keeps received files in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: Arc<Mutex<Vec<CompletedFile>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything delivered so far.
    pub fn files(&self) -> Vec<CompletedFile> {
        match self.files.lock() {
            Ok(files) => files.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl FileSink for MemorySink {
    async fn deliver(&self, file: CompletedFile) -> Result<(), TransferError> {
        match self.files.lock() {
            Ok(mut files) => files.push(file),
            Err(poisoned) => poisoned.into_inner().push(file),
        }
        Ok(())
    }
}
