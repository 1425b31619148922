use serde::{Deserialize, Serialize};

/// Current state of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

/// Snapshot of a transfer's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferProgress {
    pub file_name: String,
    pub status: TransferStatus,
    pub total_chunks: u32,
    pub done_chunks: u32,
}

impl TransferProgress {
    /// Returns the completion percentage in `[0, 100]`.
    ///
    /// A transfer with no chunks is only ever reported once it is done.
    pub fn percentage(&self) -> f64 {
        if self.total_chunks == 0 {
            return if self.status == TransferStatus::Completed {
                100.0
            } else {
                0.0
            };
        }
        (self.done_chunks as f64 / self.total_chunks as f64) * 100.0
    }
}
