use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of one selected file, unique within and across batches.
///
/// File names are not unique (two `image.png` picks from different
/// folders are common), so everything that tracks a file internally keys
/// on this id instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(uuid::Uuid);

impl FileId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Lifecycle of a single file upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl UploadStatus {
    /// Returns `true` once no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            UploadStatus::Completed | UploadStatus::Failed | UploadStatus::Cancelled
        )
    }
}

/// Observable progress of one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProgress {
    pub id: FileId,
    pub name: String,
    pub size: u64,
    /// Zero until the upload has started and fixed its chunk size.
    pub chunk_size: u64,
    pub total_chunks: u64,
    pub uploaded_chunks: u64,
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl FileProgress {
    /// `true` while the file still shows a busy indicator.
    pub fn in_progress(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Returns the progress as a percentage (0-100).
    pub fn percentage(&self) -> f64 {
        if self.total_chunks == 0 {
            return if self.status == UploadStatus::Completed {
                100.0
            } else {
                0.0
            };
        }
        self.uploaded_chunks as f64 / self.total_chunks as f64 * 100.0
    }
}
